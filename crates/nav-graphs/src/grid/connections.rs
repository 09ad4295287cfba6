use nav_core::Int3;

use super::{GridGraph, GridNode, NumNeighbours, NEIGHBOUR_X_OFFSETS, NEIGHBOUR_Z_OFFSETS};

impl GridGraph {
    /// Whether an edge between two lattice neighbours may exist.
    pub fn is_valid_connection(&self, n1: &GridNode, n2: &GridNode) -> bool {
        if !n1.data.walkable || !n2.data.walkable {
            return false;
        }
        let max_climb = self.settings.max_climb;
        if max_climb != 0.0 {
            let axis = self.settings.max_climb_axis.min(2);
            let step = (n1.data.position.axis(axis) as i64 - n2.data.position.axis(axis) as i64).abs();
            if step as f32 > max_climb * Int3::FLOAT_PRECISION {
                return false;
            }
        }
        true
    }

    /// Recomputes the neighbour mask of node `(x, z)` from its current neighbours.
    pub fn calculate_connections(&mut self, x: i32, z: i32) {
        let Some(index) = self.node_index(x, z) else {
            return;
        };
        let mask = self.connection_mask_for(index, x, z);
        self.nodes[index].connections = mask;
    }

    /// Recomputes masks for every node in the inclusive rect, clamped to the lattice.
    pub fn calculate_connections_for(&mut self, xmin: i32, zmin: i32, xmax: i32, zmax: i32) {
        let xmin = xmin.max(0);
        let zmin = zmin.max(0);
        let xmax = xmax.min(self.width() - 1);
        let zmax = zmax.min(self.depth() - 1);
        for z in zmin..=zmax {
            for x in xmin..=xmax {
                self.calculate_connections(x, z);
            }
        }
    }

    fn connection_mask_for(&self, index: usize, x: i32, z: i32) -> u8 {
        let node = &self.nodes[index];
        if !node.data.walkable {
            return 0;
        }

        let offsets = &self.layout.neighbour_offsets;
        let mut mask = 0u8;
        let mut corners = [0u8; 4];

        let mut prev = 3;
        for i in 0..4 {
            let nx = x + NEIGHBOUR_X_OFFSETS[i];
            let nz = z + NEIGHBOUR_Z_OFFSETS[i];
            if self.in_bounds(nx, nz) {
                let other = &self.nodes[(index as i32 + offsets[i]) as usize];
                if self.is_valid_connection(node, other) {
                    mask |= 1 << i;
                    corners[i] += 1;
                    corners[prev] += 1;
                }
            }
            prev = i;
        }

        if self.settings.neighbours == NumNeighbours::Eight {
            let needed = if self.settings.cut_corners { 1 } else { 2 };
            for (i, &count) in corners.iter().enumerate() {
                if count < needed {
                    continue;
                }
                let dir = i + 4;
                let nx = x + NEIGHBOUR_X_OFFSETS[dir];
                let nz = z + NEIGHBOUR_Z_OFFSETS[dir];
                if self.in_bounds(nx, nz) {
                    let other = &self.nodes[(index as i32 + offsets[dir]) as usize];
                    if self.is_valid_connection(node, other) {
                        mask |= 1 << dir;
                    }
                }
            }
        }

        mask
    }

    /// Whether a path may step from `index` in direction `dir` (0..8).
    ///
    /// With four neighbours a diagonal step is allowed when both orthogonal detours
    /// around it are connected.
    pub fn check_connection(&self, index: usize, dir: usize) -> bool {
        let Some(node) = self.nodes.get(index) else {
            return false;
        };
        if dir >= 8 {
            return false;
        }
        if self.settings.neighbours == NumNeighbours::Eight || dir < 4 {
            return node.has_connection(dir);
        }

        let dir1 = dir - 4;
        let dir2 = (dir - 4 + 1) & 3;
        if !node.has_connection(dir1) || !node.has_connection(dir2) {
            return false;
        }

        let offsets = &self.layout.neighbour_offsets;
        let (Some(n1), Some(n2)) = (
            self.nodes.get((index as i32 + offsets[dir1]) as usize),
            self.nodes.get((index as i32 + offsets[dir2]) as usize),
        ) else {
            return false;
        };
        if !n1.data.walkable || !n2.data.walkable {
            return false;
        }
        n2.has_connection(dir1) && n1.has_connection(dir2)
    }

    /// Index of the neighbour in direction `dir`, if the mask has that bit.
    pub fn neighbour(&self, index: usize, dir: usize) -> Option<usize> {
        let node = self.nodes.get(index)?;
        if dir >= 8 || !node.has_connection(dir) {
            return None;
        }
        Some((index as i32 + self.layout.neighbour_offsets[dir]) as usize)
    }
}
