use nav_core::{round_to_int, NnConstraint, NnInfo, Vec3};

use super::GridGraph;

impl GridGraph {
    /// Lattice cell containing `position`, clamped to the grid.
    pub fn cell_of(&self, position: Vec3) -> (i32, i32) {
        let local = self.layout.inverse_matrix.multiply_point3x4(position);
        let x = round_to_int(local.x - 0.5).clamp(0, self.width() - 1);
        let z = round_to_int(local.z - 0.5).clamp(0, self.depth() - 1);
        (x, z)
    }

    /// Node of the cell under `position`, ignoring any constraint.
    pub(super) fn nearest_cell(&self, position: Vec3) -> NnInfo {
        if !self.has_valid_nodes() {
            return NnInfo::EMPTY;
        }
        let (x, z) = self.cell_of(position);
        let index = (z * self.width() + x) as usize;
        NnInfo::new(self.base.node_ref(index), self.nodes[index].data.world_position())
    }

    /// Searches square rings around the cell under `position` for the closest
    /// suitable node. After the first hit, `get_nearest_force_overlap` more rings
    /// are searched since a node further out in lattice terms can still be closer
    /// in world space.
    pub(super) fn nearest_force(&self, position: Vec3, constraint: &dyn NnConstraint) -> NnInfo {
        if !self.has_valid_nodes() {
            return NnInfo::EMPTY;
        }

        let (x, z) = self.cell_of(position);
        let (width, depth) = (self.width(), self.depth());
        let max_dist = constraint.distance_limit();
        let max_dist_sqr = max_dist * max_dist;
        let mut overlap = self.settings.get_nearest_force_overlap;

        let mut min_node: Option<usize> = None;
        let mut min_dist = f32::INFINITY;

        let center = (z * width + x) as usize;
        if constraint.suitable(&self.nodes[center].data) {
            min_node = Some(center);
            min_dist = self.nodes[center].data.world_position().distance_squared(position);
        }

        if min_node.is_some() {
            if overlap == 0 {
                return self.constrained_info(min_node);
            }
            overlap -= 1;
        }

        let visit = |nx: i32, nz: i32, min_node: &mut Option<usize>, min_dist: &mut f32| -> bool {
            if nx < 0 || nz < 0 || nx >= width || nz >= depth {
                return false;
            }
            let index = (nz * width + nx) as usize;
            let data = &self.nodes[index].data;
            if constraint.suitable(data) {
                let dist = data.world_position().distance_squared(position);
                if dist < *min_dist && dist < max_dist_sqr {
                    *min_dist = dist;
                    *min_node = Some(index);
                }
            }
            true
        };

        let mut w = 1;
        loop {
            if self.layout.node_size * w as f32 > max_dist {
                return self.constrained_info(min_node);
            }

            let mut any_inside = false;
            for nx in x - w..=x + w {
                any_inside |= visit(nx, z + w, &mut min_node, &mut min_dist);
            }
            for nx in x - w..=x + w {
                any_inside |= visit(nx, z - w, &mut min_node, &mut min_dist);
            }
            for nz in z - w + 1..=z + w - 1 {
                any_inside |= visit(x - w, nz, &mut min_node, &mut min_dist);
            }
            for nz in z - w + 1..=z + w - 1 {
                any_inside |= visit(x + w, nz, &mut min_node, &mut min_dist);
            }

            if min_node.is_some() {
                if overlap == 0 {
                    return self.constrained_info(min_node);
                }
                overlap -= 1;
            }

            if !any_inside {
                return self.constrained_info(min_node);
            }
            w += 1;
        }
    }

    fn constrained_info(&self, index: Option<usize>) -> NnInfo {
        let Some(index) = index else {
            return NnInfo::EMPTY;
        };
        let node = self.base.node_ref(index);
        let position = self.nodes[index].data.world_position();
        let mut info = NnInfo::new(node, position);
        info.set_constrained(node, position);
        info
    }
}
