use nav_core::{FunnelGraph, Vec3};

use super::GridGraph;

impl FunnelGraph for GridGraph {
    fn build_funnel_corridor(
        &self,
        path: &[usize],
        start: usize,
        end: usize,
        left: &mut Vec<Vec3>,
        right: &mut Vec<Vec3>,
    ) {
        let end = end.min(path.len().saturating_sub(1));
        for n in start..end {
            self.add_portal(path[n], path[n + 1], left, right);
        }
    }

    /// Portal between two cells.
    ///
    /// Orthogonal steps get the shared cell edge. Diagonal steps detour through a
    /// walkable corner cell, or collapse to the midpoint when both corners are
    /// blocked. Non-adjacent nodes contribute both positions to both sides.
    fn add_portal(&self, n1: usize, n2: usize, left: &mut Vec<Vec3>, right: &mut Vec<Vec3>) {
        if n1 == n2 {
            return;
        }
        let (Some(a), Some(b)) = (self.nodes.get(n1), self.nodes.get(n2)) else {
            return;
        };

        let (x1, z1) = self.coords(n1);
        let (x2, z2) = self.coords(n2);
        let p1 = a.data.world_position();
        let p2 = b.data.world_position();

        let dx = (x1 - x2).abs();
        let dz = (z1 - z2).abs();

        if dx > 1 || dz > 1 {
            left.push(p1);
            right.push(p1);
            left.push(p2);
            right.push(p2);
        } else if dx + dz <= 1 {
            let half = self.layout.node_size * 0.5;
            let dir = (p2 - p1).normalize_or_zero() * half;
            let tangent = dir.cross(Vec3::UP).normalize_or_zero() * half;
            left.push(p1 + dir - tangent);
            right.push(p1 + dir + tangent);
        } else {
            let t1 = (z1 * self.width() + x2) as usize;
            let t2 = (z2 * self.width() + x1) as usize;
            let corner = [t1, t2].into_iter().find(|&t| self.nodes[t].data.walkable);

            match corner {
                Some(t) => {
                    self.add_portal(n1, t, left, right);
                    self.add_portal(t, n2, left, right);
                }
                None => {
                    let mid = (p1 + p2) * 0.5;
                    left.push(mid);
                    right.push(mid);
                }
            }
        }
    }
}
