use nav_core::{Int3, NavGraph, NodeConstraint, NodeRef};

use super::GridGraph;

/// Edge between a border node of one grid and the nearest node of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLink {
    pub from: usize,
    pub to: NodeRef,
    pub cost: u32,
}

#[derive(Clone, Copy)]
enum Side {
    MinZ,
    MinX,
    MaxZ,
    MaxX,
}

impl GridGraph {
    /// Links from this grid's border nodes to the nearest nodes of `other`.
    ///
    /// A link is kept only when the other node lies beyond the matching border in
    /// this grid's local space and is no further than `auto_link_dist_limit`.
    pub fn border_links(&self, other: &GridGraph) -> Vec<GridLink> {
        if !self.settings.auto_link_grids || self.settings.auto_link_dist_limit <= 0.0 {
            return Vec::new();
        }
        if !self.has_valid_nodes() || !other.has_valid_nodes() {
            return Vec::new();
        }

        let max_cost = nav_core::round_to_int(self.settings.auto_link_dist_limit * Int3::FLOAT_PRECISION);
        let max_cost = max_cost.max(0) as u32;
        let (width, depth) = (self.width(), self.depth());
        let any = NodeConstraint::none();

        let passes = [
            (Side::MinZ, (0..width).map(|x| x as usize).collect::<Vec<_>>()),
            (Side::MinX, (0..depth).map(|z| (z * width) as usize).collect()),
            (Side::MaxZ, (0..width).map(|x| ((depth - 1) * width + x) as usize).collect()),
            (Side::MaxX, (0..depth).map(|z| (z * width + width - 1) as usize).collect()),
        ];

        let mut links = Vec::new();
        for (side, border) in passes {
            for from in border {
                let position = self.nodes[from].data.position;
                let Some(to) = other.get_nearest(position.to_vec3(), &any, None).node else {
                    continue;
                };
                let Some(target) = other.node(to.slot()) else {
                    continue;
                };

                let local = self.layout.inverse_matrix.multiply_point3x4(target.world_position());
                let beyond = match side {
                    Side::MinZ => local.z <= 0.0,
                    Side::MinX => local.x <= 0.0,
                    Side::MaxZ => local.z >= (depth - 1) as f32,
                    Side::MaxX => local.x >= (width - 1) as f32,
                };
                if !beyond {
                    continue;
                }

                let cost = (position - target.position).cost_magnitude();
                if cost > max_cost {
                    continue;
                }
                links.push(GridLink { from, to, cost });
            }
        }
        links
    }
}
