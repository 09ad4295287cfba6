use nav_core::{
    round_to_int, Bounds, GraphUpdateObject, GraphUpdateShape, IntRect, NodeSnapshot, Physics,
    PreparedCollision, UpdatableGraph, Vec3,
};

use super::GridGraph;

/// Safety margin on the collider radius when picking nodes to resample.
const PHYSICS_MARGIN: f32 = 1.02;

impl GridGraph {
    /// Resamples position, penalty and walkability of node `(x, z)`.
    pub fn update_node_position_collision(
        &mut self,
        x: i32,
        z: i32,
        collision: &PreparedCollision<'_>,
        physics: &dyn Physics,
        reset_penalty: bool,
    ) {
        let Some(index) = self.node_index(x, z) else {
            return;
        };
        let settings = &self.settings;

        let on_plane: nav_core::Int3 = self.cell_center(x, z).into();
        let sample = collision.check_height(physics, on_plane.to_vec3());
        let mut walkable = sample.walkable;

        let node = &mut self.nodes[index];
        node.data.position = sample.position.into();

        if reset_penalty {
            node.data.penalty = self.base.initial_penalty;
            if settings.penalty_position {
                let height = node.data.position.y as f32 - settings.penalty_position_offset;
                node.data
                    .add_penalty(round_to_int(height * settings.penalty_position_factor) as i64);
            }
        }

        if walkable && settings.use_raycast_normal() && settings.collision.height_check {
            if let Some(hit) = sample.hit.filter(|hit| hit.normal != Vec3::ZERO) {
                let angle = hit.normal.normalize_or_zero().dot(collision.up);
                if settings.penalty_angle && reset_penalty {
                    node.data
                        .add_penalty(round_to_int((1.0 - angle) * settings.penalty_angle_factor) as i64);
                }
                if angle < settings.max_slope.to_radians().cos() {
                    walkable = false;
                }
            }
        }

        node.data.walkable = walkable && collision.check(physics, node.data.world_position());
        node.walkable_erosion = node.data.walkable;
    }

    /// Lattice rect covered by `bounds`, not clamped to the grid.
    pub fn rect_for_bounds(&self, bounds: &Bounds) -> IntRect {
        let (min, max) = bounds.transformed_min_max(&self.layout.inverse_matrix);
        cell_rect(min, max)
    }

    fn grid_rect(&self) -> IntRect {
        IntRect::new(0, 0, self.width() - 1, self.depth() - 1)
    }

    /// Indices of nodes whose position lies inside `bounds`.
    pub fn get_nodes_in_area(&self, bounds: &Bounds) -> Vec<usize> {
        self.nodes_in_area(bounds, None)
    }

    /// Indices of nodes inside the XZ polygon of `shape`.
    pub fn get_nodes_in_shape(&self, shape: &GraphUpdateShape) -> Vec<usize> {
        self.nodes_in_area(&shape.bounds(), Some(shape))
    }

    fn nodes_in_area(&self, bounds: &Bounds, shape: Option<&GraphUpdateShape>) -> Vec<usize> {
        if !self.has_valid_nodes() {
            return Vec::new();
        }
        let rect = IntRect::intersection(self.rect_for_bounds(bounds), self.grid_rect());
        rect.cells()
            .map(|(x, z)| (z * self.width() + x) as usize)
            .filter(|&index| {
                let position = self.nodes[index].data.world_position();
                bounds.contains(position) && shape.map_or(true, |s| s.contains(position))
            })
            .collect()
    }

    fn mark_will_update(&self, update: &mut GraphUpdateObject, rect: IntRect) {
        if !update.track_changed_nodes {
            return;
        }
        for (x, z) in rect.cells() {
            if let Some(snapshot) = self.snapshot_node((z * self.width() + x) as usize) {
                update.will_update_node(snapshot);
            }
        }
    }
}

fn cell_rect(min: Vec3, max: Vec3) -> IntRect {
    IntRect::new(
        round_to_int(min.x - 0.5),
        round_to_int(min.z - 0.5),
        round_to_int(max.x - 0.5),
        round_to_int(max.z - 0.5),
    )
}

impl UpdatableGraph for GridGraph {
    /// Applies `update` to the cells under its bounds.
    ///
    /// With erosion enabled, erosion is recomputed over a band twice the erosion
    /// width around the changed cells, after which the outer half of that band gets
    /// its previous walkability back since its own erosion input lies outside the
    /// band.
    fn update_area(&mut self, update: &mut GraphUpdateObject, physics: &dyn Physics) {
        if !self.has_valid_nodes() {
            tracing::warn!(graph = %self.base.name, "Grid graph is not scanned, cannot update area");
            return;
        }

        let (mut min, mut max) = update.bounds.transformed_min_max(&self.layout.inverse_matrix);
        let requested_rect = cell_rect(min, max);
        let grid_rect = self.grid_rect();

        let mut affect_rect = requested_rect;
        let mut physics_rect = requested_rect;

        let erosion = if update.update_erosion {
            self.settings.erode_iterations as i32
        } else {
            0
        };
        let will_change_walkability = update.changes_walkability();
        let resample = update.update_physics && !update.modify_walkability;

        if resample && self.settings.collision.collision_check {
            let margin = Vec3::new(self.settings.collision.diameter, 0.0, self.settings.collision.diameter)
                * 0.5
                * PHYSICS_MARGIN;
            min -= margin;
            max += margin;
            physics_rect = cell_rect(min, max);
            affect_rect = IntRect::union(physics_rect, affect_rect);
        }

        if will_change_walkability || erosion > 0 {
            // +1 so the border's connections are refreshed
            affect_rect = affect_rect.expand(erosion + 1);
        }

        self.mark_will_update(update, IntRect::intersection(affect_rect, grid_rect));

        if resample {
            let collision = self.settings.collision.clone();
            let prepared = collision.prepare(&self.layout.matrix, self.layout.node_size);
            let rect = IntRect::intersection(physics_rect, grid_rect);
            for (x, z) in rect.cells() {
                self.update_node_position_collision(x, z, &prepared, physics, update.reset_penalty_on_physics);
            }
        }

        let width = self.width();
        for (x, z) in IntRect::intersection(requested_rect, grid_rect).cells() {
            let node = &mut self.nodes[(z * width + x) as usize];
            if will_change_walkability {
                node.data.walkable = node.walkable_erosion;
                update.apply(&mut node.data);
                node.walkable_erosion = node.data.walkable;
            } else {
                update.apply(&mut node.data);
            }
        }

        if will_change_walkability && erosion == 0 {
            let rect = IntRect::intersection(affect_rect, grid_rect);
            self.calculate_connections_for(rect.xmin, rect.ymin, rect.xmax, rect.ymax);
        } else if will_change_walkability && erosion > 0 {
            let changed = IntRect::union(requested_rect, physics_rect);
            let inner = changed.expand(erosion);
            let outer = inner.expand(erosion);
            let inner = IntRect::intersection(inner, grid_rect);
            let outer = IntRect::intersection(outer, grid_rect);

            let mut border = Vec::new();
            for (x, z) in outer.cells() {
                let index = (z * width + x) as usize;
                let node = &mut self.nodes[index];
                if !inner.contains(x, z) {
                    border.push((index, node.data.walkable));
                }
                node.data.walkable = node.walkable_erosion;
            }

            self.calculate_connections_for(outer.xmin, outer.ymin, outer.xmax, outer.ymax);
            self.erode_walkable_area(outer.xmin, outer.ymin, outer.xmax + 1, outer.ymax + 1);

            for (index, walkable) in border {
                self.nodes[index].data.walkable = walkable;
            }

            self.calculate_connections_for(outer.xmin, outer.ymin, outer.xmax, outer.ymax);
        }

        self.base.bump_generation();
        tracing::trace!(
            graph = %self.base.name,
            xmin = requested_rect.xmin,
            zmin = requested_rect.ymin,
            xmax = requested_rect.xmax,
            zmax = requested_rect.ymax,
            erosion,
            "Updated grid area"
        );
    }

    fn snapshot_node(&self, index: usize) -> Option<NodeSnapshot> {
        let node = self.nodes.get(index)?;
        Some(NodeSnapshot {
            node: self.base.node_ref(index),
            data: node.data,
            extra: node.connections as u32 | (node.walkable_erosion as u32) << 8,
        })
    }

    fn restore_node(&mut self, snapshot: &NodeSnapshot) {
        let Some(node) = self.nodes.get_mut(snapshot.node.slot()) else {
            return;
        };
        node.data = snapshot.data;
        node.connections = (snapshot.extra & 0xff) as u8;
        node.walkable_erosion = (snapshot.extra >> 8) & 1 != 0;
    }
}
