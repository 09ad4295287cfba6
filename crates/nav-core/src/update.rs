//! Area updates applied to already scanned graphs.

use crate::error::NavError;
use crate::geometry::polygon_contains_xz;
use crate::math::{Bounds, Vec3};
use crate::node::{NodeData, NodeRef, NodeSnapshot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Polygon in the XZ plane restricting which nodes an update touches.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphUpdateShape {
    pub points: Vec<Vec3>,
}

impl GraphUpdateShape {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn contains(&self, position: Vec3) -> bool {
        polygon_contains_xz(&self.points, position)
    }

    /// XZ extent of the polygon, unbounded in Y.
    pub fn bounds(&self) -> Bounds {
        let Some(first) = self.points.first().copied() else {
            return Bounds::default();
        };
        let mut bounds = Bounds::from_min_max(first, first);
        for &p in &self.points[1..] {
            bounds.encapsulate(p);
        }
        let mut min = bounds.min();
        let mut max = bounds.max();
        min.y = -f32::MAX / 4.0;
        max.y = f32::MAX / 4.0;
        Bounds::from_min_max(min, max)
    }
}

/// Describes a change to every node inside `bounds`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphUpdateObject {
    pub bounds: Bounds,
    /// Resample collision and height for nodes in the area (grid graphs), or
    /// re-evaluate connections touching the area (point graphs).
    pub update_physics: bool,
    /// When resampling physics, reset penalties to their initial value first.
    pub reset_penalty_on_physics: bool,
    /// Re-run erosion around the area (grid graphs).
    pub update_erosion: bool,
    pub add_penalty: i32,
    pub modify_walkability: bool,
    pub set_walkability: bool,
    pub modify_tag: bool,
    pub set_tag: u8,
    /// Save node state before changing it so the update can be reverted.
    pub track_changed_nodes: bool,
    pub shape: Option<GraphUpdateShape>,
    #[cfg_attr(feature = "serde", serde(skip))]
    backup: Vec<NodeSnapshot>,
}

impl Default for GraphUpdateObject {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            update_physics: true,
            reset_penalty_on_physics: true,
            update_erosion: true,
            add_penalty: 0,
            modify_walkability: false,
            set_walkability: false,
            modify_tag: false,
            set_tag: 0,
            track_changed_nodes: false,
            shape: None,
            backup: Vec::new(),
        }
    }
}

impl GraphUpdateObject {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// Update that only flips walkability, without physics resampling.
    pub fn set_walkable(bounds: Bounds, walkable: bool) -> Self {
        Self {
            bounds,
            update_physics: false,
            modify_walkability: true,
            set_walkability: walkable,
            ..Self::default()
        }
    }

    /// Whether this update can change walkability, and with it connectivity.
    pub fn changes_walkability(&self) -> bool {
        self.update_physics || self.modify_walkability
    }

    /// Records `snapshot` if changes are tracked. Call before mutating the node.
    pub fn will_update_node(&mut self, snapshot: NodeSnapshot) {
        if self.track_changed_nodes {
            self.backup.push(snapshot);
        }
    }

    /// Applies penalty, walkability and tag changes to one node.
    pub fn apply(&self, node: &mut NodeData) {
        if let Some(shape) = &self.shape {
            if !shape.contains(node.world_position()) {
                return;
            }
        }

        node.add_penalty(self.add_penalty as i64);
        if self.modify_walkability {
            node.walkable = self.set_walkability;
        }
        if self.modify_tag {
            node.tag = self.set_tag;
        }
    }

    pub fn changed_nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.backup.iter().map(|s| s.node)
    }

    /// Hands out the saved snapshots, newest first, for a graph to restore.
    ///
    /// Fails when changes were not tracked.
    pub fn take_backup(&mut self) -> Result<Vec<NodeSnapshot>, NavError> {
        if !self.track_changed_nodes {
            return Err(NavError::ChangesNotTracked);
        }
        let mut backup = std::mem::take(&mut self.backup);
        backup.reverse();
        Ok(backup)
    }
}
