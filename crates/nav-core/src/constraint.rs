//! Nearest-node query predicates (`NnConstraint`) and results (`NnInfo`).

use crate::math::Vec3;
use crate::node::{NodeData, NodeRef};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default search radius for constrained nearest-node queries, in world units.
pub const DEFAULT_MAX_NEAREST_NODE_DISTANCE: f32 = 100.0;

/// Filter applied by every nearest-node query.
pub trait NnConstraint {
    /// Whether the graph at `graph_index` should be searched at all.
    fn suitable_graph(&self, graph_index: usize) -> bool {
        let _ = graph_index;
        true
    }

    fn suitable(&self, node: &NodeData) -> bool;

    /// Whether `max_distance` limits the search.
    fn constrain_distance(&self) -> bool;

    fn max_distance(&self) -> f32;

    /// Effective distance limit: `max_distance` or infinity.
    fn distance_limit(&self) -> f32 {
        if self.constrain_distance() {
            self.max_distance()
        } else {
            f32::INFINITY
        }
    }

    fn distance_limit_sqr(&self) -> f32 {
        let d = self.distance_limit();
        d * d
    }
}

/// Field-driven constraint covering walkability, area, tags, graph mask and distance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeConstraint {
    /// Bit `i` enables graph `i`.
    pub graph_mask: u32,
    pub constrain_area: bool,
    /// Area to match when `constrain_area` is set. `None` disables the check.
    pub area: Option<u32>,
    pub constrain_walkability: bool,
    pub walkable: bool,
    pub constrain_tags: bool,
    /// Bit `t` accepts nodes tagged `t`.
    pub tags: u32,
    pub constrain_distance: bool,
    pub max_distance: f32,
}

impl Default for NodeConstraint {
    /// Walkable nodes only, any tag, within the default distance.
    fn default() -> Self {
        Self {
            graph_mask: u32::MAX,
            constrain_area: false,
            area: None,
            constrain_walkability: true,
            walkable: true,
            constrain_tags: true,
            tags: u32::MAX,
            constrain_distance: true,
            max_distance: DEFAULT_MAX_NEAREST_NODE_DISTANCE,
        }
    }
}

impl NodeConstraint {
    /// Accepts everything, everywhere.
    pub fn none() -> Self {
        Self {
            constrain_walkability: false,
            constrain_area: false,
            constrain_tags: false,
            constrain_distance: false,
            graph_mask: u32::MAX,
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, tags: u32) -> Self {
        self.constrain_tags = true;
        self.tags = tags;
        self
    }

    pub fn with_area(mut self, area: u32) -> Self {
        self.constrain_area = true;
        self.area = Some(area);
        self
    }

    pub fn with_graph_mask(mut self, mask: u32) -> Self {
        self.graph_mask = mask;
        self
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.constrain_distance = true;
        self.max_distance = max_distance;
        self
    }
}

impl NnConstraint for NodeConstraint {
    fn suitable_graph(&self, graph_index: usize) -> bool {
        graph_index < 32 && (self.graph_mask >> graph_index) & 1 != 0
    }

    fn suitable(&self, node: &NodeData) -> bool {
        if self.constrain_walkability && node.walkable != self.walkable {
            return false;
        }
        if self.constrain_area {
            if let Some(area) = self.area {
                if node.area != area {
                    return false;
                }
            }
        }
        if self.constrain_tags && (self.tags >> node.tag) & 1 == 0 {
            return false;
        }
        true
    }

    fn constrain_distance(&self) -> bool {
        self.constrain_distance
    }

    fn max_distance(&self) -> f32 {
        self.max_distance
    }
}

/// Constraint for path endpoints: after the start node is known, the end must share its area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathConstraint {
    pub inner: NodeConstraint,
}

impl Default for PathConstraint {
    fn default() -> Self {
        Self {
            inner: NodeConstraint {
                constrain_area: true,
                ..NodeConstraint::default()
            },
        }
    }
}

impl PathConstraint {
    pub fn set_start(&mut self, start: Option<&NodeData>) {
        match start {
            Some(node) => self.inner.area = Some(node.area),
            None => self.inner.constrain_area = false,
        }
    }
}

impl NnConstraint for PathConstraint {
    fn suitable_graph(&self, graph_index: usize) -> bool {
        self.inner.suitable_graph(graph_index)
    }

    fn suitable(&self, node: &NodeData) -> bool {
        self.inner.suitable(node)
    }

    fn constrain_distance(&self) -> bool {
        self.inner.constrain_distance
    }

    fn max_distance(&self) -> f32 {
        self.inner.max_distance
    }
}

/// Result of a nearest-node query.
///
/// `node` is the closest node regardless of the constraint; `constrained_node` is the
/// closest node that passed it, when the graph could find one without extra work.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NnInfo {
    pub node: Option<NodeRef>,
    pub constrained_node: Option<NodeRef>,
    pub clamped_position: Vec3,
    pub const_clamped_position: Vec3,
}

impl NnInfo {
    /// No node found.
    pub const EMPTY: Self = Self {
        node: None,
        constrained_node: None,
        clamped_position: Vec3::ZERO,
        const_clamped_position: Vec3::ZERO,
    };

    pub fn new(node: NodeRef, clamped_position: Vec3) -> Self {
        Self {
            node: Some(node),
            clamped_position,
            ..Self::EMPTY
        }
    }

    pub fn from_option(node: Option<(NodeRef, Vec3)>) -> Self {
        match node {
            Some((node, position)) => Self::new(node, position),
            None => Self::EMPTY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    pub fn set_constrained(&mut self, node: NodeRef, clamped_position: Vec3) {
        self.constrained_node = Some(node);
        self.const_clamped_position = clamped_position;
    }

    /// Promotes the constrained result to the primary one, leaving `self` empty if there is none.
    pub fn into_constrained(self) -> Self {
        Self {
            node: self.constrained_node,
            constrained_node: self.constrained_node,
            clamped_position: self.const_clamped_position,
            const_clamped_position: self.const_clamped_position,
        }
    }
}
