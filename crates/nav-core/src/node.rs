use crate::math::{Int3, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest tag id a node can carry.
pub const MAX_TAG: u8 = 31;

/// Stable handle to a node: owning graph index + slot in that graph's node array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeRef {
    pub graph: u32,
    pub index: u32,
}

impl NodeRef {
    pub const fn new(graph: u32, index: u32) -> Self {
        Self { graph, index }
    }

    pub fn slot(self) -> usize {
        self.index as usize
    }
}

/// Outgoing edge with its traversal cost in fixed-point units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connection {
    pub target: NodeRef,
    pub cost: u32,
}

impl Connection {
    pub const fn new(target: NodeRef, cost: u32) -> Self {
        Self { target, cost }
    }
}

/// Fields shared by every node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeData {
    pub position: Int3,
    pub walkable: bool,
    /// Additive traversal cost on top of the edge cost.
    pub penalty: u32,
    /// Traversal class, `0..=MAX_TAG`.
    pub tag: u8,
    /// Connected component id, assigned by an external flood fill.
    pub area: u32,
}

impl NodeData {
    pub fn new(position: Int3, penalty: u32) -> Self {
        Self {
            position,
            walkable: true,
            penalty,
            tag: 0,
            area: 0,
        }
    }

    pub fn world_position(&self) -> Vec3 {
        self.position.to_vec3()
    }

    /// Adds a signed amount, clamping at `0` and `u32::MAX`.
    pub fn add_penalty(&mut self, amount: i64) {
        self.penalty = (self.penalty as i64 + amount).clamp(0, u32::MAX as i64) as u32;
    }
}

/// Access to the common node fields of a graph-specific node type.
pub trait GraphNode {
    fn data(&self) -> &NodeData;
    fn data_mut(&mut self) -> &mut NodeData;

    fn position(&self) -> Int3 {
        self.data().position
    }

    fn walkable(&self) -> bool {
        self.data().walkable
    }
}

/// Node with an explicit edge list. Used by the point graph.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    pub data: NodeData,
    pub connections: Vec<Connection>,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            connections: Vec::new(),
        }
    }

    /// Adds an edge, or updates the cost of an existing edge to the same target.
    pub fn add_connection(&mut self, target: NodeRef, cost: u32) {
        upsert_connection(&mut self.connections, target, cost);
    }

    pub fn remove_connection(&mut self, target: NodeRef) {
        self.connections.retain(|c| c.target != target);
    }

    pub fn contains_connection(&self, target: NodeRef) -> bool {
        self.connections.iter().any(|c| c.target == target)
    }
}

impl GraphNode for Node {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }
}

/// Pushes an edge or overwrites the cost of the edge that already points at `target`.
pub fn upsert_connection(list: &mut Vec<Connection>, target: NodeRef, cost: u32) {
    match list.iter_mut().find(|c| c.target == target) {
        Some(existing) => existing.cost = cost,
        None => list.push(Connection::new(target, cost)),
    }
}

/// Saved node state used to revert graph updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub node: NodeRef,
    pub data: NodeData,
    /// Graph-specific bits (grid connection mask, erosion walkability).
    pub extra: u32,
}
