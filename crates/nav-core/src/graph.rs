//! Graph contracts shared by every generator.

use uuid::Uuid;

use crate::constraint::{NnConstraint, NnInfo};
use crate::error::{NavError, NavResult};
use crate::math::{Matrix4, Vec3};
use crate::node::{Connection, NodeData, NodeRef, NodeSnapshot};
use crate::physics::Physics;
use crate::update::GraphUpdateObject;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// State every graph carries besides its nodes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphBase {
    pub guid: Uuid,
    pub name: String,
    /// Slot in the owning graph set; part of every `NodeRef` this graph hands out.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub index: u32,
    pub initial_penalty: u32,
    /// Local to world transform.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub matrix: Matrix4,
    /// Bumped on every structural mutation.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub generation: u64,
}

impl Default for GraphBase {
    fn default() -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: String::new(),
            index: 0,
            initial_penalty: 0,
            matrix: Matrix4::IDENTITY,
            generation: 0,
        }
    }
}

impl GraphBase {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn node_ref(&self, index: usize) -> NodeRef {
        NodeRef::new(self.index, index as u32)
    }

    pub fn inverse_matrix(&self) -> Matrix4 {
        self.matrix.inverse()
    }

    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

/// Summary of a successful scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanReport {
    pub nodes: usize,
    pub walkable: usize,
    pub connections: usize,
    /// Triangles sharing all three vertices with another triangle.
    pub identical_triangles: usize,
    /// Triangles with zero XZ area.
    pub colinear_triangles: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GraphKind {
    Grid,
    NavMesh,
    Point,
}

/// A navigable graph: a node array built by `scan`, queried by position.
pub trait NavGraph {
    fn base(&self) -> &GraphBase;
    fn base_mut(&mut self) -> &mut GraphBase;
    fn kind(&self) -> GraphKind;

    /// Rebuilds the node array from the graph's source.
    ///
    /// On error the graph keeps its previous nodes.
    fn scan(&mut self, physics: &dyn Physics) -> NavResult<ScanReport>;

    fn node_count(&self) -> usize;

    fn is_scanned(&self) -> bool {
        self.node_count() > 0
    }

    fn node(&self, index: usize) -> Option<&NodeData>;
    fn node_mut(&mut self, index: usize) -> Option<&mut NodeData>;

    /// Outgoing edges of the node at `index`, including cross-graph links.
    fn connections(&self, index: usize) -> Vec<Connection>;

    /// Adds a directed edge from `index`. Used for links between graphs.
    fn add_connection(&mut self, index: usize, connection: Connection);

    /// Nearest node, with the constrained candidate filled in where it comes for free.
    fn get_nearest(&self, position: Vec3, constraint: &dyn NnConstraint, hint: Option<NodeRef>) -> NnInfo {
        let _ = hint;
        nearest_linear(self, position, constraint)
    }

    /// Nearest node satisfying `constraint`, searching as far as needed.
    fn get_nearest_force(&self, position: Vec3, constraint: &dyn NnConstraint) -> NnInfo {
        self.get_nearest(position, constraint, None)
    }

    /// Moves nodes placed with `old` so they match `new`.
    fn relocate_nodes(&mut self, old: &Matrix4, new: &Matrix4) {
        relocate_linear(self, old, new);
    }

    fn node_ref(&self, index: usize) -> NodeRef {
        self.base().node_ref(index)
    }

    fn generation(&self) -> u64 {
        self.base().generation
    }
}

/// Graphs whose node sequences can be turned into a left/right portal corridor.
pub trait FunnelGraph: NavGraph {
    /// Appends portal points between `path[start..=end]` to `left` and `right`.
    fn build_funnel_corridor(
        &self,
        path: &[usize],
        start: usize,
        end: usize,
        left: &mut Vec<Vec3>,
        right: &mut Vec<Vec3>,
    );

    /// Appends the portal between two consecutive nodes.
    fn add_portal(&self, n1: usize, n2: usize, left: &mut Vec<Vec3>, right: &mut Vec<Vec3>);
}

/// Graphs that accept incremental area updates.
pub trait UpdatableGraph: NavGraph {
    fn update_area(&mut self, update: &mut GraphUpdateObject, physics: &dyn Physics);

    fn snapshot_node(&self, index: usize) -> Option<NodeSnapshot>;

    fn restore_node(&mut self, snapshot: &NodeSnapshot);

    /// Restores every node the update recorded. Requires `track_changed_nodes`
    /// and a scanned graph; the backup is kept when the graph is not scanned.
    fn revert_update(&mut self, update: &mut GraphUpdateObject) -> NavResult<usize> {
        if !self.is_scanned() {
            return Err(NavError::NotScanned);
        }
        let backup = update.take_backup()?;
        let own = self.base().index;
        let mut restored = 0;
        for snapshot in backup.iter().filter(|s| s.node.graph == own) {
            self.restore_node(snapshot);
            restored += 1;
        }
        self.base_mut().bump_generation();
        Ok(restored)
    }
}

/// O(n) nearest-node scan tracking the closest node overall and the closest suitable
/// node within the constraint's distance limit.
///
/// When no suitable node exists, the constrained result falls back to the closest node.
pub fn nearest_linear<G: NavGraph + ?Sized>(graph: &G, position: Vec3, constraint: &dyn NnConstraint) -> NnInfo {
    let max_dist_sqr = constraint.distance_limit_sqr();

    let mut min_dist = f32::INFINITY;
    let mut min_node: Option<(usize, Vec3)> = None;
    let mut min_const_dist = f32::INFINITY;
    let mut min_const_node: Option<(usize, Vec3)> = None;

    for index in 0..graph.node_count() {
        let Some(node) = graph.node(index) else {
            continue;
        };
        let p = node.world_position();
        let dist = position.distance_squared(p);
        if dist < min_dist {
            min_dist = dist;
            min_node = Some((index, p));
        }
        if dist < min_const_dist && dist < max_dist_sqr && constraint.suitable(node) {
            min_const_dist = dist;
            min_const_node = Some((index, p));
        }
    }

    let mut info = NnInfo::from_option(min_node.map(|(i, p)| (graph.node_ref(i), p)));
    if let Some((i, p)) = min_const_node.or(min_node) {
        info.set_constrained(graph.node_ref(i), p);
    }
    info
}

/// Applies `inverse(old) * new` to every node position.
pub fn relocate_linear<G: NavGraph + ?Sized>(graph: &mut G, old: &Matrix4, new: &Matrix4) {
    if graph.node_count() == 0 {
        return;
    }
    let m = old.inverse() * *new;
    for index in 0..graph.node_count() {
        if let Some(node) = graph.node_mut(index) {
            node.position = m.multiply_point3x4(node.world_position()).into();
        }
    }
    let base = graph.base_mut();
    base.matrix = *new;
    base.bump_generation();
}
