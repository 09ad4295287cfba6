//! Ordered set of graphs with cross-graph linking and lookup.

use std::sync::Arc;

use nav_core::{
    Connection, GraphKind, GraphUpdateObject, NavError, NavGraph, NnConstraint, NnInfo, NodeData, NodeRef, Physics,
    SafeUpdateBarrier, ScanReport, UpdatableGraph, Vec3, DEFAULT_MAX_NEAREST_NODE_DISTANCE,
};
use uuid::Uuid;

use crate::grid::{GridGraph, GridLink};
use crate::navmesh::NavMeshGraph;
use crate::point::PointGraph;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One graph of any supported kind.
#[derive(Debug, Clone)]
pub enum AnyGraph {
    Grid(GridGraph),
    NavMesh(NavMeshGraph),
    Point(PointGraph),
}

impl AnyGraph {
    pub fn as_graph(&self) -> &dyn NavGraph {
        match self {
            AnyGraph::Grid(g) => g,
            AnyGraph::NavMesh(g) => g,
            AnyGraph::Point(g) => g,
        }
    }

    pub fn as_graph_mut(&mut self) -> &mut dyn NavGraph {
        match self {
            AnyGraph::Grid(g) => g,
            AnyGraph::NavMesh(g) => g,
            AnyGraph::Point(g) => g,
        }
    }

    pub fn as_updatable_mut(&mut self) -> &mut dyn UpdatableGraph {
        match self {
            AnyGraph::Grid(g) => g,
            AnyGraph::NavMesh(g) => g,
            AnyGraph::Point(g) => g,
        }
    }

    pub fn as_grid(&self) -> Option<&GridGraph> {
        match self {
            AnyGraph::Grid(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_grid_mut(&mut self) -> Option<&mut GridGraph> {
        match self {
            AnyGraph::Grid(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_navmesh(&self) -> Option<&NavMeshGraph> {
        match self {
            AnyGraph::NavMesh(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<&PointGraph> {
        match self {
            AnyGraph::Point(g) => Some(g),
            _ => None,
        }
    }

    pub fn kind(&self) -> GraphKind {
        self.as_graph().kind()
    }
}

impl From<GridGraph> for AnyGraph {
    fn from(graph: GridGraph) -> Self {
        AnyGraph::Grid(graph)
    }
}

impl From<NavMeshGraph> for AnyGraph {
    fn from(graph: NavMeshGraph) -> Self {
        AnyGraph::NavMesh(graph)
    }
}

impl From<PointGraph> for AnyGraph {
    fn from(graph: PointGraph) -> Self {
        AnyGraph::Point(graph)
    }
}

/// Lookup policy shared by every query on a `GraphSet`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphSetConfig {
    /// Distance limit for queries whose constraint asks for one.
    pub max_nearest_node_distance: f32,
    /// Take the first graph whose result is closer than `prioritize_graphs_limit`.
    pub prioritize_graphs: bool,
    pub prioritize_graphs_limit: f32,
    /// Ask every graph for a constrained result instead of its cheap guess.
    pub full_get_nearest_search: bool,
}

impl Default for GraphSetConfig {
    fn default() -> Self {
        Self {
            max_nearest_node_distance: DEFAULT_MAX_NEAREST_NODE_DISTANCE,
            prioritize_graphs: false,
            prioritize_graphs_limit: 1.0,
            full_get_nearest_search: false,
        }
    }
}

/// Replaces a constraint's own distance limit with the set-wide one.
struct SetConstraint<'a> {
    inner: &'a dyn NnConstraint,
    max_distance: f32,
}

impl NnConstraint for SetConstraint<'_> {
    fn suitable_graph(&self, graph_index: usize) -> bool {
        self.inner.suitable_graph(graph_index)
    }

    fn suitable(&self, node: &NodeData) -> bool {
        self.inner.suitable(node)
    }

    fn constrain_distance(&self) -> bool {
        self.inner.constrain_distance()
    }

    fn max_distance(&self) -> f32 {
        self.max_distance
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphSet {
    pub config: GraphSetConfig,
    graphs: Vec<AnyGraph>,
}

impl GraphSet {
    pub fn new(config: GraphSetConfig) -> Self {
        Self {
            config,
            graphs: Vec::new(),
        }
    }

    /// Appends a graph and assigns its index. Returns the index.
    pub fn add(&mut self, graph: impl Into<AnyGraph>) -> usize {
        let mut graph = graph.into();
        let index = self.graphs.len();
        graph.as_graph_mut().base_mut().index = index as u32;
        self.graphs.push(graph);
        index
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn graphs(&self) -> &[AnyGraph] {
        &self.graphs
    }

    pub fn graph(&self, index: usize) -> Result<&AnyGraph, NavError> {
        self.graphs.get(index).ok_or(NavError::GraphIndexOutOfRange(index))
    }

    pub fn graph_mut(&mut self, index: usize) -> Result<&mut AnyGraph, NavError> {
        self.graphs.get_mut(index).ok_or(NavError::GraphIndexOutOfRange(index))
    }

    pub fn graph_by_guid(&self, guid: Uuid) -> Option<(usize, &AnyGraph)> {
        self.graphs
            .iter()
            .enumerate()
            .find(|(_, g)| g.as_graph().base().guid == guid)
    }

    /// Node data behind a handle from any graph in the set.
    pub fn node(&self, node: NodeRef) -> Option<&NodeData> {
        self.graphs.get(node.graph as usize)?.as_graph().node(node.slot())
    }

    pub fn scan_graph(&mut self, index: usize, physics: &dyn Physics) -> Result<ScanReport, NavError> {
        let graph = self.graph_mut(index)?.as_graph_mut();
        let report = graph.scan(physics)?;
        tracing::info!(
            graph = %graph.base().name,
            index,
            nodes = report.nodes,
            walkable = report.walkable,
            "Scanned graph"
        );
        Ok(report)
    }

    /// Scans every graph in order, then links grids to each other.
    ///
    /// A failed graph keeps its previous nodes; the others are scanned regardless.
    pub fn scan_all(&mut self, physics: &dyn Physics) -> Vec<Result<ScanReport, NavError>> {
        let results: Vec<_> = (0..self.graphs.len())
            .map(|index| {
                let result = self.scan_graph(index, physics);
                if let Err(err) = &result {
                    tracing::warn!(index, error = %err, "Graph scan failed");
                }
                result
            })
            .collect();
        self.link_grids();
        results
    }

    /// Connects border nodes of grids with `auto_link_grids` to the nearest nodes of other grids.
    pub fn link_grids(&mut self) -> usize {
        let mut planned: Vec<(usize, GridLink)> = Vec::new();
        for (i, a) in self.graphs.iter().enumerate() {
            let Some(grid) = a.as_grid() else { continue };
            for (j, b) in self.graphs.iter().enumerate() {
                if i == j {
                    continue;
                }
                if let Some(other) = b.as_grid() {
                    planned.extend(grid.border_links(other).into_iter().map(|link| (i, link)));
                }
            }
        }

        for &(i, link) in &planned {
            let from = NodeRef::new(i as u32, link.from as u32);
            self.graphs[i]
                .as_graph_mut()
                .add_connection(link.from, Connection::new(link.to, link.cost));
            self.graphs[link.to.graph as usize]
                .as_graph_mut()
                .add_connection(link.to.slot(), Connection::new(from, link.cost));
        }

        if !planned.is_empty() {
            tracing::debug!(links = planned.len(), "Linked grid graphs");
        }
        planned.len()
    }

    /// Closest node across all graphs accepted by `constraint`.
    ///
    /// Returns `NnInfo::EMPTY` when no suitable node exists, or when distance is
    /// constrained and the best node is farther than `max_nearest_node_distance`.
    pub fn get_nearest(&self, position: Vec3, constraint: &dyn NnConstraint) -> NnInfo {
        let constraint = SetConstraint {
            inner: constraint,
            max_distance: self.config.max_nearest_node_distance,
        };
        let config = &self.config;

        let mut min_dist = f32::INFINITY;
        let mut nearest = NnInfo::EMPTY;
        let mut nearest_graph = None;

        for (i, graph) in self.graphs.iter().enumerate() {
            if !constraint.suitable_graph(i) {
                continue;
            }
            let graph = graph.as_graph();
            let info = if config.full_get_nearest_search {
                graph.get_nearest_force(position, &constraint)
            } else {
                graph.get_nearest(position, &constraint, None)
            };
            if info.is_empty() {
                continue;
            }

            let dist = (info.clamped_position - position).length();
            if config.prioritize_graphs && dist < config.prioritize_graphs_limit {
                nearest = info;
                nearest_graph = Some(i);
                break;
            }
            if dist < min_dist {
                min_dist = dist;
                nearest = info;
                nearest_graph = Some(i);
            }
        }

        let Some(graph_index) = nearest_graph else {
            return NnInfo::EMPTY;
        };

        if nearest.constrained_node.is_some() {
            nearest = nearest.into_constrained();
        }

        if !config.full_get_nearest_search && !self.is_suitable(nearest.node, &constraint) {
            let forced = self.graphs[graph_index]
                .as_graph()
                .get_nearest_force(position, &constraint);
            if !forced.is_empty() {
                nearest = forced;
            }
        }

        let max_sqr = constraint.max_distance * constraint.max_distance;
        if !self.is_suitable(nearest.node, &constraint)
            || (constraint.constrain_distance() && (nearest.clamped_position - position).length_squared() > max_sqr)
        {
            return NnInfo::EMPTY;
        }
        nearest
    }

    fn is_suitable(&self, node: Option<NodeRef>, constraint: &dyn NnConstraint) -> bool {
        node.and_then(|n| self.node(n))
            .is_some_and(|data| constraint.suitable(data))
    }

    /// Node closest to the infinite line through `origin` along `direction`.
    pub fn nearest_to_ray(&self, origin: Vec3, direction: Vec3) -> Option<NodeRef> {
        let dir = direction.normalize_or_zero();
        let mut min_dist = f32::INFINITY;
        let mut nearest = None;

        for graph in &self.graphs {
            let graph = graph.as_graph();
            for index in 0..graph.node_count() {
                let Some(node) = graph.node(index) else { continue };
                let pos = node.world_position();
                let on_line = origin + dir * (pos - origin).dot(dir);
                let dist = on_line.distance_squared(pos);
                if dist < min_dist {
                    min_dist = dist;
                    nearest = Some(graph.node_ref(index));
                }
            }
        }
        nearest
    }

    /// Applies `update` to every graph in the set.
    pub fn update_graphs(&mut self, update: &mut GraphUpdateObject, physics: &dyn Physics) {
        for graph in &mut self.graphs {
            graph.as_updatable_mut().update_area(update, physics);
        }
    }

    /// Reverts a tracked update on every graph it touched.
    pub fn revert_update(&mut self, update: &mut GraphUpdateObject) -> Result<usize, NavError> {
        let backup = update.take_backup()?;
        let mut restored = 0;
        for snapshot in &backup {
            if let Some(graph) = self.graphs.get_mut(snapshot.node.graph as usize) {
                graph.as_updatable_mut().restore_node(snapshot);
                restored += 1;
            }
        }
        for graph in &mut self.graphs {
            graph.as_graph_mut().base_mut().bump_generation();
        }
        Ok(restored)
    }
}

/// Queues `update` on a barrier-guarded set; it runs on the next flush.
pub fn queue_graph_update<P>(barrier: &SafeUpdateBarrier<GraphSet>, mut update: GraphUpdateObject, physics: Arc<P>)
where
    P: Physics + Send + Sync + 'static,
{
    barrier.register_update(move |set: &mut GraphSet| {
        set.update_graphs(&mut update, physics.as_ref());
    });
}
