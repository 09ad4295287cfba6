//! Sparse waypoint graph with pairwise, raycast-validated connections.

use nav_core::{
    approximately, round_to_int, Connection, GraphBase, GraphKind, GraphUpdateObject, Int3, LayerMask, NavError,
    NavGraph, Node, NodeData, NodeSnapshot, Physics, ScanReport, UpdatableGraph, Vec3,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named, tagged point in the host's scene hierarchy.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Waypoint {
    pub name: String,
    pub tag: String,
    pub position: Vec3,
    pub children: Vec<Waypoint>,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_children(mut self, children: Vec<Waypoint>) -> Self {
        self.children = children;
        self
    }

    fn find(&self, name: &str) -> Option<&Waypoint> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Descendants in depth-first pre-order, excluding `self`.
    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Waypoint>) {
        for child in &self.children {
            out.push(child);
            child.collect_descendants(out);
        }
    }
}

/// Forest of waypoints a point graph is built from.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WaypointTree {
    pub roots: Vec<Waypoint>,
}

impl WaypointTree {
    pub fn new(roots: Vec<Waypoint>) -> Self {
        Self { roots }
    }

    pub fn find(&self, name: &str) -> Option<&Waypoint> {
        self.roots.iter().find_map(|r| r.find(name))
    }

    /// Every waypoint carrying `tag`, in depth-first pre-order.
    pub fn with_tag(&self, tag: &str) -> Vec<&Waypoint> {
        let mut all = Vec::new();
        for root in &self.roots {
            all.push(root);
            root.collect_descendants(&mut all);
        }
        all.retain(|w| w.tag == tag);
        all
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PointGraphSettings {
    /// Name of the waypoint whose children become nodes.
    pub root: Option<String>,
    /// Used when `root` is unset: every waypoint with this tag becomes a node.
    pub search_tag: String,
    /// Longest connection. `0` is unbounded, negative disables connections.
    pub max_distance: f32,
    /// Per-axis displacement limits. `0` on an axis is unbounded.
    pub limits: Vec3,
    pub raycast: bool,
    pub thick_raycast: bool,
    pub thick_raycast_radius: f32,
    /// Take all descendants of `root` instead of its direct children.
    pub recursive: bool,
    pub mask: LayerMask,
}

impl Default for PointGraphSettings {
    fn default() -> Self {
        Self {
            root: None,
            search_tag: String::new(),
            max_distance: 0.0,
            limits: Vec3::ZERO,
            raycast: true,
            thick_raycast: false,
            thick_raycast_radius: 1.0,
            recursive: true,
            mask: LayerMask::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointGraph {
    pub base: GraphBase,
    pub settings: PointGraphSettings,
    pub source: WaypointTree,
    nodes: Vec<Node>,
}

impl PointGraph {
    pub fn new(settings: PointGraphSettings, source: WaypointTree) -> Self {
        Self {
            base: GraphBase::named("Point Graph"),
            settings,
            source,
            nodes: Vec::new(),
        }
    }

    pub fn point_nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn source_points(&self) -> Result<Vec<Vec3>, NavError> {
        let points = match &self.settings.root {
            Some(name) => {
                let root = self
                    .source
                    .find(name)
                    .ok_or_else(|| NavError::MissingRoot(name.clone()))?;
                if self.settings.recursive {
                    let mut all = Vec::new();
                    root.collect_descendants(&mut all);
                    all.iter().map(|w| w.position).collect()
                } else {
                    root.children.iter().map(|w| w.position).collect()
                }
            }
            None => self
                .source
                .with_tag(&self.settings.search_tag)
                .iter()
                .map(|w| w.position)
                .collect(),
        };
        Ok(points)
    }

    /// Checks walkability, axis limits, distance and line of sight between two nodes.
    ///
    /// Returns the world distance when the connection is valid. Line of sight is
    /// tested in both directions since casts starting inside a collider miss it.
    pub fn is_valid_connection(&self, a: &NodeData, b: &NodeData, physics: &dyn Physics) -> Option<f32> {
        if !a.walkable || !b.walkable {
            return None;
        }

        let settings = &self.settings;
        let dir = (a.position - b.position).to_vec3();
        let limits = settings.limits;
        let exceeds = |limit: f32, d: f32| !approximately(limit, 0.0) && d.abs() > limit;
        if exceeds(limits.x, dir.x) || exceeds(limits.y, dir.y) || exceeds(limits.z, dir.z) {
            return None;
        }

        let dist = dir.length();
        if !(settings.max_distance == 0.0 || dist < settings.max_distance) {
            return None;
        }
        if !settings.raycast {
            return Some(dist);
        }

        let (pa, pb) = (a.world_position(), b.world_position());
        let forward = (pb - pa).normalize_or_zero();
        let blocked = if settings.thick_raycast {
            let r = settings.thick_raycast_radius;
            physics.sphere_cast(pa, r, forward, dist, settings.mask).is_some()
                || physics.sphere_cast(pb, r, -forward, dist, settings.mask).is_some()
        } else {
            physics.raycast(pa, forward, dist, settings.mask).is_some()
                || physics.raycast(pb, -forward, dist, settings.mask).is_some()
        };
        (!blocked).then_some(dist)
    }

    fn connection_cost(dist: f32) -> u32 {
        round_to_int(dist * Int3::FLOAT_PRECISION).max(0) as u32
    }

    fn reconnect(&mut self, i: usize, j: usize, physics: &dyn Physics) {
        let valid = self.is_valid_connection(&self.nodes[i].data, &self.nodes[j].data, physics);
        let target = self.base.node_ref(j);
        match valid {
            Some(dist) => self.nodes[i].add_connection(target, Self::connection_cost(dist)),
            None => self.nodes[i].remove_connection(target),
        }
    }
}

impl NavGraph for PointGraph {
    fn base(&self) -> &GraphBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GraphBase {
        &mut self.base
    }

    fn kind(&self) -> GraphKind {
        GraphKind::Point
    }

    fn scan(&mut self, physics: &dyn Physics) -> Result<ScanReport, NavError> {
        let points = self.source_points()?;
        let penalty = self.base.initial_penalty;
        let mut nodes: Vec<Node> = points
            .into_iter()
            .map(|p| Node::new(NodeData::new(p.into(), penalty)))
            .collect();

        if self.settings.max_distance >= 0.0 {
            for i in 0..nodes.len() {
                let mut connections = Vec::new();
                for j in 0..nodes.len() {
                    if i == j {
                        continue;
                    }
                    if let Some(dist) = self.is_valid_connection(&nodes[i].data, &nodes[j].data, physics) {
                        connections.push(Connection::new(self.base.node_ref(j), Self::connection_cost(dist)));
                    }
                }
                nodes[i].connections = connections;
            }
        }

        let report = ScanReport {
            nodes: nodes.len(),
            walkable: nodes.len(),
            connections: nodes.iter().map(|n| n.connections.len()).sum(),
            ..ScanReport::default()
        };
        self.nodes = nodes;
        self.base.bump_generation();

        tracing::debug!(
            graph = %self.base.name,
            nodes = report.nodes,
            connections = report.connections,
            "Scanned point graph"
        );
        Ok(report)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, index: usize) -> Option<&NodeData> {
        self.nodes.get(index).map(|n| &n.data)
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut NodeData> {
        self.nodes.get_mut(index).map(|n| &mut n.data)
    }

    fn connections(&self, index: usize) -> Vec<Connection> {
        self.nodes
            .get(index)
            .map(|n| n.connections.clone())
            .unwrap_or_default()
    }

    fn add_connection(&mut self, index: usize, connection: Connection) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.add_connection(connection.target, connection.cost);
        }
    }
}

impl UpdatableGraph for PointGraph {
    /// Applies `update` to nodes inside its bounds. When the update can change
    /// walkability (physics resampling or a walkability override), every
    /// connection to or from a touched node is re-evaluated.
    ///
    /// Reverting restores node state but not re-evaluated connections.
    fn update_area(&mut self, update: &mut GraphUpdateObject, physics: &dyn Physics) {
        if self.nodes.is_empty() {
            tracing::warn!(graph = %self.base.name, "Point graph is not scanned, cannot update area");
            return;
        }

        let touched: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| update.bounds.contains(self.nodes[i].data.world_position()))
            .collect();

        for &index in &touched {
            if let Some(snapshot) = self.snapshot_node(index) {
                update.will_update_node(snapshot);
            }
            update.apply(&mut self.nodes[index].data);
        }

        if update.changes_walkability() && self.settings.max_distance >= 0.0 {
            for &i in &touched {
                for j in 0..self.nodes.len() {
                    if i != j {
                        self.reconnect(i, j, physics);
                        self.reconnect(j, i, physics);
                    }
                }
            }
        }

        if !touched.is_empty() {
            self.base.bump_generation();
        }
    }

    fn snapshot_node(&self, index: usize) -> Option<NodeSnapshot> {
        let node = self.nodes.get(index)?;
        Some(NodeSnapshot {
            node: self.base.node_ref(index),
            data: node.data,
            extra: 0,
        })
    }

    fn restore_node(&mut self, snapshot: &NodeSnapshot) {
        if let Some(node) = self.nodes.get_mut(snapshot.node.slot()) {
            node.data = snapshot.data;
        }
    }
}
