//! YAML scene files: colliders, graph definitions, updates and queries.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use nav_core::{GraphUpdateObject, NodeConstraint, Vec3};
use nav_graphs::{
    AnyGraph, GraphSet, GraphSetConfig, GridGraph, GridGraphSettings, MeshSource, NavMeshGraph, NavMeshSettings,
    PointGraph, PointGraphSettings, StaticScene, WaypointTree,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFile {
    pub config: GraphSetConfig,
    pub colliders: StaticScene,
    pub graphs: Vec<GraphDef>,
    pub updates: Vec<GraphUpdateObject>,
    pub queries: Vec<Query>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphDef {
    Grid {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        settings: GridGraphSettings,
    },
    Navmesh {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        settings: NavMeshSettings,
        mesh: MeshSource,
    },
    Point {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        settings: PointGraphSettings,
        waypoints: WaypointTree,
    },
}

impl GraphDef {
    fn build(self) -> AnyGraph {
        let (name, mut graph): (Option<String>, AnyGraph) = match self {
            GraphDef::Grid { name, settings } => (name, GridGraph::new(settings).into()),
            GraphDef::Navmesh { name, settings, mesh } => (name, NavMeshGraph::new(settings, mesh).into()),
            GraphDef::Point {
                name,
                settings,
                waypoints,
            } => (name, PointGraph::new(settings, waypoints).into()),
        };
        if let Some(name) = name {
            graph.as_graph_mut().base_mut().name = name;
        }
        graph
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub position: Vec3,
    #[serde(default)]
    pub constraint: NodeConstraint,
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene from {}", path.display()))?;
        let scene: SceneFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scene {}", path.display()))?;
        tracing::debug!(
            graphs = scene.graphs.len(),
            colliders = scene.colliders.colliders.len(),
            updates = scene.updates.len(),
            "Loaded scene"
        );
        Ok(scene)
    }

    /// Builds the graph set without scanning it.
    pub fn graph_set(&self) -> GraphSet {
        let mut set = GraphSet::new(self.config.clone());
        for def in self.graphs.iter().cloned() {
            set.add(def.build());
        }
        set
    }
}
