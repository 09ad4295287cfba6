//! Grid, navmesh and point graph generators built on `nav-core`.
//!
//! Each generator scans a source (a `Physics` world, a triangle mesh or a
//! waypoint tree) into nodes and edges, answers nearest-node queries and accepts
//! incremental area updates. `GraphSet` holds several graphs and picks the best
//! node across them.

#![forbid(unsafe_code)]

pub mod funnel;
pub mod grid;
pub mod navmesh;
pub mod point;
pub mod registry;
pub mod scene;

pub use funnel::{string_pull, string_pull_into};
pub use grid::{GridGraph, GridGraphSettings, GridLayout, GridLink, GridNode, NumNeighbours};
pub use navmesh::{MeshNode, MeshSource, NavMeshGraph, NavMeshSettings};
pub use point::{PointGraph, PointGraphSettings, Waypoint, WaypointTree};
pub use registry::{queue_graph_update, AnyGraph, GraphSet, GraphSetConfig};
pub use scene::{Collider, Shape, StaticScene};
