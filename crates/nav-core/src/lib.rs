//! Fixed-point geometry, node model and query contracts for spatial navigation graphs.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod barrier;
pub mod collision;
pub mod constraint;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod math;
pub mod node;
pub mod physics;
pub mod update;

pub use barrier::{SafeUpdateBarrier, SearchGuard};
pub use collision::{ColliderType, GraphCollision, HeightSample, PreparedCollision, RayDirection};
pub use constraint::{NnConstraint, NnInfo, NodeConstraint, PathConstraint, DEFAULT_MAX_NEAREST_NODE_DISTANCE};
pub use error::{NavError, NavResult};
pub use graph::{nearest_linear, relocate_linear, FunnelGraph, GraphBase, GraphKind, NavGraph, ScanReport, UpdatableGraph};
pub use math::{approximately, round_to_int, Bounds, Int3, IntRect, Matrix4, Vec3};
pub use node::{upsert_connection, Connection, GraphNode, Node, NodeData, NodeRef, NodeSnapshot, MAX_TAG};
pub use physics::{LayerMask, NoPhysics, Physics, RaycastHit};
pub use update::{GraphUpdateObject, GraphUpdateShape};
