use thiserror::Error;

/// Errors reported by graph scans and updates.
///
/// A scan that fails leaves the graph exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    #[error("node size must be positive, got {0}")]
    InvalidNodeSize(f32),

    #[error("grid of {width}x{depth} nodes exceeds the 1024 node limit per side")]
    GridTooLarge { width: i32, depth: i32 },

    #[error(
        "too few tags for {iterations} erosion iterations starting at tag {first_tag} \
         (iterations + first tag must not exceed 31)"
    )]
    ErosionTagOverflow { iterations: u32, first_tag: u8 },

    #[error("first erosion tag must be at least 1")]
    InvalidErosionFirstTag,

    #[error("graph has not been scanned")]
    NotScanned,

    #[error("changed nodes were not tracked, cannot revert")]
    ChangesNotTracked,

    #[error("no graph at index {0}")]
    GraphIndexOutOfRange(usize),

    #[error("triangle index {index} is out of range for {vertex_count} vertices")]
    InvalidTriangleIndex { index: usize, vertex_count: usize },

    #[error("waypoint root `{0}` was not found")]
    MissingRoot(String),
}

pub type NavResult<T> = Result<T, NavError>;
