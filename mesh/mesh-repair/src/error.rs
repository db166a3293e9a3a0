//! Error types for mesh diagnostics and repair.

use thiserror::Error;

/// Result type for diagnostics and repair operations.
pub type RepairResult<T> = Result<T, RepairError>;

/// Errors that stop a diagnostics or repair run.
///
/// Geometric anomalies (holes, non-manifold edges, branching boundaries,
/// self-intersecting loops) are never errors; they are reported as
/// [`Issue`](crate::Issue)s.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepairError {
    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index} but the mesh has {vertex_count} vertices")]
    InvalidTopology {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        index: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Deduplication collapsed the mesh below a usable vertex set.
    #[error("mesh collapsed to {surviving} usable vertices, need at least 3 non-collinear")]
    DegenerateInput {
        /// Number of vertices left after merging.
        surviving: usize,
    },

    /// The merge tolerance is not a finite positive number.
    #[error("merge tolerance must be finite and positive, got {0}")]
    InvalidTolerance(f64),

    /// The caller cancelled the run between passes.
    #[error("repair cancelled")]
    Cancelled,
}
