//! Error types for converting boundary mesh data.

use thiserror::Error;

/// Result type for mesh data conversion.
pub type MeshDataResult<T> = Result<T, MeshDataError>;

/// Errors raised while turning raw [`MeshData`](crate::MeshData) into an
/// [`IndexedMesh`](crate::IndexedMesh).
///
/// Face indices are not checked here; the adjacency builder
/// owns that precondition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshDataError {
    /// A per-vertex attribute array does not match the vertex count.
    #[error("{attribute} has {actual} entries but the mesh has {expected} vertices")]
    AttributeLengthMismatch {
        /// Attribute name (`normals` or `uvs`).
        attribute: &'static str,
        /// Number of vertices.
        expected: usize,
        /// Number of attribute entries supplied.
        actual: usize,
    },

    /// A vertex position contains NaN or an infinity.
    #[error("vertex {index} has a non-finite position")]
    NonFinitePosition {
        /// Index of the offending vertex.
        index: usize,
    },
}
