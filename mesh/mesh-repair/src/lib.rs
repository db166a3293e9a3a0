//! Mesh diagnostics and repair for indexed triangle meshes.
//!
//! This crate provides tools for:
//! - Adjacency building with index validation
//! - Diagnostics: non-manifold edges and vertices, holes, branching
//!   boundaries, missing or inverted normals, degenerate faces
//! - A 0-100 health score summarizing the findings
//! - Repair passes: vertex deduplication, degenerate face removal,
//!   orphan compaction, normal recomputation, hole filling
//! - An ordered repair pipeline with a per-pass audit log and
//!   cooperative cancellation
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex};
//! use mesh_repair::{RepairParams, diagnose_mesh, repair_mesh};
//!
//! // Create a simple mesh
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! // Diagnose the mesh
//! let report = diagnose_mesh(&mesh).unwrap();
//! println!("Health score: {}", report.health_score);
//!
//! // Repair the mesh
//! let outcome = repair_mesh(&mesh, &RepairParams::default()).unwrap();
//! println!("Passes: {:?}", outcome.repairs_applied());
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod adjacency;
mod diagnose;
mod error;
pub mod holes;
mod issue;
mod manifold;
mod normals;
mod pipeline;
mod repair;
mod score;

pub use adjacency::{Edge, MeshAdjacency, has_repeated_index, validate_indices};
pub use diagnose::{
    DiagnosticOptions, DiagnosticsReport, Stats, diagnose_mesh, diagnose_mesh_with_options,
    mesh_stats,
};
pub use error::{RepairError, RepairResult};
pub use issue::{Issue, IssueKind, Severity, Warning, sort_issues};
pub use manifold::{non_manifold_edge_issues, non_manifold_vertex_issues};
pub use normals::{compute_vertex_normals, face_normals, is_inverted, stored_face_normal};
pub use pipeline::{
    CancelToken, PassSummary, PipelineResult, RepairAbort, RepairOutcome, RepairParams,
    RepairPass, repair_mesh, repair_mesh_with_cancel,
};
pub use repair::{
    DEFAULT_DEGENERATE_AREA_RATIO, DEFAULT_TOLERANCE, degenerate_faces, duplicate_faces,
    merge_duplicate_vertices, remove_degenerate_faces, remove_unreferenced_vertices,
    unreferenced_vertices,
};
pub use score::{ISSUE_PENALTY, WARNING_PENALTY, health_score};

// Re-export commonly used items from submodules
pub use holes::{
    BoundaryAnalysis, BoundaryLoop, HoleFillReport, TriangulationFailure, detect_holes,
    fill_holes, triangulate_hole,
};
