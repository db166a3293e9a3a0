//! Mesh diagnostics and repair engine.
//!
//! This umbrella crate re-exports the mesh-* crates and exposes the engine's
//! data-in, report-out surface: plain vertex/face arrays go in through
//! [`MeshData`](mesh_types::MeshData), and a diagnostics report or a
//! repaired mesh with its audit log comes out.
//!
//! # Quick Start
//!
//! ```
//! use mesh::prelude::*;
//!
//! let data = MeshData {
//!     vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
//!     faces: vec![[0, 1, 2], [0, 0, 0]],
//!     ..Default::default()
//! };
//!
//! let report = mesh::diagnose(&data).unwrap();
//! assert!(report.health_score < 100);
//!
//! let repaired = mesh::repair(&data, false, 1e-6).unwrap();
//! assert_eq!(repaired.stats_after.vertex_count, 3);
//! assert_eq!(repaired.stats_after.face_count, 1);
//! assert_eq!(
//!     repaired.repairs_applied,
//!     ["remove_duplicates", "remove_degenerate", "fix_normals"]
//! );
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Core data structures: `IndexedMesh`, `Vertex`, `Triangle`, `Aabb`, `MeshData`
//! - [`repair`](mod@repair) - Adjacency, diagnostics, health score, repair passes and pipeline
//!
//! # Feature Flags
//!
//! - `serde` - Serialize/deserialize mesh data, reports and parameters

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;

use mesh_repair::{
    CancelToken, DiagnosticsReport, Issue, RepairParams, Stats, diagnose_mesh,
    repair_mesh_with_cancel,
};
use mesh_types::{IndexedMesh, MeshData};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use error::{EngineError, EngineResult};

// =============================================================================
// Re-exports
// =============================================================================

/// Core data structures: `IndexedMesh`, `Vertex`, `Triangle`, `Aabb`, `MeshData`.
pub use mesh_types as types;

/// Adjacency, diagnostics, health score, repair passes and pipeline.
pub use mesh_repair as repair;

// =============================================================================
// Engine surface
// =============================================================================

/// Repaired mesh data plus the audit of how it got there.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RepairReport {
    /// The repaired mesh.
    pub mesh: MeshData,
    /// Names of the passes that ran, in order.
    pub repairs_applied: Vec<String>,
    /// Stats of the input mesh.
    pub stats_before: Stats,
    /// Stats of the repaired mesh.
    pub stats_after: Stats,
    /// Boundary problems hole filling left in place.
    pub unrepaired: Vec<Issue>,
}

/// Diagnose a mesh given as plain arrays.
///
/// # Errors
///
/// - [`EngineError::Data`] if the arrays cannot form a mesh
/// - [`EngineError::Repair`] if a face references a missing vertex
pub fn diagnose(data: &MeshData) -> EngineResult<DiagnosticsReport> {
    let mesh = IndexedMesh::from_data(data)?;
    Ok(diagnose_mesh(&mesh)?)
}

/// Repair a mesh given as plain arrays.
///
/// `aggressive` adds hole filling and normal smoothing; `tolerance` is the
/// vertex merge distance.
///
/// # Errors
///
/// - [`EngineError::Data`] if the arrays cannot form a mesh
/// - [`EngineError::Aborted`] if the run stopped early; it carries the
///   passes that completed and the mesh as it was before the failing pass
pub fn repair(data: &MeshData, aggressive: bool, tolerance: f64) -> EngineResult<RepairReport> {
    let params = RepairParams::default()
        .with_aggressive(aggressive)
        .with_tolerance(tolerance);
    repair_with_params(data, &params, &CancelToken::new())
}

/// Repair a mesh given as plain arrays with full parameters and a cancel token.
///
/// # Errors
///
/// As [`repair()`]; cancellation surfaces as [`EngineError::Aborted`] with
/// [`RepairError::Cancelled`](mesh_repair::RepairError::Cancelled).
pub fn repair_with_params(
    data: &MeshData,
    params: &RepairParams,
    cancel: &CancelToken,
) -> EngineResult<RepairReport> {
    let mesh = IndexedMesh::from_data(data)?;
    debug!(
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        aggressive = params.aggressive,
        tolerance = params.tolerance,
        "Repair requested"
    );

    let outcome = repair_mesh_with_cancel(&mesh, params, cancel)?;

    Ok(RepairReport {
        mesh: outcome.mesh.to_data(),
        repairs_applied: outcome
            .repairs_applied()
            .into_iter()
            .map(String::from)
            .collect(),
        stats_before: outcome.stats_before,
        stats_after: outcome.stats_after,
        unrepaired: outcome.unrepaired,
    })
}

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for mesh diagnostics and repair.
///
/// # Usage
///
/// ```
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{
        Aabb, IndexedMesh, MeshBounds, MeshData, MeshTopology, Triangle, Vertex,
    };

    // Diagnostics
    pub use mesh_repair::{
        DiagnosticOptions, DiagnosticsReport, Issue, IssueKind, Severity, Stats, diagnose_mesh,
    };

    // Repair
    pub use mesh_repair::{CancelToken, RepairOutcome, RepairParams, RepairPass, repair_mesh};

    // Engine surface
    pub use crate::{EngineError, RepairReport};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_data() -> MeshData {
        MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![[0, 1, 2]],
            ..Default::default()
        }
    }

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let mesh = IndexedMesh::new();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        let _ = RepairParams::default();
    }

    #[test]
    fn test_module_reexports() {
        let _ = types::IndexedMesh::new();
        let _ = repair::DiagnosticOptions::default();
    }

    #[test]
    fn diagnose_triangle() {
        let report = diagnose(&triangle_data()).unwrap();
        assert_eq!(report.health_score, 80);
    }

    #[test]
    fn repair_emits_normals() {
        let report = repair(&triangle_data(), false, 1e-6).unwrap();
        let normals = report.mesh.normals.unwrap();
        assert_eq!(normals.len(), 3);
        assert!(normals.iter().all(|n| (n[2] - 1.0).abs() < 1e-12));
    }
}
