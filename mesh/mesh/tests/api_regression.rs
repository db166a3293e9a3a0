//! API Regression Tests for the Mesh Engine
//!
//! These tests serve as a regression suite to ensure the public API remains
//! stable and consistent across the mesh crates. They are organized in tiers
//! of increasing scope:
//!
//! - Tier 1: Foundation (mesh-types, boundary data conversion)
//! - Tier 2: Diagnostics (adjacency, issues, health score)
//! - Tier 3: Repair (passes, pipeline, cancellation)
//! - Tier 4: Engine surface (`diagnose` / `repair` over plain arrays)
//!
//! If any of these tests fail after API changes, it indicates a breaking change
//! that needs documentation in CHANGELOG.md and a version bump.

// Allow test-specific patterns
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::let_underscore_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_lossless)]

use approx::assert_relative_eq;
use mesh::{prelude::*, repair, types};

fn triangle_data() -> MeshData {
    MeshData {
        vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        faces: vec![[0, 1, 2]],
        ..Default::default()
    }
}

fn open_box() -> IndexedMesh {
    let mut mesh = types::unit_cube();
    mesh.faces.retain(|&f| f != [4, 5, 6] && f != [4, 6, 7]);
    mesh
}

// =============================================================================
// TIER 1: Foundation - Basic Types and Boundary Data
// =============================================================================

mod tier1_foundation {
    use super::*;

    #[test]
    fn vertex_creation_and_access() {
        let v = types::Vertex::from_coords(1.0, 2.0, 3.0);
        assert_relative_eq!(v.position.x, 1.0);
        assert_relative_eq!(v.position.y, 2.0);
        assert_relative_eq!(v.position.z, 3.0);
        assert!(v.normal().is_none());

        let point = types::Point3::new(4.0, 5.0, 6.0);
        let v2 = types::Vertex::with_normal(point, types::Vector3::z());
        assert_relative_eq!(v2.normal().unwrap().z, 1.0);
    }

    #[test]
    fn indexed_mesh_construction() {
        let mesh = types::IndexedMesh::new();
        assert!(mesh.is_empty());

        let mesh = types::IndexedMesh::from_raw(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[0, 1, 2],
        );
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert_relative_eq!(mesh.surface_area(), 0.5);
    }

    #[test]
    fn mesh_bounds_calculation() {
        let cube = types::unit_cube();
        let bounds = cube.bounds();

        assert_relative_eq!(bounds.min.x, 0.0);
        assert_relative_eq!(bounds.max.z, 1.0);
        assert_relative_eq!(cube.diagonal(), 3.0_f64.sqrt());
    }

    #[test]
    fn mesh_data_round_trip_keeps_attributes() {
        let mut data = triangle_data();
        data.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);

        let mesh = IndexedMesh::from_data(&data).unwrap();
        assert!(mesh.has_normals());
        assert!(!mesh.has_uvs());
        assert_eq!(mesh.to_data(), data);
    }

    #[test]
    fn mesh_data_rejects_bad_arrays() {
        let mut data = triangle_data();
        data.uvs = Some(vec![[0.0, 0.0]]);
        assert_eq!(
            IndexedMesh::from_data(&data),
            Err(types::MeshDataError::AttributeLengthMismatch {
                attribute: "uvs",
                expected: 3,
                actual: 1,
            })
        );

        let mut data = triangle_data();
        data.vertices[1][0] = f64::NAN;
        assert_eq!(
            IndexedMesh::from_data(&data),
            Err(types::MeshDataError::NonFinitePosition { index: 1 })
        );
    }
}

// =============================================================================
// TIER 2: Diagnostics
// =============================================================================

mod tier2_diagnostics {
    use super::*;

    #[test]
    fn adjacency_queries() {
        let cube = types::unit_cube();
        let adjacency = repair::MeshAdjacency::for_mesh(&cube).unwrap();

        assert!(adjacency.is_watertight());
        assert!(adjacency.is_manifold());
        assert_eq!(adjacency.edge_count(), 18);
        assert_eq!(adjacency.faces_for_edge(0, 2).map(<[usize]>::len), Some(2));
    }

    #[test]
    fn diagnostic_options_builder_pattern() {
        let options = DiagnosticOptions::default()
            .with_degenerate_area_ratio(1e-8)
            .with_normal_epsilon(1e-3);
        assert_relative_eq!(options.degenerate_area_ratio, 1e-8);

        let report = repair::diagnose_mesh_with_options(&types::unit_cube(), &options).unwrap();
        assert_eq!(report.stats.face_count, 12);
    }

    #[test]
    fn issue_taxonomy() {
        assert_eq!(IssueKind::Hole.as_str(), "hole");
        assert_eq!(IssueKind::NonManifoldEdge.severity(), Severity::High);
        assert_eq!(IssueKind::MissingNormals.severity(), Severity::Medium);
        assert_eq!(IssueKind::DuplicateFaces.severity(), Severity::Low);
        assert!(IssueKind::NonManifoldEdge < IssueKind::Hole);
    }

    #[test]
    fn health_score_formula() {
        assert_eq!(repair::health_score(0, 0), 100);
        assert_eq!(repair::health_score(1, 0), 80);
        assert_eq!(repair::health_score(2, 3), 45);
        assert_eq!(repair::health_score(6, 0), 0);
    }

    #[test]
    fn hole_detection() {
        let mesh = open_box();
        let report = diagnose_mesh(&mesh).unwrap();

        let holes: Vec<_> = report.issues_of(IssueKind::Hole).collect();
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].vertices.len(), 4);
        assert_eq!(report.stats.boundary_edge_count, 4);
    }
}

// =============================================================================
// TIER 3: Repair
// =============================================================================

mod tier3_repair {
    use super::*;

    #[test]
    fn repair_params_builder_pattern() {
        let params = RepairParams::default()
            .with_tolerance(1e-4)
            .with_remove_unreferenced(true)
            .with_max_hole_edges(64);

        assert_relative_eq!(params.tolerance, 1e-4);
        assert!(!params.aggressive);
        assert!(params.remove_unreferenced);
        assert_eq!(params.max_hole_edges, Some(64));
        assert!(RepairParams::aggressive().aggressive);
    }

    #[test]
    fn repair_pass_names() {
        let names: Vec<_> = RepairParams::aggressive()
            .passes()
            .into_iter()
            .map(RepairPass::name)
            .collect();
        assert_eq!(
            names,
            [
                "remove_duplicates",
                "remove_degenerate",
                "fix_normals",
                "fill_holes",
                "smooth_normals"
            ]
        );
    }

    #[test]
    fn individual_passes() {
        let mut mesh = open_box();
        assert_eq!(repair::merge_duplicate_vertices(&mut mesh, 1e-6), Ok(0));
        assert_eq!(
            repair::remove_degenerate_faces(&mut mesh, repair::DEFAULT_DEGENERATE_AREA_RATIO),
            0
        );
        repair::compute_vertex_normals(&mut mesh);
        assert!(mesh.has_normals());

        let fill = repair::fill_holes(&mut mesh, None).unwrap();
        assert_eq!(fill.filled, 1);
        assert_eq!(fill.faces_added, 2);
    }

    #[test]
    fn repair_outcome_fields() {
        let outcome = repair_mesh(&open_box(), &RepairParams::aggressive()).unwrap();

        assert_eq!(outcome.passes.len(), 5);
        assert_eq!(outcome.stats_before.face_count, 10);
        assert_eq!(outcome.stats_after.face_count, 12);
        assert!(outcome.unrepaired.is_empty());
        assert!(outcome.to_string().contains("fill_holes"));
    }

    #[test]
    fn cancellation_aborts_with_partial_record() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let abort = repair::repair_mesh_with_cancel(&open_box(), &RepairParams::default(), &cancel)
            .unwrap_err();
        assert_eq!(abort.source, repair::RepairError::Cancelled);
        assert!(abort.repairs_applied().is_empty());
        assert_eq!(abort.mesh, open_box());
    }
}

// =============================================================================
// TIER 4: Engine Surface
// =============================================================================

mod tier4_engine {
    use super::*;

    #[test]
    fn diagnose_single_triangle() {
        let report = mesh::diagnose(&triangle_data()).unwrap();

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::MissingNormals);
        assert_eq!(report.stats.vertex_count, 3);
        assert_eq!(report.stats.face_count, 1);
        assert!(!report.stats.has_normals);
        assert_eq!(report.health_score, 80);
    }

    #[test]
    fn repair_duplicate_and_degenerate() {
        let data = MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
            faces: vec![[0, 1, 2], [0, 0, 0]],
            ..Default::default()
        };
        let report = mesh::repair(&data, false, 1e-6).unwrap();

        assert_eq!(report.stats_before.vertex_count, 4);
        assert_eq!(report.stats_after.vertex_count, 3);
        assert_eq!(report.stats_after.face_count, 1);
        assert_eq!(report.mesh.vertices.len(), 3);
        assert_eq!(
            report.repairs_applied,
            ["remove_duplicates", "remove_degenerate", "fix_normals"]
        );
    }

    #[test]
    fn repair_emits_normals_for_left_over_vertices() {
        let data = MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]],
            faces: vec![[0, 1, 2], [3, 3, 3]],
            ..Default::default()
        };
        let report = mesh::repair(&data, false, 1e-6).unwrap();

        assert_eq!(report.stats_after.face_count, 1);
        assert!(report.stats_after.has_normals);
        let normals = report.mesh.normals.expect("normals after fix_normals");
        assert_eq!(normals.len(), 4);
        for n in &normals[..3] {
            assert_relative_eq!(n[2], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn repaired_mixed_winding_has_no_inverted_faces() {
        let data = MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 2.0, 0.0]],
            faces: vec![[0, 1, 2], [0, 3, 2]],
            ..Default::default()
        };
        let report = mesh::repair(&data, false, 1e-6).unwrap();
        let diagnostics = mesh::diagnose(&report.mesh).unwrap();

        assert_eq!(diagnostics.count(IssueKind::InvertedNormal), 0);
    }

    #[test]
    fn repair_clean_mesh_keeps_counts() {
        let data = types::unit_cube().to_data();
        let report = mesh::repair(&data, false, 1e-6).unwrap();

        assert_eq!(report.repairs_applied.len(), 3);
        assert_eq!(report.stats_after.vertex_count, 8);
        assert_eq!(report.stats_after.face_count, 12);
        assert_eq!(report.mesh.faces, data.faces);
    }

    #[test]
    fn aggressive_repair_fills_holes() {
        let data = open_box().to_data();
        let report = mesh::repair(&data, true, 1e-6).unwrap();

        assert_eq!(report.stats_after.boundary_edge_count, 0);
        assert_eq!(report.repairs_applied.len(), 5);
        assert!(report.mesh.normals.is_some());
    }

    #[test]
    fn repair_with_full_params() {
        let mut data = triangle_data();
        data.vertices.push([9.0, 9.0, 9.0]);

        let params = RepairParams::default().with_remove_unreferenced(true);
        let report = mesh::repair_with_params(&data, &params, &CancelToken::new()).unwrap();

        assert_eq!(report.mesh.vertices.len(), 3);
        assert!(
            report
                .repairs_applied
                .iter()
                .any(|name| name == "remove_unreferenced")
        );
    }
}

// =============================================================================
// Error Handling
// =============================================================================

mod error_handling {
    use super::*;

    #[test]
    fn out_of_range_index_is_fatal() {
        let mut data = triangle_data();
        data.faces.push([0, 1, 5]);

        let err = mesh::diagnose(&data).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Repair(repair::RepairError::InvalidTopology { face: 1, index: 5, .. })
        ));

        let err = mesh::repair(&data, false, 1e-6).unwrap_err();
        assert!(matches!(
            err.repair_error(),
            Some(repair::RepairError::InvalidTopology { .. })
        ));
        assert!(err.repairs_applied().is_empty());
    }

    #[test]
    fn collapsing_mesh_aborts() {
        let data = MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1e-9, 0.0, 0.0], [0.0, 1e-9, 0.0]],
            faces: vec![[0, 1, 2]],
            ..Default::default()
        };

        let err = mesh::repair(&data, false, 1e-6).unwrap_err();
        let EngineError::Aborted(abort) = err else {
            panic!("expected an aborted run");
        };
        assert_eq!(abort.pass, Some(RepairPass::RemoveDuplicates));
        assert!(matches!(
            abort.source,
            repair::RepairError::DegenerateInput { surviving: 1 }
        ));
        assert_eq!(abort.mesh.vertices.len(), 3);
    }

    #[test]
    fn invalid_tolerance_aborts() {
        let err = mesh::repair(&triangle_data(), false, f64::NAN).unwrap_err();
        assert!(matches!(
            err.repair_error(),
            Some(repair::RepairError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn bad_data_is_reported_before_diagnostics() {
        let mut data = triangle_data();
        data.normals = Some(vec![[0.0, 0.0, 1.0]; 2]);

        let err = mesh::diagnose(&data).unwrap_err();
        assert!(matches!(err, EngineError::Data(_)));
    }
}

// =============================================================================
// Serialization (feature-gated)
// =============================================================================

#[cfg(feature = "serde")]
mod serialization {
    use super::*;

    #[test]
    fn report_serializes_to_snake_case() {
        let report = mesh::diagnose(&triangle_data()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["health_score"], 80);
        assert_eq!(json["issues"][0]["kind"], "missing_normals");
        assert_eq!(json["issues"][0]["severity"], "medium");
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: RepairParams = serde_json::from_str(r#"{"aggressive": true}"#).unwrap();
        assert!(params.aggressive);
        assert_relative_eq!(params.tolerance, 1e-6);
    }
}
