//! Mesh diagnostics and health reporting.
//!
//! Runs every check against one adjacency snapshot and collects the
//! results into a [`DiagnosticsReport`]. Anomalies are the expected output:
//! the only error is an out-of-range face index.

use std::fmt;

use mesh_types::IndexedMesh;
use rayon::prelude::*;
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::adjacency::{MeshAdjacency, has_repeated_index};
use crate::error::RepairResult;
use crate::holes::detect_holes;
use crate::issue::{Issue, IssueKind, Warning, sort_issues};
use crate::manifold::{non_manifold_edge_issues, non_manifold_vertex_issues};
use crate::normals::is_inverted;
use crate::repair::{
    DEFAULT_DEGENERATE_AREA_RATIO, degenerate_faces, duplicate_faces, unreferenced_vertices,
};
use crate::score::health_score;

/// Summary counts, computed whether or not any issue was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stats {
    /// Total number of vertices.
    pub vertex_count: usize,
    /// Total number of faces.
    pub face_count: usize,
    /// Whether at least one vertex carries a normal.
    pub has_normals: bool,
    /// Whether at least one vertex carries texture coordinates.
    pub has_uvs: bool,
    /// Number of edges with exactly one adjacent face.
    pub boundary_edge_count: usize,
    /// Number of edges with three or more adjacent faces.
    pub non_manifold_edge_count: usize,
}

impl Stats {
    /// Stats from a mesh and its adjacency.
    #[must_use]
    pub fn from_adjacency(mesh: &IndexedMesh, adjacency: &MeshAdjacency) -> Self {
        Self {
            vertex_count: mesh.vertices.len(),
            face_count: mesh.faces.len(),
            has_normals: mesh.has_normals(),
            has_uvs: mesh.has_uvs(),
            boundary_edge_count: adjacency.boundary_edge_count(),
            non_manifold_edge_count: adjacency.non_manifold_edge_count(),
        }
    }
}

/// Compute [`Stats`] for a mesh.
///
/// # Errors
///
/// Returns [`RepairError::InvalidTopology`](crate::RepairError::InvalidTopology)
/// if a face references a missing vertex.
pub fn mesh_stats(mesh: &IndexedMesh) -> RepairResult<Stats> {
    let adjacency = MeshAdjacency::for_mesh(mesh)?;
    Ok(Stats::from_adjacency(mesh, &adjacency))
}

/// Options for mesh diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiagnosticOptions {
    /// Faces with area at most this times the squared bounding-box diagonal
    /// are degenerate.
    ///
    /// Default: `1e-10`
    pub degenerate_area_ratio: f64,

    /// Margin below zero the stored/geometric normal dot product must pass
    /// before a face counts as inverted.
    ///
    /// Default: `1e-6`
    pub normal_epsilon: f64,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            degenerate_area_ratio: DEFAULT_DEGENERATE_AREA_RATIO,
            normal_epsilon: 1e-6,
        }
    }
}

impl DiagnosticOptions {
    /// Set the degenerate-area ratio.
    #[must_use]
    pub const fn with_degenerate_area_ratio(mut self, ratio: f64) -> Self {
        self.degenerate_area_ratio = ratio;
        self
    }

    /// Set the inverted-normal margin.
    #[must_use]
    pub const fn with_normal_epsilon(mut self, epsilon: f64) -> Self {
        self.normal_epsilon = epsilon;
        self
    }
}

/// Result of diagnosing a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagnosticsReport {
    /// Problems found, sorted by kind then first affected index.
    pub issues: Vec<Issue>,
    /// Non-blocking findings, in the same order.
    pub warnings: Vec<Warning>,
    /// Summary counts.
    pub stats: Stats,
    /// 0-100 summary of the issue and warning counts.
    pub health_score: u8,
}

impl DiagnosticsReport {
    /// Assemble a report; sorts both lists and computes the score.
    #[must_use]
    pub fn new(mut issues: Vec<Issue>, mut warnings: Vec<Warning>, stats: Stats) -> Self {
        sort_issues(&mut issues);
        sort_issues(&mut warnings);
        let health_score = health_score(issues.len(), warnings.len());
        Self {
            issues,
            warnings,
            stats,
            health_score,
        }
    }

    /// Whether nothing at all was reported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.warnings.is_empty()
    }

    /// Number of issues of one kind.
    #[must_use]
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Issues of one kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> + '_ {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.stats.vertex_count)?;
        writeln!(f, "  Faces: {}", self.stats.face_count)?;
        writeln!(f, "  Boundary edges: {}", self.stats.boundary_edge_count)?;
        writeln!(f, "  Non-manifold edges: {}", self.stats.non_manifold_edge_count)?;
        writeln!(
            f,
            "  Normals: {}",
            if self.stats.has_normals { "Yes" } else { "No" }
        )?;
        writeln!(f, "  UVs: {}", if self.stats.has_uvs { "Yes" } else { "No" })?;
        writeln!(f, "  Health score: {}", self.health_score)?;

        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Issues:")?;
            for issue in &self.issues {
                writeln!(f, "    {issue}")?;
            }
        }
        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    {warning}")?;
            }
        }

        Ok(())
    }
}

/// Diagnose a mesh with default options.
///
/// # Errors
///
/// Returns [`RepairError::InvalidTopology`](crate::RepairError::InvalidTopology)
/// if a face references a missing vertex; no check runs in that case.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::{IssueKind, diagnose_mesh};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// let report = diagnose_mesh(&mesh).unwrap();
/// assert_eq!(report.issues.len(), 1);
/// assert_eq!(report.issues[0].kind, IssueKind::MissingNormals);
/// assert_eq!(report.health_score, 80);
/// ```
pub fn diagnose_mesh(mesh: &IndexedMesh) -> RepairResult<DiagnosticsReport> {
    diagnose_mesh_with_options(mesh, &DiagnosticOptions::default())
}

/// Diagnose a mesh with custom options.
///
/// # Errors
///
/// See [`diagnose_mesh`].
pub fn diagnose_mesh_with_options(
    mesh: &IndexedMesh,
    options: &DiagnosticOptions,
) -> RepairResult<DiagnosticsReport> {
    let adjacency = MeshAdjacency::for_mesh(mesh)?;

    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    // Manifold
    issues.extend(non_manifold_edge_issues(&adjacency));
    issues.extend(non_manifold_vertex_issues(mesh, &adjacency));

    // Holes
    let boundary = detect_holes(mesh, &adjacency);
    issues.extend(boundary.hole_issues());
    issues.extend(boundary.complex_issues());

    // Normals
    check_normals(mesh, &adjacency, options, &mut issues, &mut warnings);

    // Degenerate faces
    issues.extend(degenerate_faces(mesh, options.degenerate_area_ratio).into_iter().map(|face| {
        let message = if has_repeated_index(mesh.faces[face]) {
            format!("face {face} repeats a vertex index")
        } else {
            format!("face {face} has negligible area")
        };
        Issue::new(IssueKind::DegenerateFace, message).with_faces(vec![face])
    }));

    // Bookkeeping warnings
    let orphans = unreferenced_vertices(mesh);
    if !orphans.is_empty() {
        warnings.push(
            Issue::new(
                IssueKind::UnreferencedVertices,
                format!("{} vertices are not used by any face", orphans.len()),
            )
            .with_vertices(orphans),
        );
    }

    let duplicates = duplicate_faces(&mesh.faces);
    if !duplicates.is_empty() {
        warnings.push(
            Issue::new(
                IssueKind::DuplicateFaces,
                format!("{} faces repeat an earlier face", duplicates.len()),
            )
            .with_faces(duplicates),
        );
    }

    let stats = Stats::from_adjacency(mesh, &adjacency);
    let report = DiagnosticsReport::new(issues, warnings, stats);

    debug!(
        holes = report.count(IssueKind::Hole),
        degenerate = report.count(IssueKind::DegenerateFace),
        non_manifold_edges = stats.non_manifold_edge_count,
        "Diagnostics details"
    );
    info!(
        vertices = stats.vertex_count,
        faces = stats.face_count,
        issues = report.issues.len(),
        warnings = report.warnings.len(),
        health_score = report.health_score,
        "Diagnosed mesh"
    );

    Ok(report)
}

fn check_normals(
    mesh: &IndexedMesh,
    adjacency: &MeshAdjacency,
    options: &DiagnosticOptions,
    issues: &mut Vec<Issue>,
    warnings: &mut Vec<Warning>,
) {
    if !mesh.has_normals() {
        issues.push(Issue::new(IssueKind::MissingNormals, "Mesh has no normal data"));
        return;
    }

    let inverted: Vec<usize> = mesh
        .faces
        .par_iter()
        .enumerate()
        .filter(|&(_, &face)| is_inverted(mesh, face, options.normal_epsilon))
        .map(|(idx, _)| idx)
        .collect();

    issues.extend(inverted.into_iter().map(|face| {
        Issue::new(
            IssueKind::InvertedNormal,
            format!("face {face} normal opposes its winding"),
        )
        .with_faces(vec![face])
    }));

    let missing: Vec<u32> = mesh
        .vertices
        .iter()
        .enumerate()
        .filter(|(_, v)| v.attributes.normal.is_none())
        .filter_map(|(idx, _)| u32::try_from(idx).ok())
        .filter(|&idx| adjacency.is_referenced(idx))
        .collect();

    if !missing.is_empty() {
        warnings.push(
            Issue::new(
                IssueKind::PartialNormals,
                format!("{} referenced vertices have no normal", missing.len()),
            )
            .with_vertices(missing),
        );
    }
}
