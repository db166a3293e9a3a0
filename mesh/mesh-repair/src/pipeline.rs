//! The ordered repair pipeline.
//!
//! [`repair_mesh`] runs the passes named by [`RepairParams`] over a working
//! copy of the input and records a [`PassSummary`] for each. A failing pass
//! aborts the run with a [`RepairAbort`] that carries the mesh as it was
//! before that pass, together with the passes that did complete.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mesh_types::IndexedMesh;
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::diagnose::{Stats, mesh_stats};
use crate::error::{RepairError, RepairResult};
use crate::holes::fill_holes;
use crate::issue::Issue;
use crate::normals::compute_vertex_normals;
use crate::repair::{
    DEFAULT_DEGENERATE_AREA_RATIO, DEFAULT_TOLERANCE, merge_duplicate_vertices,
    remove_degenerate_faces, remove_unreferenced_vertices,
};

/// One named corrective transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RepairPass {
    /// Merge vertices closer than the tolerance.
    RemoveDuplicates,
    /// Drop zero-area and repeated-index faces.
    RemoveDegenerate,
    /// Drop vertices no face references.
    RemoveUnreferenced,
    /// Recompute vertex normals from the geometry.
    FixNormals,
    /// Triangulate simple holes.
    FillHoles,
    /// Recompute vertex normals after hole filling.
    SmoothNormals,
}

impl RepairPass {
    /// Name recorded in the repair log.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RemoveDuplicates => "remove_duplicates",
            Self::RemoveDegenerate => "remove_degenerate",
            Self::RemoveUnreferenced => "remove_unreferenced",
            Self::FixNormals => "fix_normals",
            Self::FillHoles => "fill_holes",
            Self::SmoothNormals => "smooth_normals",
        }
    }
}

impl fmt::Display for RepairPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters for the repair pipeline.
///
/// # Example
///
/// ```
/// use mesh_repair::RepairParams;
///
/// let params = RepairParams::default()
///     .with_tolerance(1e-4)
///     .with_aggressive(true);
/// assert!(params.aggressive);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RepairParams {
    /// Distance at or below which two vertices are merged.
    ///
    /// Default: `1e-6`
    pub tolerance: f64,

    /// Also fill holes and smooth normals afterwards.
    ///
    /// Default: `false`
    pub aggressive: bool,

    /// Compact away vertices no face references, after degenerate removal.
    ///
    /// Default: `false`
    pub remove_unreferenced: bool,

    /// Leave holes with more boundary edges than this open.
    ///
    /// Default: `None` (no limit)
    pub max_hole_edges: Option<usize>,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            aggressive: false,
            remove_unreferenced: false,
            max_hole_edges: None,
        }
    }
}

impl RepairParams {
    /// Default parameters with hole filling and normal smoothing enabled.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            aggressive: true,
            ..Default::default()
        }
    }

    /// Set the merge tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable the aggressive passes.
    #[must_use]
    pub const fn with_aggressive(mut self, aggressive: bool) -> Self {
        self.aggressive = aggressive;
        self
    }

    /// Enable or disable orphan compaction.
    #[must_use]
    pub const fn with_remove_unreferenced(mut self, remove: bool) -> Self {
        self.remove_unreferenced = remove;
        self
    }

    /// Limit the size of holes that get filled.
    #[must_use]
    pub const fn with_max_hole_edges(mut self, max_edges: usize) -> Self {
        self.max_hole_edges = Some(max_edges);
        self
    }

    /// The passes these parameters run, in order.
    #[must_use]
    pub fn passes(&self) -> Vec<RepairPass> {
        let mut passes = vec![RepairPass::RemoveDuplicates, RepairPass::RemoveDegenerate];
        if self.remove_unreferenced {
            passes.push(RepairPass::RemoveUnreferenced);
        }
        passes.push(RepairPass::FixNormals);
        if self.aggressive {
            passes.push(RepairPass::FillHoles);
            passes.push(RepairPass::SmoothNormals);
        }
        passes
    }
}

/// Before/after counts for one completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PassSummary {
    /// Which pass ran.
    pub pass: RepairPass,
    /// Vertex count before the pass.
    pub vertices_before: usize,
    /// Vertex count after the pass.
    pub vertices_after: usize,
    /// Face count before the pass.
    pub faces_before: usize,
    /// Face count after the pass.
    pub faces_after: usize,
}

impl PassSummary {
    /// Whether the pass changed either count.
    #[must_use]
    pub const fn changed_counts(&self) -> bool {
        self.vertices_before != self.vertices_after || self.faces_before != self.faces_after
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: vertices {} -> {}, faces {} -> {}",
            self.pass, self.vertices_before, self.vertices_after, self.faces_before, self.faces_after
        )
    }
}

/// Result of a completed repair run.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// The repaired mesh.
    pub mesh: IndexedMesh,
    /// Every pass that ran, in order.
    pub passes: Vec<PassSummary>,
    /// Stats of the input mesh.
    pub stats_before: Stats,
    /// Stats of the repaired mesh.
    pub stats_after: Stats,
    /// Boundary problems hole filling left in place.
    pub unrepaired: Vec<Issue>,
}

impl RepairOutcome {
    /// Names of the passes that ran, in order.
    #[must_use]
    pub fn repairs_applied(&self) -> Vec<&'static str> {
        self.passes.iter().map(|summary| summary.pass.name()).collect()
    }
}

impl fmt::Display for RepairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repair Summary:")?;
        writeln!(
            f,
            "  Vertices: {} -> {}",
            self.stats_before.vertex_count, self.stats_after.vertex_count
        )?;
        writeln!(
            f,
            "  Faces: {} -> {}",
            self.stats_before.face_count, self.stats_after.face_count
        )?;
        for summary in &self.passes {
            writeln!(f, "  {summary}")?;
        }
        if !self.unrepaired.is_empty() {
            writeln!(f, "  Unrepaired: {}", self.unrepaired.len())?;
        }
        Ok(())
    }
}

/// A repair run that stopped early.
#[derive(Debug, Clone, Error)]
#[error("repair aborted at {}: {source}", .pass.map_or("start", RepairPass::name))]
pub struct RepairAbort {
    /// The pass that failed, or `None` if the input was rejected up front.
    pub pass: Option<RepairPass>,
    /// Why the run stopped.
    pub source: RepairError,
    /// The mesh as it was before the failing pass.
    pub mesh: IndexedMesh,
    /// Passes that completed before the failure.
    pub completed: Vec<PassSummary>,
}

impl RepairAbort {
    /// Names of the passes that completed.
    #[must_use]
    pub fn repairs_applied(&self) -> Vec<&'static str> {
        self.completed.iter().map(|summary| summary.pass.name()).collect()
    }
}

/// Result of [`repair_mesh`].
pub type PipelineResult = Result<RepairOutcome, Box<RepairAbort>>;

/// Cooperative cancellation flag shared between a repair run and its caller.
///
/// Checked before every pass; a pass already underway always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Repair a copy of `mesh`.
///
/// Runs `remove_duplicates`, `remove_degenerate`, optionally
/// `remove_unreferenced`, then `fix_normals`; aggressive parameters add
/// `fill_holes` and `smooth_normals`. Every pass is recorded, including
/// those that change nothing.
///
/// # Errors
///
/// Returns a boxed [`RepairAbort`] when the input has an out-of-range face
/// index, when the tolerance is invalid, or when deduplication collapses
/// the mesh below three non-collinear vertices.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::{RepairParams, repair_mesh};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([0, 0, 0]);
///
/// let outcome = repair_mesh(&mesh, &RepairParams::default()).unwrap();
/// assert_eq!(outcome.stats_after.vertex_count, 3);
/// assert_eq!(outcome.stats_after.face_count, 1);
/// assert_eq!(
///     outcome.repairs_applied(),
///     ["remove_duplicates", "remove_degenerate", "fix_normals"]
/// );
/// ```
pub fn repair_mesh(mesh: &IndexedMesh, params: &RepairParams) -> PipelineResult {
    repair_mesh_with_cancel(mesh, params, &CancelToken::new())
}

/// Repair a copy of `mesh`, checking `cancel` before every pass.
///
/// # Errors
///
/// As [`repair_mesh`], plus [`RepairError::Cancelled`] when the token is
/// set; the abort then carries the mesh as of the last completed pass.
pub fn repair_mesh_with_cancel(
    mesh: &IndexedMesh,
    params: &RepairParams,
    cancel: &CancelToken,
) -> PipelineResult {
    let stats_before = match mesh_stats(mesh) {
        Ok(stats) => stats,
        Err(source) => return Err(abort(None, source, mesh.clone(), Vec::new())),
    };

    // Each pass either fails before touching the mesh or runs to completion,
    // so the working copy is always a consistent post-pass state.
    let mut working = mesh.clone();
    let mut completed = Vec::new();
    let mut unrepaired = Vec::new();

    for pass in params.passes() {
        if cancel.is_cancelled() {
            return Err(abort(Some(pass), RepairError::Cancelled, working, completed));
        }

        let vertices_before = working.vertices.len();
        let faces_before = working.faces.len();

        if let Err(source) = run_pass(pass, &mut working, params, &mut unrepaired) {
            return Err(abort(Some(pass), source, working, completed));
        }

        let summary = PassSummary {
            pass,
            vertices_before,
            vertices_after: working.vertices.len(),
            faces_before,
            faces_after: working.faces.len(),
        };
        debug!(
            pass = pass.name(),
            vertices = summary.vertices_after,
            faces = summary.faces_after,
            "Repair pass complete"
        );
        completed.push(summary);
    }

    let stats_after = match mesh_stats(&working) {
        Ok(stats) => stats,
        Err(source) => return Err(abort(None, source, working, completed)),
    };

    info!(
        passes = completed.len(),
        vertices_before = stats_before.vertex_count,
        vertices_after = stats_after.vertex_count,
        faces_before = stats_before.face_count,
        faces_after = stats_after.face_count,
        unrepaired = unrepaired.len(),
        "Repaired mesh"
    );

    Ok(RepairOutcome {
        mesh: working,
        passes: completed,
        stats_before,
        stats_after,
        unrepaired,
    })
}

fn run_pass(
    pass: RepairPass,
    mesh: &mut IndexedMesh,
    params: &RepairParams,
    unrepaired: &mut Vec<Issue>,
) -> RepairResult<()> {
    match pass {
        RepairPass::RemoveDuplicates => {
            merge_duplicate_vertices(mesh, params.tolerance)?;
        }
        RepairPass::RemoveDegenerate => {
            remove_degenerate_faces(mesh, DEFAULT_DEGENERATE_AREA_RATIO);
        }
        RepairPass::RemoveUnreferenced => {
            remove_unreferenced_vertices(mesh);
        }
        RepairPass::FixNormals | RepairPass::SmoothNormals => compute_vertex_normals(mesh),
        RepairPass::FillHoles => {
            let report = fill_holes(mesh, params.max_hole_edges)?;
            unrepaired.extend(report.unrepaired);
        }
    }
    Ok(())
}

fn abort(
    pass: Option<RepairPass>,
    source: RepairError,
    mesh: IndexedMesh,
    completed: Vec<PassSummary>,
) -> Box<RepairAbort> {
    warn!(
        pass = pass.map_or("start", RepairPass::name),
        completed = completed.len(),
        error = %source,
        "Repair aborted"
    );
    Box::new(RepairAbort {
        pass,
        source,
        mesh,
        completed,
    })
}
