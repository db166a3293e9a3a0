//! Diagnostic issues and warnings.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How serious a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Severity {
    /// Cosmetic or easily repaired.
    Low,
    /// Likely to affect downstream processing.
    Medium,
    /// Breaks topological assumptions.
    High,
}

impl Severity {
    /// Lowercase name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a reported problem.
///
/// Declaration order is the report order: issue lists are sorted by kind
/// first, then by the first affected index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IssueKind {
    /// An edge shared by three or more faces.
    NonManifoldEdge,
    /// A vertex whose faces form more than one fan.
    NonManifoldVertex,
    /// A boundary component where some vertex does not have exactly two
    /// boundary neighbours.
    ComplexBoundary,
    /// A closed loop of boundary edges.
    Hole,
    /// A hole that could not be triangulated.
    UnrepairableHole,
    /// No vertex carries a normal.
    MissingNormals,
    /// A face whose stored normal opposes its winding.
    InvertedNormal,
    /// A face with repeated indices or negligible area.
    DegenerateFace,
    /// Vertices referenced by no face.
    UnreferencedVertices,
    /// Normals present on some referenced vertices but not all.
    PartialNormals,
    /// Faces with the same vertex set as an earlier face.
    DuplicateFaces,
}

impl IssueKind {
    /// Stable snake_case identifier used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonManifoldEdge => "non_manifold_edge",
            Self::NonManifoldVertex => "non_manifold_vertex",
            Self::ComplexBoundary => "complex_boundary",
            Self::Hole => "hole",
            Self::UnrepairableHole => "unrepairable_hole",
            Self::MissingNormals => "missing_normals",
            Self::InvertedNormal => "inverted_normal",
            Self::DegenerateFace => "degenerate_face",
            Self::UnreferencedVertices => "unreferenced_vertices",
            Self::PartialNormals => "partial_normals",
            Self::DuplicateFaces => "duplicate_faces",
        }
    }

    /// Default severity for this kind.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::NonManifoldEdge | Self::NonManifoldVertex => Severity::High,
            Self::ComplexBoundary
            | Self::Hole
            | Self::UnrepairableHole
            | Self::MissingNormals
            | Self::DegenerateFace => Severity::Medium,
            Self::InvertedNormal
            | Self::UnreferencedVertices
            | Self::PartialNormals
            | Self::DuplicateFaces => Severity::Low,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported problem.
///
/// `vertices` holds affected vertex indices (for a hole: the ordered loop);
/// `faces` holds affected face indices. Either may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Issue {
    /// What was found.
    pub kind: IssueKind,
    /// How serious it is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Affected vertex indices.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub vertices: Vec<u32>,
    /// Affected face indices.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub faces: Vec<usize>,
}

/// Warnings share the issue shape; they land in a separate, non-blocking list.
pub type Warning = Issue;

impl Issue {
    /// Create an issue with the kind's default severity and no affected elements.
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Attach affected vertex indices.
    #[must_use]
    pub fn with_vertices(mut self, vertices: Vec<u32>) -> Self {
        self.vertices = vertices;
        self
    }

    /// Attach affected face indices.
    #[must_use]
    pub fn with_faces(mut self, faces: Vec<usize>) -> Self {
        self.faces = faces;
        self
    }

    /// First affected index, vertices before faces.
    #[must_use]
    pub fn first_index(&self) -> usize {
        self.vertices
            .first()
            .map(|&v| v as usize)
            .or_else(|| self.faces.first().copied())
            .unwrap_or(0)
    }

    /// Key that gives reports a deterministic order.
    #[must_use]
    pub fn sort_key(&self) -> (IssueKind, usize) {
        (self.kind, self.first_index())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)
    }
}

/// Sort issues by `(kind, first affected index)`, keeping insertion order for ties.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by_key(Issue::sort_key);
}
