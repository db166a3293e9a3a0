//! Errors for the engine's data-in, report-out surface.

use mesh_repair::{RepairAbort, RepairError};
use mesh_types::MeshDataError;
use thiserror::Error;

/// Result type for [`diagnose`](crate::diagnose) and [`repair`](crate::repair).
pub type EngineResult<T> = Result<T, EngineError>;

/// Why an engine call produced no report.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The input arrays could not form a mesh.
    #[error("invalid mesh data: {0}")]
    Data(#[from] MeshDataError),

    /// Diagnostics rejected the mesh before running any check.
    #[error(transparent)]
    Repair(#[from] RepairError),

    /// A repair run stopped early; carries the partial record.
    #[error(transparent)]
    Aborted(#[from] Box<RepairAbort>),
}

impl EngineError {
    /// Passes that completed before a repair run aborted.
    ///
    /// Empty for errors raised before any pass ran.
    #[must_use]
    pub fn repairs_applied(&self) -> Vec<&'static str> {
        match self {
            Self::Aborted(abort) => abort.repairs_applied(),
            Self::Data(_) | Self::Repair(_) => Vec::new(),
        }
    }

    /// The underlying diagnostics/repair error, if any.
    #[must_use]
    pub fn repair_error(&self) -> Option<&RepairError> {
        match self {
            Self::Repair(err) => Some(err),
            Self::Aborted(abort) => Some(&abort.source),
            Self::Data(_) => None,
        }
    }
}
