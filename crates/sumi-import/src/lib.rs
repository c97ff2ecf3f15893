//! Jupyter notebook import.
//!
//! Converts an nbformat-4 JSON document into the event sequence that, fed
//! through the materializer, reproduces the notebook: an importer actor
//! profile, title and kernelspec metadata, then one `v2.CellCreated` +
//! `v1.CellSourceChanged` pair per cell (placed via `create_cell_between`,
//! so any rebalance moves ride along in the batch), and the cell's outputs
//! re-expressed as output-add events.
//!
//! The importer is the one writer in the workspace that mints ids: fresh
//! UUIDs for the actor, cells, and outputs.

mod import;
mod nbformat;

pub use import::{import_json, import_notebook, ImportOptions, ImportResult};
pub use nbformat::{
    KernelSpec, Notebook, NotebookCell, NotebookMetadata, NotebookOutput, SourceText,
};

use thiserror::Error;

/// Errors raised while importing a notebook.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The payload was not valid notebook JSON.
    #[error("notebook JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// The notebook declares a major format this importer does not speak.
    #[error("unsupported nbformat {0} (expected 4)")]
    UnsupportedFormat(u32),

    /// Cell placement failed even with the rebalance fallback.
    #[error(transparent)]
    Plan(#[from] sumi_ops::PlanError),
}

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;
