//! Error types for ordering operations.

use thiserror::Error;

use sumi_index::IndexError;

/// Errors raised by cell placement and rebalance planning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The underlying algebra failed and no rebalance context was available
    /// (or the failure was not the recoverable kind).
    #[error(transparent)]
    Index(#[from] IndexError),
}
