//! Error types for the index algebra.

use thiserror::Error;

/// Errors raised by the fractional index algebra.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// No index exists strictly between the two bounds. Recoverable: callers
    /// holding a cell list rebalance and retry.
    #[error("no index exists strictly between '{lower}' and '{upper}'")]
    EmptyInterval { lower: String, upper: String },

    /// Lower bound does not sort before the upper bound. A programming error
    /// at the call site; not caught by the rebalance fallback on its own.
    #[error("invalid range: '{lower}' must sort strictly before '{upper}'")]
    InvalidRange { lower: String, upper: String },

    /// Input contained a character outside `0..9a..z`.
    #[error("character '{0}' is not in the base-36 index alphabet")]
    InvalidCharacter(char),

    /// A rebalance produced indices that are not strictly increasing.
    /// Indicates a planner bug; surfaced loudly, never swallowed.
    #[error("index ordering violated after reassignment at position {position}")]
    OrderViolation { position: usize },
}
