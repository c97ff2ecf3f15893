//! Cell ordering operations.
//!
//! The writer-side layer between the raw index algebra and the event log.
//! Two jobs:
//!
//! - **Placement**: `create_cell_between` / `move_cell_between` resolve
//!   neighbour references into index bounds, mint a fresh index, and return
//!   the event batch a writer appends to the log. They never touch state:
//!   callers supply the current cell list and append the returned events.
//! - **Rebalancing**: when a gap is exhausted (adjacent indices such as
//!   `"m"` / `"m0"`), [`rebalance`] reassigns the whole range to fresh
//!   evenly-spread indices with buffer headroom at both ends, and
//!   [`between_with_fallback`] folds that recovery into a single placement
//!   call. Relative cell order is preserved by construction and re-checked
//!   before the plan is released.
//!
//! Everything here is deterministic under an injected [`JitterSource`].

mod cells;
mod error;
mod rebalance;

pub use cells::{
    create_cell_between, move_cell_between, move_cell_between_with_rebalancing, CellCreation,
    CellMove, NewCell,
};
pub use error::PlanError;
pub use rebalance::{
    between_with_fallback, needs_rebalancing, rebalance, FallbackContext, Placement,
    RebalanceOptions, RebalancePlan, DEFAULT_BUFFER_CELLS,
};

/// Result type for ordering operations.
pub type Result<T> = std::result::Result<T, PlanError>;
