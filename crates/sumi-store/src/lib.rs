//! Deterministic event materialization and the notebook query surface.
//!
//! # Architecture
//!
//! ```text
//! event log ──▶ materialize(state, event) ──▶ [TableOp] ──▶ State::apply
//!                      (pure reducer)                          (tables)
//!                                                                 │
//!                                        queries ◀────────────────┘
//! ```
//!
//! [`materialize`] is a pure function: it reads the current [`State`] through
//! an immutable handle and returns the table operations the event implies.
//! The state is the fold of those operations and nothing else mutates it, so
//! any replica replaying the same log arrives at byte-identical tables, and
//! the whole projection can be rebuilt from scratch at any time
//! ([`State::replay`]).
//!
//! Two protocols deserve a pointer:
//!
//! - **Pending clears** (`CellOutputsCleared{wait: true}`) park a marker on
//!   the cell; the next output-add deletes the cell's outputs, consumes the
//!   marker, then inserts. Until that output arrives the old outputs stay
//!   visible, matching `clear_output(wait=True)`.
//! - **Display ids**: a display output add or update patches every existing
//!   display output sharing the id, so `display(..., display_id=...)`
//!   re-renders everywhere it appeared.

mod materialize;
mod ops;
mod primary;
pub mod query;
mod rows;
mod state;

pub use materialize::materialize;
pub use ops::{CellPatch, OutputPatch, QueuePatch, RuntimeSessionPatch, TableOp};
pub use primary::{
    coerce_to_string, select_primary, PrimaryRepresentation, DISPLAY_PRIORITY, RESULT_PRIORITY,
};
pub use query::{
    adjacent_cells, apply_deltas, canonical_metadata, AdjacentCells, CellOrder, CellOrdering,
    CellReferences, CellsAfter, CellsBefore, CellsInRange, ExecutionQueueForCell, FirstCell,
    LastCell, NotebookMeta, NotebookMetadata, OutputDeltasForOutput, OutputsForCell, Query,
    RuntimeSessions,
};
pub use rows::{
    ActorRow, CellRow, ExecutionQueueRow, OutputDeltaRow, OutputRow, PendingClearRow, PresenceRow,
    RuntimeSessionRow, ToolApprovalRow, UiStateRow,
};
pub use state::State;
