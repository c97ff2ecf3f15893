//! Versioned notebook event catalog.
//!
//! Every mutation of a notebook travels as an event record with a
//! version-tagged `name` and a typed `args` object:
//!
//! ```json
//! {"name": "v2.CellCreated", "args": {"id": "c1", "fractionalIndex": "m", ...}}
//! ```
//!
//! The contract: events are append-only, immutable, and replay-safe. A
//! versioned name is never mutated: behavior changes get a *new* version and
//! the old one stays in the catalog so historical logs remain replayable.
//! Deprecated variants (`v1.CellCreated` with its positional index,
//! `v1.TerminalOutputAppended` with its concatenating semantics,
//! `v1.NotebookInitialized`) are kept for exactly that reason; new writers
//! must not emit them.
//!
//! The [`Event`] enum is the single dispatch point downstream: the
//! materializer matches on it exhaustively, so adding a variant without
//! handling it is a compile error.

mod event;

pub use event::Event;
