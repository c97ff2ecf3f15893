//! Shared vocabulary types for sumi.
//!
//! This crate is the relational foundation: cell and output classification,
//! runtime session and execution queue states, representation containers.
//! It has **no internal sumi dependencies**: a pure leaf crate that other
//! crates build on.
//!
//! # Entity-Relationship Overview
//!
//! ```text
//! Notebook (event log) ← the source of truth
//!     └── contains Cell (ordered by fractional index, id tiebreak)
//!     └── runs RuntimeSession (at most one active outside handoff)
//!
//! Cell
//!     └── classified by CellType (code, markdown, sql, raw, ai)
//!     └── tracks ExecutionState (idle → queued → running → …)
//!     └── owns Output (ordered by position)
//!
//! Output
//!     └── classified by OutputType
//!     └── carries Representation bundle (MIME type → inline | artifact)
//! ```
//!
//! Ids are opaque strings on the wire: the event log is JSON and clients in
//! other languages mint their own identifiers. Nothing here assumes UUIDs.

pub mod actor;
pub mod cell;
pub mod output;
pub mod runtime;

pub use actor::{ActorType, ApprovalStatus};
pub use cell::{document_order, CellReference, CellType, ExecutionState};
pub use output::{MimeBundle, OutputType, Representation};
pub use runtime::{ExecutionOutcome, QueueStatus, RuntimeStatus};
