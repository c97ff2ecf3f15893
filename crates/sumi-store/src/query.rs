//! Parameterized queries over the state tables.
//!
//! Each query is a descriptor: a small struct implementing [`Query`] whose
//! `key()` is a stable memo key (same parameters → same key, so callers can
//! cache results against it and invalidate per table) and whose `run()`
//! projects the tables. Cell order everywhere is fractional index ascending,
//! id ascending on ties, unindexed cells last.

use serde_json::Value;

use sumi_types::CellReference;

use crate::rows::{CellRow, ExecutionQueueRow, OutputDeltaRow, OutputRow, RuntimeSessionRow};
use crate::state::State;

/// A memoizable query descriptor.
pub trait Query {
    type Row;

    /// Stable cache key for this query + parameters.
    fn key(&self) -> String;

    /// Project the state tables.
    fn run(&self, state: &State) -> Vec<Self::Row>;
}

fn reference(row: &CellRow) -> CellReference {
    CellReference {
        id: row.id.clone(),
        cell_type: row.cell_type,
        fractional_index: row.fractional_index.clone(),
    }
}

/// Cells in document order.
fn ordered_cells(state: &State) -> Vec<&CellRow> {
    let mut rows: Vec<&CellRow> = state.cells.values().collect();
    rows.sort_by(|a, b| match (&a.fractional_index, &b.fractional_index) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
    rows
}

/// All cells as ordering references.
pub struct CellReferences;

impl Query for CellReferences {
    type Row = CellReference;

    fn key(&self) -> String {
        "cells/references".into()
    }

    fn run(&self, state: &State) -> Vec<CellReference> {
        ordered_cells(state).into_iter().map(reference).collect()
    }
}

/// Minimal `(id, fractional_index)` ordering projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellOrder {
    pub id: String,
    pub fractional_index: Option<String>,
}

/// The bare cell ordering.
pub struct CellOrdering;

impl Query for CellOrdering {
    type Row = CellOrder;

    fn key(&self) -> String {
        "cells/ordering".into()
    }

    fn run(&self, state: &State) -> Vec<CellOrder> {
        ordered_cells(state)
            .into_iter()
            .map(|row| CellOrder {
                id: row.id.clone(),
                fractional_index: row.fractional_index.clone(),
            })
            .collect()
    }
}

/// First cell in document order (at most one row).
pub struct FirstCell;

impl Query for FirstCell {
    type Row = CellReference;

    fn key(&self) -> String {
        "cells/first".into()
    }

    fn run(&self, state: &State) -> Vec<CellReference> {
        ordered_cells(state)
            .into_iter()
            .take(1)
            .map(reference)
            .collect()
    }
}

/// Last cell in document order (at most one row).
pub struct LastCell;

impl Query for LastCell {
    type Row = CellReference;

    fn key(&self) -> String {
        "cells/last".into()
    }

    fn run(&self, state: &State) -> Vec<CellReference> {
        let ordered = ordered_cells(state);
        ordered.into_iter().rev().take(1).map(reference).collect()
    }
}

/// Cells strictly before an index, nearest first.
pub struct CellsBefore {
    pub index: String,
    pub limit: usize,
}

impl Query for CellsBefore {
    type Row = CellReference;

    fn key(&self) -> String {
        format!("cells/before/{}/{}", self.index, self.limit)
    }

    fn run(&self, state: &State) -> Vec<CellReference> {
        ordered_cells(state)
            .into_iter()
            .filter(|row| {
                row.fractional_index
                    .as_deref()
                    .is_some_and(|idx| idx < self.index.as_str())
            })
            .rev()
            .take(self.limit)
            .map(reference)
            .collect()
    }
}

/// Cells strictly after an index, nearest first.
pub struct CellsAfter {
    pub index: String,
    pub limit: usize,
}

impl Query for CellsAfter {
    type Row = CellReference;

    fn key(&self) -> String {
        format!("cells/after/{}/{}", self.index, self.limit)
    }

    fn run(&self, state: &State) -> Vec<CellReference> {
        ordered_cells(state)
            .into_iter()
            .filter(|row| {
                row.fractional_index
                    .as_deref()
                    .is_some_and(|idx| idx > self.index.as_str())
            })
            .take(self.limit)
            .map(reference)
            .collect()
    }
}

/// Cells within an inclusive index range; open bounds when `None`.
pub struct CellsInRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl Query for CellsInRange {
    type Row = CellReference;

    fn key(&self) -> String {
        format!(
            "cells/range/{}..{}",
            self.start.as_deref().unwrap_or(""),
            self.end.as_deref().unwrap_or("")
        )
    }

    fn run(&self, state: &State) -> Vec<CellReference> {
        ordered_cells(state)
            .into_iter()
            .filter(|row| {
                let Some(idx) = row.fractional_index.as_deref() else {
                    return false;
                };
                let above = self.start.as_deref().map_or(true, |s| idx >= s);
                let below = self.end.as_deref().map_or(true, |e| idx <= e);
                above && below
            })
            .map(reference)
            .collect()
    }
}

/// The immediate neighbours of a cell.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AdjacentCells {
    pub before: Option<CellReference>,
    pub after: Option<CellReference>,
}

/// Neighbours of `cell_id` at `index`: composes [`CellsBefore`] and
/// [`CellsAfter`] with limit 1. Cells sharing the exact index are excluded
/// by the strict comparisons (the documented duplicate-index tolerance).
pub fn adjacent_cells(state: &State, cell_id: &str, index: &str) -> AdjacentCells {
    let mut before = CellsBefore {
        index: index.to_string(),
        limit: 2,
    }
    .run(state);
    let mut after = CellsAfter {
        index: index.to_string(),
        limit: 2,
    }
    .run(state);
    before.retain(|c| c.id != cell_id);
    after.retain(|c| c.id != cell_id);
    AdjacentCells {
        before: before.into_iter().next(),
        after: after.into_iter().next(),
    }
}

/// Outputs of a cell, position ascending.
pub struct OutputsForCell {
    pub cell_id: String,
}

impl Query for OutputsForCell {
    type Row = OutputRow;

    fn key(&self) -> String {
        format!("outputs/cell/{}", self.cell_id)
    }

    fn run(&self, state: &State) -> Vec<OutputRow> {
        let mut rows: Vec<OutputRow> = state
            .outputs
            .values()
            .filter(|row| row.cell_id == self.cell_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.position
                .partial_cmp(&b.position)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        rows
    }
}

/// Streaming deltas of an output, sequence ascending.
pub struct OutputDeltasForOutput {
    pub output_id: String,
}

impl Query for OutputDeltasForOutput {
    type Row = OutputDeltaRow;

    fn key(&self) -> String {
        format!("output_deltas/{}", self.output_id)
    }

    fn run(&self, state: &State) -> Vec<OutputDeltaRow> {
        // Deltas key on (output_id, sequence_number): the range scan is
        // already sequence-ordered.
        state
            .output_deltas
            .range((self.output_id.clone(), 0)..=(self.output_id.clone(), u64::MAX))
            .map(|(_, row)| row.clone())
            .collect()
    }
}

/// Queue entries of a cell, id descending (newest requests first under
/// time-ordered ids).
pub struct ExecutionQueueForCell {
    pub cell_id: String,
}

impl Query for ExecutionQueueForCell {
    type Row = ExecutionQueueRow;

    fn key(&self) -> String {
        format!("queue/cell/{}", self.cell_id)
    }

    fn run(&self, state: &State) -> Vec<ExecutionQueueRow> {
        let mut rows: Vec<ExecutionQueueRow> = state
            .execution_queue
            .values()
            .filter(|row| row.cell_id == self.cell_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows
    }
}

/// All runtime sessions, session id descending.
pub struct RuntimeSessions;

impl Query for RuntimeSessions {
    type Row = RuntimeSessionRow;

    fn key(&self) -> String {
        "runtime_sessions".into()
    }

    fn run(&self, state: &State) -> Vec<RuntimeSessionRow> {
        let mut rows: Vec<RuntimeSessionRow> =
            state.runtime_sessions.values().cloned().collect();
        rows.sort_by(|a, b| b.session_id.cmp(&a.session_id));
        rows
    }
}

/// All notebook metadata as key/value pairs.
pub struct NotebookMetadata;

impl Query for NotebookMetadata {
    type Row = (String, Value);

    fn key(&self) -> String {
        "metadata".into()
    }

    fn run(&self, state: &State) -> Vec<(String, Value)> {
        state
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// The canonical metadata fields with their schema defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotebookMeta {
    pub title: String,
    pub owner_id: String,
    pub runtime_type: String,
    pub is_public: bool,
}

/// Read the canonical metadata fields, falling back to defaults.
pub fn canonical_metadata(state: &State) -> NotebookMeta {
    let text = |key: &str, default: &str| -> String {
        state
            .metadata_value(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    NotebookMeta {
        title: text("title", "Untitled"),
        owner_id: text("ownerId", "anonymous"),
        runtime_type: text("runtimeType", "python3"),
        is_public: state
            .metadata_value("isPublic")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

/// Fold a streaming output back together: original data, then deltas in
/// sequence order.
pub fn apply_deltas(original: Option<&str>, deltas: &[OutputDeltaRow]) -> String {
    let mut sorted: Vec<&OutputDeltaRow> = deltas.iter().collect();
    sorted.sort_by_key(|d| d.sequence_number);
    let mut content = original.unwrap_or_default().to_string();
    for delta in sorted {
        content.push_str(&delta.delta);
    }
    content
}

// ============================================================================
// Tests
// ============================================================================
