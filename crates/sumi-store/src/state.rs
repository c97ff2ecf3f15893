//! The state tables and op application.

use std::collections::BTreeMap;

use serde_json::Value;

use sumi_events::Event;

use crate::materialize::materialize;
use crate::ops::TableOp;
use crate::rows::{
    ActorRow, CellRow, ExecutionQueueRow, OutputDeltaRow, OutputRow, PendingClearRow, PresenceRow,
    RuntimeSessionRow, ToolApprovalRow, UiStateRow,
};

/// The relational projection of a notebook's event log.
///
/// Every table is keyed on its primary key; deltas key on
/// `(output_id, sequence_number)` so per-output streams iterate in order for
/// free, and UI state keys on `(user_id, key)`.
///
/// State is only ever changed by [`State::apply`]; the same event sequence
/// replayed on a fresh state produces an identical value, regardless of how
/// the sequence was batched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    pub(crate) cells: BTreeMap<String, CellRow>,
    pub(crate) outputs: BTreeMap<String, OutputRow>,
    pub(crate) output_deltas: BTreeMap<(String, u64), OutputDeltaRow>,
    pub(crate) pending_clears: BTreeMap<String, PendingClearRow>,
    pub(crate) runtime_sessions: BTreeMap<String, RuntimeSessionRow>,
    pub(crate) execution_queue: BTreeMap<String, ExecutionQueueRow>,
    pub(crate) presence: BTreeMap<String, PresenceRow>,
    pub(crate) actors: BTreeMap<String, ActorRow>,
    pub(crate) tool_approvals: BTreeMap<String, ToolApprovalRow>,
    pub(crate) metadata: BTreeMap<String, Value>,
    pub(crate) ui_state: BTreeMap<(String, String), UiStateRow>,
}

impl State {
    /// Fresh empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce one event and apply the resulting ops.
    pub fn ingest(&mut self, event: &Event) {
        for op in materialize(self, event) {
            self.apply(op);
        }
    }

    /// Ingest a batch in order.
    pub fn ingest_all<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) {
        for event in events {
            self.ingest(event);
        }
    }

    /// Rebuild state from scratch by replaying a log.
    pub fn replay<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut state = Self::new();
        state.ingest_all(events);
        state
    }

    /// Apply one table operation.
    pub fn apply(&mut self, op: TableOp) {
        match op {
            TableOp::InsertCell(row) => {
                self.cells.entry(row.id.clone()).or_insert(row);
            }
            TableOp::PatchCell { id, patch } => {
                if let Some(row) = self.cells.get_mut(&id) {
                    patch.apply(row);
                }
            }
            TableOp::DeleteCell { id } => {
                self.cells.remove(&id);
            }

            TableOp::InsertOutput(row) => {
                self.outputs.insert(row.id.clone(), row);
            }
            TableOp::PatchOutput { id, patch } => {
                if let Some(row) = self.outputs.get_mut(&id) {
                    patch.apply(row);
                }
            }
            TableOp::DeleteOutputsForCell { cell_id } => {
                self.outputs.retain(|_, row| row.cell_id != cell_id);
                let outputs = &self.outputs;
                self.output_deltas
                    .retain(|_, delta| outputs.contains_key(&delta.output_id));
            }

            TableOp::InsertOutputDelta(row) => {
                self.output_deltas
                    .entry((row.output_id.clone(), row.sequence_number))
                    .or_insert(row);
            }

            TableOp::UpsertPendingClear(row) => {
                self.pending_clears.insert(row.cell_id.clone(), row);
            }
            TableOp::DeletePendingClear { cell_id } => {
                self.pending_clears.remove(&cell_id);
            }

            TableOp::UpsertRuntimeSession(row) => {
                self.runtime_sessions.insert(row.session_id.clone(), row);
            }
            TableOp::PatchRuntimeSession { session_id, patch } => {
                if let Some(row) = self.runtime_sessions.get_mut(&session_id) {
                    patch.apply(row);
                }
            }

            TableOp::UpsertQueueEntry(row) => {
                self.execution_queue.insert(row.id.clone(), row);
            }
            TableOp::PatchQueueEntry { id, patch } => {
                if let Some(row) = self.execution_queue.get_mut(&id) {
                    patch.apply(row);
                }
            }

            TableOp::UpsertPresence(row) => {
                self.presence.insert(row.user_id.clone(), row);
            }
            TableOp::UpsertActor(row) => {
                self.actors.insert(row.id.clone(), row);
            }
            TableOp::UpsertToolApproval(row) => {
                self.tool_approvals.insert(row.tool_call_id.clone(), row);
            }
            TableOp::UpsertMetadata { key, value } => {
                self.metadata.insert(key, value);
            }
            TableOp::UpsertUiState(row) => {
                self.ui_state
                    .insert((row.user_id.clone(), row.key.clone()), row);
            }
        }
    }

    // ── Row accessors ───────────────────────────────────────────────────

    /// Look up a cell by id.
    pub fn cell(&self, id: &str) -> Option<&CellRow> {
        self.cells.get(id)
    }

    /// Look up an output by id.
    pub fn output(&self, id: &str) -> Option<&OutputRow> {
        self.outputs.get(id)
    }

    /// Look up the pending clear for a cell.
    pub fn pending_clear(&self, cell_id: &str) -> Option<&PendingClearRow> {
        self.pending_clears.get(cell_id)
    }

    /// Look up an execution queue entry by id.
    pub fn queue_entry(&self, id: &str) -> Option<&ExecutionQueueRow> {
        self.execution_queue.get(id)
    }

    /// Look up a runtime session by id.
    pub fn runtime_session(&self, session_id: &str) -> Option<&RuntimeSessionRow> {
        self.runtime_sessions.get(session_id)
    }

    /// Look up an actor profile by id.
    pub fn actor(&self, id: &str) -> Option<&ActorRow> {
        self.actors.get(id)
    }

    /// Look up a user's presence.
    pub fn presence_for(&self, user_id: &str) -> Option<&PresenceRow> {
        self.presence.get(user_id)
    }

    /// Look up a tool approval by tool call id.
    pub fn tool_approval(&self, tool_call_id: &str) -> Option<&ToolApprovalRow> {
        self.tool_approvals.get(tool_call_id)
    }

    /// Look up a metadata value.
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Look up a UI state entry.
    pub fn ui_state_entry(&self, user_id: &str, key: &str) -> Option<&UiStateRow> {
        self.ui_state
            .get(&(user_id.to_string(), key.to_string()))
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of outputs.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::CellPatch;
    use sumi_types::CellType;

    #[test]
    fn test_insert_cell_ignores_conflict() {
        let mut state = State::new();
        let mut first = CellRow::new("c1", CellType::Code, "amy");
        first.source = "original".into();
        state.apply(TableOp::InsertCell(first.clone()));

        let second = CellRow::new("c1", CellType::Markdown, "bob");
        state.apply(TableOp::InsertCell(second));

        assert_eq!(state.cell("c1"), Some(&first));
    }

    #[test]
    fn test_patch_missing_cell_is_noop() {
        let mut state = State::new();
        state.apply(TableOp::PatchCell {
            id: "ghost".into(),
            patch: CellPatch {
                source: Some("boo".into()),
                ..Default::default()
            },
        });
        assert_eq!(state.cell_count(), 0);
    }

    #[test]
    fn test_delta_insert_dedupes_on_key() {
        let mut state = State::new();
        let delta = OutputDeltaRow {
            id: "d1".into(),
            output_id: "o1".into(),
            delta: "first".into(),
            sequence_number: 1,
        };
        state.apply(TableOp::InsertOutputDelta(delta.clone()));
        state.apply(TableOp::InsertOutputDelta(OutputDeltaRow {
            id: "d2".into(),
            delta: "redelivered".into(),
            ..delta.clone()
        }));
        assert_eq!(state.output_deltas.len(), 1);
        assert_eq!(
            state.output_deltas[&("o1".to_string(), 1)].delta,
            "first"
        );
    }

    #[test]
    fn test_delete_outputs_for_cell_drops_deltas() {
        let mut state = State::new();
        state.apply(TableOp::InsertOutput(OutputRow::new(
            "o1",
            "c1",
            sumi_types::OutputType::Terminal,
            0.0,
        )));
        state.apply(TableOp::InsertOutputDelta(OutputDeltaRow {
            id: "d1".into(),
            output_id: "o1".into(),
            delta: "x".into(),
            sequence_number: 1,
        }));
        state.apply(TableOp::DeleteOutputsForCell {
            cell_id: "c1".into(),
        });
        assert_eq!(state.output_count(), 0);
        assert!(state.output_deltas.is_empty());
    }
}
