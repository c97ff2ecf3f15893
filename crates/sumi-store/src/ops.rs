//! The table-operation vocabulary the materializer emits.
//!
//! A [`TableOp`] is one primitive write against the state tables. The
//! materializer returns a batch of them per event; applying the batch in
//! order is the only way state changes. Patches carry `Option` per field:
//! `None` leaves the column untouched; double-`Option` fields can also set a
//! nullable column back to `NULL`.

use serde_json::Value;

use sumi_types::{CellType, ExecutionState, MimeBundle, QueueStatus, RuntimeStatus};

use crate::rows::{
    ActorRow, CellRow, ExecutionQueueRow, OutputDeltaRow, OutputRow, PendingClearRow, PresenceRow,
    RuntimeSessionRow, ToolApprovalRow, UiStateRow,
};

/// Field patch for a cell row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellPatch {
    pub source: Option<String>,
    pub cell_type: Option<CellType>,
    pub fractional_index: Option<String>,
    pub execution_state: Option<ExecutionState>,
    pub execution_count: Option<u64>,
    pub assigned_runtime_session: Option<String>,
    pub last_execution_duration_ms: Option<u64>,
    pub sql_connection_id: Option<Option<String>>,
    pub sql_result_variable: Option<Option<String>>,
    pub ai_provider: Option<String>,
    pub ai_model: Option<String>,
    pub ai_settings: Option<Value>,
    pub source_visible: Option<bool>,
    pub output_visible: Option<bool>,
    pub ai_context_visible: Option<bool>,
}

impl CellPatch {
    pub(crate) fn apply(self, row: &mut CellRow) {
        if let Some(v) = self.source {
            row.source = v;
        }
        if let Some(v) = self.cell_type {
            row.cell_type = v;
        }
        if let Some(v) = self.fractional_index {
            row.fractional_index = Some(v);
        }
        if let Some(v) = self.execution_state {
            row.execution_state = v;
        }
        if let Some(v) = self.execution_count {
            row.execution_count = Some(v);
        }
        if let Some(v) = self.assigned_runtime_session {
            row.assigned_runtime_session = Some(v);
        }
        if let Some(v) = self.last_execution_duration_ms {
            row.last_execution_duration_ms = Some(v);
        }
        if let Some(v) = self.sql_connection_id {
            row.sql_connection_id = v;
        }
        if let Some(v) = self.sql_result_variable {
            row.sql_result_variable = v;
        }
        if let Some(v) = self.ai_provider {
            row.ai_provider = Some(v);
        }
        if let Some(v) = self.ai_model {
            row.ai_model = Some(v);
        }
        if let Some(v) = self.ai_settings {
            row.ai_settings = Some(v);
        }
        if let Some(v) = self.source_visible {
            row.source_visible = v;
        }
        if let Some(v) = self.output_visible {
            row.output_visible = v;
        }
        if let Some(v) = self.ai_context_visible {
            row.ai_context_visible = v;
        }
    }
}

/// Field patch for an output row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputPatch {
    pub data: Option<Option<String>>,
    pub mime_type: Option<Option<String>>,
    pub artifact_id: Option<Option<String>>,
    pub metadata: Option<Option<Value>>,
    pub representations: Option<MimeBundle>,
}

impl OutputPatch {
    pub(crate) fn apply(self, row: &mut OutputRow) {
        if let Some(v) = self.data {
            row.data = v;
        }
        if let Some(v) = self.mime_type {
            row.mime_type = v;
        }
        if let Some(v) = self.artifact_id {
            row.artifact_id = v;
        }
        if let Some(v) = self.metadata {
            row.metadata = v;
        }
        if let Some(v) = self.representations {
            row.representations = Some(v);
        }
    }
}

/// Field patch for a runtime session row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeSessionPatch {
    pub status: Option<RuntimeStatus>,
    pub is_active: Option<bool>,
}

impl RuntimeSessionPatch {
    pub(crate) fn apply(self, row: &mut RuntimeSessionRow) {
        if let Some(v) = self.status {
            row.status = v;
        }
        if let Some(v) = self.is_active {
            row.is_active = v;
        }
    }
}

/// Field patch for an execution queue row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueuePatch {
    pub status: Option<QueueStatus>,
    pub assigned_runtime_session: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub execution_duration_ms: Option<u64>,
}

impl QueuePatch {
    pub(crate) fn apply(self, row: &mut ExecutionQueueRow) {
        if let Some(v) = self.status {
            row.status = v;
        }
        if let Some(v) = self.assigned_runtime_session {
            row.assigned_runtime_session = Some(v);
        }
        if let Some(v) = self.started_at {
            row.started_at = Some(v);
        }
        if let Some(v) = self.completed_at {
            row.completed_at = Some(v);
        }
        if let Some(v) = self.execution_duration_ms {
            row.execution_duration_ms = Some(v);
        }
    }
}

/// One primitive write against the state tables.
#[derive(Clone, Debug, PartialEq)]
pub enum TableOp {
    /// Insert a cell, keeping the existing row on id conflict (creation
    /// events may be replayed or race).
    InsertCell(CellRow),
    /// Patch a cell's columns.
    PatchCell { id: String, patch: CellPatch },
    /// Delete a cell. Outputs are *not* cascaded; external policy owns
    /// orphan collection.
    DeleteCell { id: String },

    /// Insert an output row.
    InsertOutput(OutputRow),
    /// Patch an output's columns.
    PatchOutput { id: String, patch: OutputPatch },
    /// Delete every output belonging to a cell.
    DeleteOutputsForCell { cell_id: String },

    /// Insert a streaming delta, ignored when `(output_id, sequence_number)`
    /// is already present (redelivery).
    InsertOutputDelta(OutputDeltaRow),

    /// Set (or replace) the pending clear for a cell.
    UpsertPendingClear(PendingClearRow),
    /// Consume a cell's pending clear.
    DeletePendingClear { cell_id: String },

    /// Insert or replace a runtime session.
    UpsertRuntimeSession(RuntimeSessionRow),
    /// Patch a runtime session's columns.
    PatchRuntimeSession {
        session_id: String,
        patch: RuntimeSessionPatch,
    },

    /// Insert or replace an execution queue entry.
    UpsertQueueEntry(ExecutionQueueRow),
    /// Patch a queue entry's columns.
    PatchQueueEntry { id: String, patch: QueuePatch },

    /// Replace a user's presence.
    UpsertPresence(PresenceRow),
    /// Insert or replace an actor profile.
    UpsertActor(ActorRow),
    /// Insert or replace a tool approval.
    UpsertToolApproval(ToolApprovalRow),
    /// Set a notebook metadata key.
    UpsertMetadata { key: String, value: Value },
    /// Insert or replace a UI state entry.
    UpsertUiState(UiStateRow),
}
