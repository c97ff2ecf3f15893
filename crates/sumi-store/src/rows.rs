//! Table row types.
//!
//! These are the raw table shapes the materializer writes: deterministic
//! projections of the event log, rebuildable from scratch by replay.
//! Defaults mirror the persisted schema: new cells are visible and idle,
//! new runtime sessions are active python3, new queue entries are pending.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sumi_types::{
    ActorType, ApprovalStatus, CellType, ExecutionState, MimeBundle, OutputType, QueueStatus,
    RuntimeStatus,
};

/// A notebook cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRow {
    pub id: String,
    pub cell_type: CellType,
    pub source: String,
    pub fractional_index: Option<String>,
    pub execution_count: Option<u64>,
    pub execution_state: ExecutionState,
    pub assigned_runtime_session: Option<String>,
    pub last_execution_duration_ms: Option<u64>,
    pub sql_connection_id: Option<String>,
    pub sql_result_variable: Option<String>,
    pub ai_provider: Option<String>,
    pub ai_model: Option<String>,
    pub ai_settings: Option<Value>,
    pub source_visible: bool,
    pub output_visible: bool,
    pub ai_context_visible: bool,
    pub created_by: String,
}

impl CellRow {
    /// Fresh cell with schema defaults: empty source, idle, all visible.
    pub fn new(id: impl Into<String>, cell_type: CellType, created_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cell_type,
            source: String::new(),
            fractional_index: None,
            execution_count: None,
            execution_state: ExecutionState::Idle,
            assigned_runtime_session: None,
            last_execution_duration_ms: None,
            sql_connection_id: None,
            sql_result_variable: None,
            ai_provider: None,
            ai_model: None,
            ai_settings: None,
            source_visible: true,
            output_visible: true,
            ai_context_visible: true,
            created_by: created_by.into(),
        }
    }
}

/// A cell output.
///
/// `data` / `mime_type` / `artifact_id` are the denormalized primary
/// representation; the full bundle (when the output is multimedia) lives in
/// `representations`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRow {
    pub id: String,
    pub cell_id: String,
    pub output_type: OutputType,
    pub position: f64,
    pub stream_name: Option<String>,
    pub execution_count: Option<u64>,
    pub display_id: Option<String>,
    pub data: Option<String>,
    pub artifact_id: Option<String>,
    pub mime_type: Option<String>,
    pub metadata: Option<Value>,
    pub representations: Option<MimeBundle>,
}

impl OutputRow {
    /// Fresh output with everything optional unset.
    pub fn new(
        id: impl Into<String>,
        cell_id: impl Into<String>,
        output_type: OutputType,
        position: f64,
    ) -> Self {
        Self {
            id: id.into(),
            cell_id: cell_id.into(),
            output_type,
            position,
            stream_name: None,
            execution_count: None,
            display_id: None,
            data: None,
            artifact_id: None,
            mime_type: None,
            metadata: None,
            representations: None,
        }
    }
}

/// An append-only streaming delta for an output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDeltaRow {
    pub id: String,
    pub output_id: String,
    pub delta: String,
    pub sequence_number: u64,
}

/// Deferred `clear_output(wait=True)` marker, at most one per cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingClearRow {
    pub cell_id: String,
    pub cleared_by: String,
}

/// A runtime session attached to the notebook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSessionRow {
    pub session_id: String,
    pub runtime_id: String,
    pub runtime_type: String,
    pub status: RuntimeStatus,
    pub is_active: bool,
    pub can_execute_code: bool,
    pub can_execute_sql: bool,
    pub can_execute_ai: bool,
    pub available_ai_models: Option<Value>,
}

/// An entry in the execution queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionQueueRow {
    pub id: String,
    pub cell_id: String,
    pub execution_count: u64,
    pub requested_by: String,
    pub status: QueueStatus,
    pub assigned_runtime_session: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub execution_duration_ms: Option<u64>,
}

impl ExecutionQueueRow {
    /// Fresh pending entry.
    pub fn pending(
        id: impl Into<String>,
        cell_id: impl Into<String>,
        execution_count: u64,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            cell_id: cell_id.into(),
            execution_count,
            requested_by: requested_by.into(),
            status: QueueStatus::Pending,
            assigned_runtime_session: None,
            started_at: None,
            completed_at: None,
            execution_duration_ms: None,
        }
    }
}

/// Where a user last acted. Replaced wholesale on every write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRow {
    pub user_id: String,
    pub cell_id: Option<String>,
}

/// A notebook actor's profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRow {
    pub id: String,
    pub actor_type: ActorType,
    pub display_name: String,
    pub avatar: Option<String>,
}

/// A tool approval request and its (eventual) response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolApprovalRow {
    pub tool_call_id: String,
    pub cell_id: String,
    pub tool_name: String,
    pub arguments: Option<Value>,
    pub requested_by: Option<String>,
    pub status: ApprovalStatus,
    pub responded_by: Option<String>,
}

/// Per-user UI state entry, keyed `(user_id, key)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiStateRow {
    pub user_id: String,
    pub key: String,
    pub value: Value,
}

// ============================================================================
// Tests
// ============================================================================
