//! The event sum type and its wire envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sumi_types::{
    ActorType, ApprovalStatus, CellType, ExecutionOutcome, MimeBundle, Representation,
    RuntimeStatus,
};

/// Every event the materializer understands, tagged with its versioned wire
/// name. Serializes to the `{name, args}` envelope directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all_fields = "camelCase")]
pub enum Event {
    // ── Notebook metadata ───────────────────────────────────────────────
    /// Legacy bootstrap record. Kept replayable; new writers set metadata
    /// keys individually.
    #[serde(rename = "v1.NotebookInitialized")]
    NotebookInitialized {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner_id: Option<String>,
    },

    #[serde(rename = "v1.NotebookMetadataSet")]
    NotebookMetadataSet { key: String, value: Value },

    #[serde(rename = "v1.NotebookTitleChanged")]
    NotebookTitleChanged { title: String },

    // ── Cells ───────────────────────────────────────────────────────────
    /// Deprecated positional creation. The materializer converts `position`
    /// into a pseudo fractional index; new writers use `v2.CellCreated`.
    #[serde(rename = "v1.CellCreated")]
    CellCreatedV1 {
        id: String,
        position: f64,
        cell_type: CellType,
        created_by: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v2.CellCreated")]
    CellCreatedV2 {
        id: String,
        fractional_index: String,
        cell_type: CellType,
        created_by: String,
    },

    #[serde(rename = "v1.CellSourceChanged")]
    CellSourceChanged {
        id: String,
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v1.CellTypeChanged")]
    CellTypeChanged {
        id: String,
        cell_type: CellType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v1.CellDeleted")]
    CellDeleted {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    /// Deprecated positional move, paired with `v1.CellCreated`.
    #[serde(rename = "v1.CellMoved")]
    CellMovedV1 {
        id: String,
        position: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v2.CellMoved")]
    CellMovedV2 {
        id: String,
        fractional_index: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v1.CellSourceVisibilityToggled")]
    CellSourceVisibilityToggled {
        id: String,
        visible: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v1.CellOutputVisibilityToggled")]
    CellOutputVisibilityToggled {
        id: String,
        visible: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v1.CellAiContextVisibilityToggled")]
    CellAiContextVisibilityToggled {
        id: String,
        visible: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v1.AiSettingsChanged")]
    AiSettingsChanged {
        cell_id: String,
        provider: String,
        model: String,
        settings: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v1.SqlConnectionChanged")]
    SqlConnectionChanged {
        cell_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connection_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    #[serde(rename = "v1.SqlResultVariableChanged")]
    SqlResultVariableChanged {
        cell_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result_variable: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },

    // ── Runtime sessions ────────────────────────────────────────────────
    #[serde(rename = "v1.RuntimeSessionStarted")]
    RuntimeSessionStarted {
        session_id: String,
        runtime_id: String,
        runtime_type: String,
        #[serde(default)]
        can_execute_code: bool,
        #[serde(default)]
        can_execute_sql: bool,
        #[serde(default)]
        can_execute_ai: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        available_ai_models: Option<Value>,
    },

    #[serde(rename = "v1.RuntimeSessionStatusChanged")]
    RuntimeSessionStatusChanged {
        session_id: String,
        status: RuntimeStatus,
    },

    #[serde(rename = "v1.RuntimeSessionTerminated")]
    RuntimeSessionTerminated {
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ── Execution queue ─────────────────────────────────────────────────
    #[serde(rename = "v1.ExecutionRequested")]
    ExecutionRequested {
        queue_id: String,
        cell_id: String,
        execution_count: u64,
        requested_by: String,
    },

    #[serde(rename = "v1.ExecutionAssigned")]
    ExecutionAssigned {
        queue_id: String,
        runtime_session_id: String,
    },

    #[serde(rename = "v1.ExecutionStarted")]
    ExecutionStarted {
        queue_id: String,
        cell_id: String,
        runtime_session_id: String,
        started_at: String,
    },

    #[serde(rename = "v1.ExecutionCompleted")]
    ExecutionCompleted {
        queue_id: String,
        cell_id: String,
        status: ExecutionOutcome,
        completed_at: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        execution_duration_ms: Option<u64>,
    },

    #[serde(rename = "v1.ExecutionCancelled")]
    ExecutionCancelled {
        queue_id: String,
        cell_id: String,
        cancelled_by: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ── Outputs ─────────────────────────────────────────────────────────
    #[serde(rename = "v1.MultimediaDisplayOutputAdded")]
    MultimediaDisplayOutputAdded {
        id: String,
        cell_id: String,
        position: f64,
        representations: MimeBundle,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_id: Option<String>,
    },

    /// In-place re-render of every display output carrying `display_id`.
    /// Never creates a row.
    #[serde(rename = "v1.MultimediaDisplayOutputUpdated")]
    MultimediaDisplayOutputUpdated {
        display_id: String,
        representations: MimeBundle,
    },

    #[serde(rename = "v1.MultimediaResultOutputAdded")]
    MultimediaResultOutputAdded {
        id: String,
        cell_id: String,
        position: f64,
        representations: MimeBundle,
        execution_count: u64,
    },

    #[serde(rename = "v1.TerminalOutputAdded")]
    TerminalOutputAdded {
        id: String,
        cell_id: String,
        position: f64,
        stream_name: String,
        content: Representation,
    },

    /// Deprecated concatenating append: folds the delta straight into the
    /// target output's data. `v2` records deltas separately.
    #[serde(rename = "v1.TerminalOutputAppended")]
    TerminalOutputAppendedV1 { output_id: String, delta: String },

    #[serde(rename = "v2.TerminalOutputAppended")]
    TerminalOutputAppendedV2 {
        id: String,
        output_id: String,
        delta: String,
        sequence_number: u64,
    },

    #[serde(rename = "v1.MarkdownOutputAdded")]
    MarkdownOutputAdded {
        id: String,
        cell_id: String,
        position: f64,
        content: Representation,
    },

    #[serde(rename = "v1.MarkdownOutputAppended")]
    MarkdownOutputAppendedV1 { output_id: String, delta: String },

    #[serde(rename = "v2.MarkdownOutputAppended")]
    MarkdownOutputAppendedV2 {
        id: String,
        output_id: String,
        delta: String,
        sequence_number: u64,
    },

    #[serde(rename = "v1.ErrorOutputAdded")]
    ErrorOutputAdded {
        id: String,
        cell_id: String,
        position: f64,
        content: Representation,
    },

    /// `wait=true` defers the clear until the next output lands in the cell
    /// (ipynb `clear_output(wait=True)`); `wait=false` clears immediately.
    #[serde(rename = "v1.CellOutputsCleared")]
    CellOutputsCleared {
        cell_id: String,
        wait: bool,
        cleared_by: String,
    },

    // ── Actors, approvals, presence ─────────────────────────────────────
    #[serde(rename = "v1.ActorProfileSet")]
    ActorProfileSet {
        id: String,
        #[serde(rename = "type")]
        actor_type: ActorType,
        display_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar: Option<String>,
    },

    #[serde(rename = "v1.ToolApprovalRequested")]
    ToolApprovalRequested {
        tool_call_id: String,
        cell_id: String,
        tool_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        requested_by: Option<String>,
    },

    #[serde(rename = "v1.ToolApprovalResponded")]
    ToolApprovalResponded {
        tool_call_id: String,
        status: ApprovalStatus,
        responded_by: String,
    },

    #[serde(rename = "v1.PresenceSet")]
    PresenceSet {
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cell_id: Option<String>,
    },

    #[serde(rename = "v1.UiStateSet")]
    UiStateSet {
        user_id: String,
        key: String,
        value: Value,
    },

    /// Diagnostic breadcrumb; materializes to nothing.
    #[serde(rename = "v1.DebugLogged")]
    DebugLogged {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
}

impl Event {
    /// The versioned wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Event::NotebookInitialized { .. } => "v1.NotebookInitialized",
            Event::NotebookMetadataSet { .. } => "v1.NotebookMetadataSet",
            Event::NotebookTitleChanged { .. } => "v1.NotebookTitleChanged",
            Event::CellCreatedV1 { .. } => "v1.CellCreated",
            Event::CellCreatedV2 { .. } => "v2.CellCreated",
            Event::CellSourceChanged { .. } => "v1.CellSourceChanged",
            Event::CellTypeChanged { .. } => "v1.CellTypeChanged",
            Event::CellDeleted { .. } => "v1.CellDeleted",
            Event::CellMovedV1 { .. } => "v1.CellMoved",
            Event::CellMovedV2 { .. } => "v2.CellMoved",
            Event::CellSourceVisibilityToggled { .. } => "v1.CellSourceVisibilityToggled",
            Event::CellOutputVisibilityToggled { .. } => "v1.CellOutputVisibilityToggled",
            Event::CellAiContextVisibilityToggled { .. } => "v1.CellAiContextVisibilityToggled",
            Event::AiSettingsChanged { .. } => "v1.AiSettingsChanged",
            Event::SqlConnectionChanged { .. } => "v1.SqlConnectionChanged",
            Event::SqlResultVariableChanged { .. } => "v1.SqlResultVariableChanged",
            Event::RuntimeSessionStarted { .. } => "v1.RuntimeSessionStarted",
            Event::RuntimeSessionStatusChanged { .. } => "v1.RuntimeSessionStatusChanged",
            Event::RuntimeSessionTerminated { .. } => "v1.RuntimeSessionTerminated",
            Event::ExecutionRequested { .. } => "v1.ExecutionRequested",
            Event::ExecutionAssigned { .. } => "v1.ExecutionAssigned",
            Event::ExecutionStarted { .. } => "v1.ExecutionStarted",
            Event::ExecutionCompleted { .. } => "v1.ExecutionCompleted",
            Event::ExecutionCancelled { .. } => "v1.ExecutionCancelled",
            Event::MultimediaDisplayOutputAdded { .. } => "v1.MultimediaDisplayOutputAdded",
            Event::MultimediaDisplayOutputUpdated { .. } => "v1.MultimediaDisplayOutputUpdated",
            Event::MultimediaResultOutputAdded { .. } => "v1.MultimediaResultOutputAdded",
            Event::TerminalOutputAdded { .. } => "v1.TerminalOutputAdded",
            Event::TerminalOutputAppendedV1 { .. } => "v1.TerminalOutputAppended",
            Event::TerminalOutputAppendedV2 { .. } => "v2.TerminalOutputAppended",
            Event::MarkdownOutputAdded { .. } => "v1.MarkdownOutputAdded",
            Event::MarkdownOutputAppendedV1 { .. } => "v1.MarkdownOutputAppended",
            Event::MarkdownOutputAppendedV2 { .. } => "v2.MarkdownOutputAppended",
            Event::ErrorOutputAdded { .. } => "v1.ErrorOutputAdded",
            Event::CellOutputsCleared { .. } => "v1.CellOutputsCleared",
            Event::ActorProfileSet { .. } => "v1.ActorProfileSet",
            Event::ToolApprovalRequested { .. } => "v1.ToolApprovalRequested",
            Event::ToolApprovalResponded { .. } => "v1.ToolApprovalResponded",
            Event::PresenceSet { .. } => "v1.PresenceSet",
            Event::UiStateSet { .. } => "v1.UiStateSet",
            Event::DebugLogged { .. } => "v1.DebugLogged",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
