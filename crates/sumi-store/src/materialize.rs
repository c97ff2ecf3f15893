//! The event → table-op reducer.
//!
//! One pure arm per event kind. The reducer reads current state only through
//! the `&State` it is handed and returns the batch of [`TableOp`]s the event
//! implies. No clock, no randomness, no globals, so replaying a log on a
//! fresh state always lands on identical tables.
//!
//! Events referencing rows that don't exist produce an **empty batch**, not
//! an error: with snapshot-relative sync, events can arrive for entities a
//! replica never saw, and dropping the dependent work is the documented
//! recovery.

use serde_json::Value;
use tracing::warn;

use sumi_events::Event;
use sumi_types::{
    ApprovalStatus, ExecutionOutcome, ExecutionState, MimeBundle, OutputType, QueueStatus,
    Representation, RuntimeStatus,
};

use crate::ops::{CellPatch, OutputPatch, QueuePatch, RuntimeSessionPatch, TableOp};
use crate::primary::{coerce_to_string, select_primary, DISPLAY_PRIORITY, RESULT_PRIORITY};
use crate::rows::{
    ActorRow, CellRow, ExecutionQueueRow, OutputDeltaRow, OutputRow, PendingClearRow, PresenceRow,
    RuntimeSessionRow, ToolApprovalRow, UiStateRow,
};
use crate::state::State;

/// Alphabet used by the legacy position → pseudo-index conversion.
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ascii")
}

/// Legacy `v1.CellCreated` positions become `"a" + base36(floor(position))`.
/// Collisions with real v2 indices are possible; replay-only, never emitted
/// by new writers.
fn pseudo_index(position: f64) -> String {
    let whole = position.floor().max(0.0) as u64;
    format!("a{}", base36(whole))
}

fn presence(user_id: &str, cell_id: Option<&str>) -> TableOp {
    TableOp::UpsertPresence(PresenceRow {
        user_id: user_id.to_string(),
        cell_id: cell_id.map(str::to_string),
    })
}

/// Denormalized columns for a single-representation output (terminal,
/// markdown, error).
fn content_columns(content: &Representation) -> (Option<String>, Option<String>, Option<Value>) {
    match content {
        Representation::Inline { data, metadata } => {
            (Some(coerce_to_string(data)), None, metadata.clone())
        }
        Representation::Artifact {
            artifact_id,
            metadata,
        } => (
            Some(String::new()),
            Some(artifact_id.clone()),
            metadata.clone(),
        ),
    }
}

/// A pending clear on `cell_id` is consumed by the next output arrival:
/// the cell's outputs vanish first, then the marker itself.
fn consume_pending_clear(state: &State, cell_id: &str) -> Vec<TableOp> {
    if state.pending_clear(cell_id).is_none() {
        return Vec::new();
    }
    vec![
        TableOp::DeleteOutputsForCell {
            cell_id: cell_id.to_string(),
        },
        TableOp::DeletePendingClear {
            cell_id: cell_id.to_string(),
        },
    ]
}

/// In-place re-render: patch every display output carrying `display_id`
/// with the new bundle and its primary columns.
fn display_patches(
    state: &State,
    display_id: &str,
    representations: &MimeBundle,
) -> Vec<TableOp> {
    let primary = select_primary(representations, DISPLAY_PRIORITY);
    state
        .outputs
        .values()
        .filter(|row| {
            row.output_type == OutputType::MultimediaDisplay
                && row.display_id.as_deref() == Some(display_id)
        })
        .map(|row| TableOp::PatchOutput {
            id: row.id.clone(),
            patch: OutputPatch {
                representations: Some(representations.clone()),
                data: Some(primary.as_ref().map(|p| p.data.clone())),
                mime_type: Some(primary.as_ref().map(|p| p.mime_type.clone())),
                artifact_id: Some(primary.as_ref().and_then(|p| p.artifact_id.clone())),
                metadata: None,
            },
        })
        .collect()
}

/// Shared arm for the field-update cell events: patch if the cell exists,
/// drop the work (plus a presence update, which never depends on the row)
/// if it doesn't.
fn patch_cell(
    state: &State,
    id: &str,
    patch: CellPatch,
    actor_id: Option<&str>,
) -> Vec<TableOp> {
    let mut ops = Vec::new();
    if state.cell(id).is_some() {
        ops.push(TableOp::PatchCell {
            id: id.to_string(),
            patch,
        });
    } else {
        warn!(cell_id = %id, "dropping update for unknown cell");
    }
    if let Some(actor) = actor_id {
        ops.push(presence(actor, Some(id)));
    }
    ops
}

/// Reduce one event into its table-op batch.
pub fn materialize(state: &State, event: &Event) -> Vec<TableOp> {
    match event {
        // ── Notebook metadata ───────────────────────────────────────────
        Event::NotebookInitialized { title, owner_id } => {
            let mut ops = Vec::new();
            if let Some(title) = title {
                ops.push(TableOp::UpsertMetadata {
                    key: "title".into(),
                    value: Value::String(title.clone()),
                });
            }
            if let Some(owner) = owner_id {
                ops.push(TableOp::UpsertMetadata {
                    key: "ownerId".into(),
                    value: Value::String(owner.clone()),
                });
            }
            ops
        }
        Event::NotebookMetadataSet { key, value } => vec![TableOp::UpsertMetadata {
            key: key.clone(),
            value: value.clone(),
        }],
        Event::NotebookTitleChanged { title } => vec![TableOp::UpsertMetadata {
            key: "title".into(),
            value: Value::String(title.clone()),
        }],

        // ── Cells ───────────────────────────────────────────────────────
        Event::CellCreatedV1 {
            id,
            position,
            cell_type,
            created_by,
            actor_id,
        } => {
            let mut row = CellRow::new(id.clone(), *cell_type, created_by.clone());
            row.fractional_index = Some(pseudo_index(*position));
            vec![
                TableOp::InsertCell(row),
                presence(actor_id.as_deref().unwrap_or(created_by), Some(id)),
            ]
        }
        Event::CellCreatedV2 {
            id,
            fractional_index,
            cell_type,
            created_by,
        } => {
            let mut row = CellRow::new(id.clone(), *cell_type, created_by.clone());
            row.fractional_index = Some(fractional_index.clone());
            vec![TableOp::InsertCell(row), presence(created_by, Some(id))]
        }
        Event::CellSourceChanged {
            id,
            source,
            actor_id,
        } => patch_cell(
            state,
            id,
            CellPatch {
                source: Some(source.clone()),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::CellTypeChanged {
            id,
            cell_type,
            actor_id,
        } => patch_cell(
            state,
            id,
            CellPatch {
                cell_type: Some(*cell_type),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::CellDeleted { id, actor_id } => {
            let mut ops = Vec::new();
            if state.cell(id).is_some() {
                // Outputs are not cascaded; orphan collection is external
                // policy.
                ops.push(TableOp::DeleteCell { id: id.clone() });
            } else {
                warn!(cell_id = %id, "dropping delete for unknown cell");
            }
            if let Some(actor) = actor_id {
                ops.push(presence(actor, Some(id)));
            }
            ops
        }
        Event::CellMovedV1 {
            id,
            position,
            actor_id,
        } => patch_cell(
            state,
            id,
            CellPatch {
                fractional_index: Some(pseudo_index(*position)),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::CellMovedV2 {
            id,
            fractional_index,
            actor_id,
        } => patch_cell(
            state,
            id,
            CellPatch {
                fractional_index: Some(fractional_index.clone()),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::CellSourceVisibilityToggled {
            id,
            visible,
            actor_id,
        } => patch_cell(
            state,
            id,
            CellPatch {
                source_visible: Some(*visible),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::CellOutputVisibilityToggled {
            id,
            visible,
            actor_id,
        } => patch_cell(
            state,
            id,
            CellPatch {
                output_visible: Some(*visible),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::CellAiContextVisibilityToggled {
            id,
            visible,
            actor_id,
        } => patch_cell(
            state,
            id,
            CellPatch {
                ai_context_visible: Some(*visible),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::AiSettingsChanged {
            cell_id,
            provider,
            model,
            settings,
            actor_id,
        } => patch_cell(
            state,
            cell_id,
            CellPatch {
                ai_provider: Some(provider.clone()),
                ai_model: Some(model.clone()),
                ai_settings: Some(settings.clone()),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::SqlConnectionChanged {
            cell_id,
            connection_id,
            actor_id,
        } => patch_cell(
            state,
            cell_id,
            CellPatch {
                sql_connection_id: Some(connection_id.clone()),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),
        Event::SqlResultVariableChanged {
            cell_id,
            result_variable,
            actor_id,
        } => patch_cell(
            state,
            cell_id,
            CellPatch {
                sql_result_variable: Some(result_variable.clone()),
                ..Default::default()
            },
            actor_id.as_deref(),
        ),

        // ── Output clearing ─────────────────────────────────────────────
        Event::CellOutputsCleared {
            cell_id,
            wait,
            cleared_by,
        } => {
            let mut ops = if *wait {
                vec![TableOp::UpsertPendingClear(PendingClearRow {
                    cell_id: cell_id.clone(),
                    cleared_by: cleared_by.clone(),
                })]
            } else {
                vec![TableOp::DeleteOutputsForCell {
                    cell_id: cell_id.clone(),
                }]
            };
            ops.push(presence(cleared_by, Some(cell_id)));
            ops
        }

        // ── Output adds ─────────────────────────────────────────────────
        Event::TerminalOutputAdded {
            id,
            cell_id,
            position,
            stream_name,
            content,
        } => {
            let mut ops = consume_pending_clear(state, cell_id);
            let mut row = OutputRow::new(id.clone(), cell_id.clone(), OutputType::Terminal, *position);
            row.stream_name = Some(stream_name.clone());
            let (data, artifact_id, metadata) = content_columns(content);
            row.data = data;
            row.artifact_id = artifact_id;
            row.metadata = metadata;
            ops.push(TableOp::InsertOutput(row));
            ops
        }
        Event::MarkdownOutputAdded {
            id,
            cell_id,
            position,
            content,
        } => {
            let mut ops = consume_pending_clear(state, cell_id);
            let mut row = OutputRow::new(id.clone(), cell_id.clone(), OutputType::Markdown, *position);
            let (data, artifact_id, metadata) = content_columns(content);
            row.data = data;
            row.artifact_id = artifact_id;
            row.metadata = metadata;
            ops.push(TableOp::InsertOutput(row));
            ops
        }
        Event::ErrorOutputAdded {
            id,
            cell_id,
            position,
            content,
        } => {
            let mut ops = consume_pending_clear(state, cell_id);
            let mut row = OutputRow::new(id.clone(), cell_id.clone(), OutputType::Error, *position);
            let (data, artifact_id, metadata) = content_columns(content);
            row.data = data;
            row.artifact_id = artifact_id;
            row.metadata = metadata;
            ops.push(TableOp::InsertOutput(row));
            ops
        }
        Event::MultimediaResultOutputAdded {
            id,
            cell_id,
            position,
            representations,
            execution_count,
        } => {
            let mut ops = consume_pending_clear(state, cell_id);
            let mut row = OutputRow::new(
                id.clone(),
                cell_id.clone(),
                OutputType::MultimediaResult,
                *position,
            );
            row.execution_count = Some(*execution_count);
            row.representations = Some(representations.clone());
            if let Some(primary) = select_primary(representations, RESULT_PRIORITY) {
                row.data = Some(primary.data);
                row.mime_type = Some(primary.mime_type);
                row.artifact_id = primary.artifact_id;
                row.metadata = primary.metadata;
            }
            ops.push(TableOp::InsertOutput(row));
            ops
        }
        Event::MultimediaDisplayOutputAdded {
            id,
            cell_id,
            position,
            representations,
            display_id,
        } => {
            let mut ops = consume_pending_clear(state, cell_id);
            // Re-render every existing output sharing this display id, then
            // append the new row with the same bundle.
            if let Some(display_id) = display_id {
                ops.extend(display_patches(state, display_id, representations));
            }
            let mut row = OutputRow::new(
                id.clone(),
                cell_id.clone(),
                OutputType::MultimediaDisplay,
                *position,
            );
            row.display_id = display_id.clone();
            row.representations = Some(representations.clone());
            if let Some(primary) = select_primary(representations, DISPLAY_PRIORITY) {
                row.data = Some(primary.data);
                row.mime_type = Some(primary.mime_type);
                row.artifact_id = primary.artifact_id;
                row.metadata = primary.metadata;
            }
            ops.push(TableOp::InsertOutput(row));
            ops
        }
        Event::MultimediaDisplayOutputUpdated {
            display_id,
            representations,
        } => {
            let ops = display_patches(state, display_id, representations);
            if ops.is_empty() {
                warn!(%display_id, "dropping display update with no matching outputs");
            }
            ops
        }

        // ── Output appends ──────────────────────────────────────────────
        Event::TerminalOutputAppendedV1 { output_id, delta }
        | Event::MarkdownOutputAppendedV1 { output_id, delta } => {
            let Some(row) = state.output(output_id) else {
                warn!(%output_id, "dropping append for unknown output");
                return Vec::new();
            };
            let mut data = row.data.clone().unwrap_or_default();
            data.push_str(delta);
            vec![TableOp::PatchOutput {
                id: output_id.clone(),
                patch: OutputPatch {
                    data: Some(Some(data)),
                    ..Default::default()
                },
            }]
        }
        Event::TerminalOutputAppendedV2 {
            id,
            output_id,
            delta,
            sequence_number,
        }
        | Event::MarkdownOutputAppendedV2 {
            id,
            output_id,
            delta,
            sequence_number,
        } => {
            if state.output(output_id).is_none() {
                warn!(%output_id, "dropping delta for unknown output");
                return Vec::new();
            }
            vec![TableOp::InsertOutputDelta(OutputDeltaRow {
                id: id.clone(),
                output_id: output_id.clone(),
                delta: delta.clone(),
                sequence_number: *sequence_number,
            })]
        }

        // ── Execution queue ─────────────────────────────────────────────
        Event::ExecutionRequested {
            queue_id,
            cell_id,
            execution_count,
            requested_by,
        } => {
            let mut ops = vec![TableOp::UpsertQueueEntry(ExecutionQueueRow::pending(
                queue_id.clone(),
                cell_id.clone(),
                *execution_count,
                requested_by.clone(),
            ))];
            if state.cell(cell_id).is_some() {
                ops.push(TableOp::PatchCell {
                    id: cell_id.clone(),
                    patch: CellPatch {
                        execution_state: Some(ExecutionState::Queued),
                        execution_count: Some(*execution_count),
                        ..Default::default()
                    },
                });
            }
            ops.push(presence(requested_by, Some(cell_id)));
            ops
        }
        Event::ExecutionAssigned {
            queue_id,
            runtime_session_id,
        } => {
            if state.queue_entry(queue_id).is_none() {
                warn!(%queue_id, "dropping assignment for unknown queue entry");
                return Vec::new();
            }
            vec![TableOp::PatchQueueEntry {
                id: queue_id.clone(),
                patch: QueuePatch {
                    status: Some(QueueStatus::Assigned),
                    assigned_runtime_session: Some(runtime_session_id.clone()),
                    ..Default::default()
                },
            }]
        }
        Event::ExecutionStarted {
            queue_id,
            cell_id,
            runtime_session_id,
            started_at,
        } => {
            let mut ops = Vec::new();
            if state.queue_entry(queue_id).is_some() {
                ops.push(TableOp::PatchQueueEntry {
                    id: queue_id.clone(),
                    patch: QueuePatch {
                        status: Some(QueueStatus::Executing),
                        started_at: Some(started_at.clone()),
                        ..Default::default()
                    },
                });
            }
            if state.cell(cell_id).is_some() {
                ops.push(TableOp::PatchCell {
                    id: cell_id.clone(),
                    patch: CellPatch {
                        execution_state: Some(ExecutionState::Running),
                        assigned_runtime_session: Some(runtime_session_id.clone()),
                        ..Default::default()
                    },
                });
            }
            ops
        }
        Event::ExecutionCompleted {
            queue_id,
            cell_id,
            status,
            completed_at,
            execution_duration_ms,
        } => {
            let (queue_status, cell_state) = match status {
                ExecutionOutcome::Success => (QueueStatus::Completed, ExecutionState::Completed),
                ExecutionOutcome::Error => (QueueStatus::Failed, ExecutionState::Error),
                ExecutionOutcome::Cancelled => (QueueStatus::Cancelled, ExecutionState::Idle),
            };
            let mut ops = Vec::new();
            if state.queue_entry(queue_id).is_some() {
                ops.push(TableOp::PatchQueueEntry {
                    id: queue_id.clone(),
                    patch: QueuePatch {
                        status: Some(queue_status),
                        completed_at: Some(completed_at.clone()),
                        execution_duration_ms: *execution_duration_ms,
                        ..Default::default()
                    },
                });
            }
            if state.cell(cell_id).is_some() {
                ops.push(TableOp::PatchCell {
                    id: cell_id.clone(),
                    patch: CellPatch {
                        execution_state: Some(cell_state),
                        last_execution_duration_ms: *execution_duration_ms,
                        ..Default::default()
                    },
                });
            }
            ops
        }
        Event::ExecutionCancelled {
            queue_id,
            cell_id,
            cancelled_by,
            reason: _,
        } => {
            let mut ops = Vec::new();
            if state.queue_entry(queue_id).is_some() {
                ops.push(TableOp::PatchQueueEntry {
                    id: queue_id.clone(),
                    patch: QueuePatch {
                        status: Some(QueueStatus::Cancelled),
                        ..Default::default()
                    },
                });
            }
            if state.cell(cell_id).is_some() {
                ops.push(TableOp::PatchCell {
                    id: cell_id.clone(),
                    patch: CellPatch {
                        execution_state: Some(ExecutionState::Idle),
                        ..Default::default()
                    },
                });
            }
            ops.push(presence(cancelled_by, Some(cell_id)));
            ops
        }

        // ── Runtime sessions ────────────────────────────────────────────
        Event::RuntimeSessionStarted {
            session_id,
            runtime_id,
            runtime_type,
            can_execute_code,
            can_execute_sql,
            can_execute_ai,
            available_ai_models,
        } => vec![TableOp::UpsertRuntimeSession(RuntimeSessionRow {
            session_id: session_id.clone(),
            runtime_id: runtime_id.clone(),
            runtime_type: runtime_type.clone(),
            status: RuntimeStatus::Starting,
            is_active: true,
            can_execute_code: *can_execute_code,
            can_execute_sql: *can_execute_sql,
            can_execute_ai: *can_execute_ai,
            available_ai_models: available_ai_models.clone(),
        })],
        Event::RuntimeSessionStatusChanged { session_id, status } => {
            if state.runtime_session(session_id).is_none() {
                warn!(%session_id, "dropping status change for unknown session");
                return Vec::new();
            }
            vec![TableOp::PatchRuntimeSession {
                session_id: session_id.clone(),
                patch: RuntimeSessionPatch {
                    status: Some(*status),
                    ..Default::default()
                },
            }]
        }
        Event::RuntimeSessionTerminated {
            session_id,
            reason: _,
        } => {
            if state.runtime_session(session_id).is_none() {
                warn!(%session_id, "dropping termination for unknown session");
                return Vec::new();
            }
            vec![TableOp::PatchRuntimeSession {
                session_id: session_id.clone(),
                patch: RuntimeSessionPatch {
                    status: Some(RuntimeStatus::Terminated),
                    is_active: Some(false),
                },
            }]
        }

        // ── Actors, approvals, presence, UI ─────────────────────────────
        Event::ActorProfileSet {
            id,
            actor_type,
            display_name,
            avatar,
        } => vec![TableOp::UpsertActor(ActorRow {
            id: id.clone(),
            actor_type: *actor_type,
            display_name: display_name.clone(),
            avatar: avatar.clone(),
        })],
        Event::ToolApprovalRequested {
            tool_call_id,
            cell_id,
            tool_name,
            arguments,
            requested_by,
        } => vec![TableOp::UpsertToolApproval(ToolApprovalRow {
            tool_call_id: tool_call_id.clone(),
            cell_id: cell_id.clone(),
            tool_name: tool_name.clone(),
            arguments: arguments.clone(),
            requested_by: requested_by.clone(),
            status: ApprovalStatus::Pending,
            responded_by: None,
        })],
        Event::ToolApprovalResponded {
            tool_call_id,
            status,
            responded_by,
        } => {
            let Some(existing) = state.tool_approval(tool_call_id) else {
                warn!(%tool_call_id, "dropping response for unknown tool approval");
                return Vec::new();
            };
            let mut row = existing.clone();
            row.status = *status;
            row.responded_by = Some(responded_by.clone());
            vec![TableOp::UpsertToolApproval(row)]
        }
        Event::PresenceSet { user_id, cell_id } => {
            vec![presence(user_id, cell_id.as_deref())]
        }
        Event::UiStateSet {
            user_id,
            key,
            value,
        } => vec![TableOp::UpsertUiState(UiStateRow {
            user_id: user_id.clone(),
            key: key.clone(),
            value: value.clone(),
        })],
        Event::DebugLogged { .. } => Vec::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
