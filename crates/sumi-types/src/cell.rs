//! Cell classification and ordering references.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// What a cell *is* (content type).
///
/// Deliberately small. Execution mechanics (which runtime capability a cell
/// needs) are derived from the type; per-cell settings (SQL connection, AI
/// model) live on the cell row itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum CellType {
    /// Executable code (kernel language).
    #[default]
    Code,
    /// Markdown prose.
    Markdown,
    /// SQL query cell, bound to a connection.
    Sql,
    /// Raw passthrough (imported as markdown; raw cells never execute).
    Raw,
    /// AI conversation cell.
    Ai,
}

impl CellType {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Code => "code",
            CellType::Markdown => "markdown",
            CellType::Sql => "sql",
            CellType::Raw => "raw",
            CellType::Ai => "ai",
        }
    }

    /// Check if cells of this type are ever submitted to a runtime.
    pub fn is_executable(&self) -> bool {
        matches!(self, CellType::Code | CellType::Sql | CellType::Ai)
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Execution lifecycle of a cell (projection of queue events).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ExecutionState {
    /// Not scheduled.
    #[default]
    Idle,
    /// Waiting for a runtime slot.
    Queued,
    /// Currently executing.
    Running,
    /// Last run finished cleanly.
    Completed,
    /// Last run failed.
    Error,
}

impl ExecutionState {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionState::Idle => "idle",
            ExecutionState::Queued => "queued",
            ExecutionState::Running => "running",
            ExecutionState::Completed => "completed",
            ExecutionState::Error => "error",
        }
    }

    /// Check if this state indicates in-flight work (queued or running).
    pub fn is_active(&self) -> bool {
        matches!(self, ExecutionState::Queued | ExecutionState::Running)
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lightweight handle to a cell used by ordering operations.
///
/// This is what `create_cell_between` / `move_cell_between` take for their
/// neighbour arguments and the `all_cells` snapshot: just enough to resolve
/// bounds and positions without dragging the full row around.
///
/// Document order is `fractional_index` ascending with `id` ascending as the
/// tiebreak; a cell with no index sorts after every indexed cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellReference {
    /// Cell id (opaque string).
    pub id: String,
    /// Cell content type.
    pub cell_type: CellType,
    /// Current ordering index, if the cell has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fractional_index: Option<String>,
}

impl CellReference {
    /// Create a reference with an index.
    pub fn new(id: impl Into<String>, cell_type: CellType, fractional_index: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cell_type,
            fractional_index: Some(fractional_index.into()),
        }
    }

}

/// Compare two cells in document order.
///
/// `None` indices sort *after* all `Some` indices, matching the query layer's
/// nulls-last collation.
pub fn document_order(a: &CellReference, b: &CellReference) -> std::cmp::Ordering {
    match (a.fractional_index.as_deref(), b.fractional_index.as_deref()) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

// ============================================================================
// Tests
// ============================================================================
