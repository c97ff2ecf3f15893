//! Runtime session and execution queue states.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Lifecycle of a runtime session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum RuntimeStatus {
    /// Booting, not yet accepting work.
    #[default]
    Starting,
    /// Idle and accepting work.
    Ready,
    /// Executing something.
    Busy,
    /// Restart in progress (handoff window; a second active session may
    /// briefly coexist).
    Restarting,
    /// Gone for good.
    Terminated,
}

impl RuntimeStatus {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeStatus::Starting => "starting",
            RuntimeStatus::Ready => "ready",
            RuntimeStatus::Busy => "busy",
            RuntimeStatus::Restarting => "restarting",
            RuntimeStatus::Terminated => "terminated",
        }
    }

    /// Check if the session can still take work at some point.
    pub fn is_live(&self) -> bool {
        !matches!(self, RuntimeStatus::Terminated)
    }
}

impl std::fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of an execution queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum QueueStatus {
    /// Requested, no runtime assigned yet.
    #[default]
    Pending,
    /// Claimed by a runtime session.
    Assigned,
    /// Running.
    Executing,
    /// Finished cleanly.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled before or during execution.
    Cancelled,
}

impl QueueStatus {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Assigned => "assigned",
            QueueStatus::Executing => "executing",
            QueueStatus::Completed => "completed",
            QueueStatus::Failed => "failed",
            QueueStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this entry will never run again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueStatus::Completed | QueueStatus::Failed | QueueStatus::Cancelled
        )
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an execution finished, as reported by `ExecutionCompleted`.
///
/// `Cancelled` appears in historical logs (older runtimes reported
/// cancellation through completion) and stays replayable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ExecutionOutcome {
    Success,
    Error,
    Cancelled,
}

impl ExecutionOutcome {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionOutcome::Success => "success",
            ExecutionOutcome::Error => "error",
            ExecutionOutcome::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
