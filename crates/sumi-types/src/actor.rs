//! Actor identity and tool approval states.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Who a notebook actor is (participant type).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ActorType {
    /// Person at a keyboard.
    #[default]
    Human,
    /// AI agent acting on the notebook.
    Agent,
    /// Runtime process (execution results, system messages).
    Runtime,
}

impl ActorType {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Human => "human",
            ActorType::Agent => "agent",
            ActorType::Runtime => "runtime",
        }
    }
}

impl std::fmt::Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of a tool approval request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ApprovalStatus {
    /// Awaiting a response.
    #[default]
    Pending,
    /// Approved for this call only.
    ApprovedOnce,
    /// Approved for the rest of the session.
    ApprovedAlways,
    /// Denied.
    Denied,
}

impl ApprovalStatus {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::ApprovedOnce => "approved_once",
            ApprovalStatus::ApprovedAlways => "approved_always",
            ApprovalStatus::Denied => "denied",
        }
    }

    /// Check if the tool may run under this status.
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::ApprovedOnce | ApprovalStatus::ApprovedAlways)
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
