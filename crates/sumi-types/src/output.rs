//! Output classification and representation containers.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::EnumString;

/// What an output *is*.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputType {
    /// Rich display output (`display_data` in Jupyter terms). May carry a
    /// display id for in-place re-rendering.
    MultimediaDisplay,
    /// Rich execution result (`execute_result`), tied to an execution count.
    MultimediaResult,
    /// Stream output (stdout/stderr).
    Terminal,
    /// Markdown output (AI cells stream these).
    Markdown,
    /// Exception / error traceback.
    Error,
}

impl OutputType {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::MultimediaDisplay => "multimedia_display",
            OutputType::MultimediaResult => "multimedia_result",
            OutputType::Terminal => "terminal",
            OutputType::Markdown => "markdown",
            OutputType::Error => "error",
        }
    }
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single MIME-typed payload within an output.
///
/// Exactly one of the two shapes is present: the payload travels inline in
/// the event, or by reference to an externally stored artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Representation {
    /// Payload carried in the event itself.
    Inline {
        data: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },
    /// Payload stored out of band; the event carries only the handle.
    Artifact {
        #[serde(rename = "artifactId")]
        artifact_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },
}

impl Representation {
    /// Inline container without metadata.
    pub fn inline(data: impl Into<Value>) -> Self {
        Representation::Inline {
            data: data.into(),
            metadata: None,
        }
    }

    /// Artifact container without metadata.
    pub fn artifact(artifact_id: impl Into<String>) -> Self {
        Representation::Artifact {
            artifact_id: artifact_id.into(),
            metadata: None,
        }
    }

    /// The metadata attached to either shape.
    pub fn metadata(&self) -> Option<&Value> {
        match self {
            Representation::Inline { metadata, .. } => metadata.as_ref(),
            Representation::Artifact { metadata, .. } => metadata.as_ref(),
        }
    }
}

/// MIME type → representation bundle for a multimedia output.
pub type MimeBundle = BTreeMap<String, Representation>;

// ============================================================================
// Tests
// ============================================================================
