//! Serde model of the nbformat-4 document shape.
//!
//! Tolerant by design: unknown metadata is ignored, unknown output types are
//! skipped, and the string-or-string-array source convention is normalized
//! through [`SourceText`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// A Jupyter notebook document.
#[derive(Clone, Debug, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<NotebookCell>,
    #[serde(default)]
    pub metadata: NotebookMetadata,
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
}

/// Notebook-level metadata (only the fields the importer reads).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default)]
    pub kernelspec: Option<KernelSpec>,
}

/// The kernelspec block.
#[derive(Clone, Debug, Deserialize)]
pub struct KernelSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// A single notebook cell.
#[derive(Clone, Debug, Deserialize)]
pub struct NotebookCell {
    pub cell_type: String,
    #[serde(default)]
    pub source: SourceText,
    #[serde(default)]
    pub execution_count: Option<u64>,
    #[serde(default)]
    pub outputs: Vec<NotebookOutput>,
}

/// nbformat's string-or-line-array text convention.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum SourceText {
    One(String),
    Lines(Vec<String>),
}

impl SourceText {
    /// Join into a single string (lines already carry their newlines).
    pub fn join(&self) -> String {
        match self {
            SourceText::One(s) => s.clone(),
            SourceText::Lines(lines) => lines.concat(),
        }
    }
}

impl Default for SourceText {
    fn default() -> Self {
        SourceText::One(String::new())
    }
}

/// A cell output, tagged by `output_type`.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "output_type")]
pub enum NotebookOutput {
    #[serde(rename = "stream")]
    Stream { name: String, text: SourceText },
    #[serde(rename = "execute_result")]
    ExecuteResult {
        #[serde(default)]
        data: BTreeMap<String, Value>,
        #[serde(default)]
        execution_count: Option<u64>,
    },
    #[serde(rename = "display_data")]
    DisplayData {
        #[serde(default)]
        data: BTreeMap<String, Value>,
    },
    #[serde(rename = "error")]
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
    /// Anything newer than we understand; skipped with a warning.
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Tests
// ============================================================================
