//! Primary-representation selection for multimedia outputs.
//!
//! A multimedia output carries a bundle of MIME-typed representations; the
//! tables denormalize one of them into the `data` / `mime_type` /
//! `artifact_id` columns so plain readers never have to walk the bundle.
//! Selection walks a fixed priority list and takes the first MIME type the
//! bundle contains.

use serde_json::Value;

use sumi_types::{MimeBundle, Representation};

/// Priority order for display outputs: interactive specs first, then
/// structured JSON, then renderable text, then raster, then plain.
pub const DISPLAY_PRIORITY: &[&str] = &[
    "application/vnd.plotly.v1+json",
    "application/vnd.vega.v5+json",
    "application/vnd.vegalite.v5+json",
    "application/vnd.jupyter.widget-view+json",
    "application/vnd.dataresource+json",
    "application/vdom.v1+json",
    "application/geo+json",
    "application/json",
    "application/javascript",
    "text/html",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "image/gif",
    "text/latex",
    "text/markdown",
    "text/plain",
];

/// Narrower HTML-first order for execution results (pandas & friends emit
/// HTML tables as their best face).
pub const RESULT_PRIORITY: &[&str] = &[
    "text/html",
    "image/png",
    "image/jpeg",
    "image/svg+xml",
    "application/json",
    "text/plain",
];

/// The denormalized columns extracted from a bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimaryRepresentation {
    pub mime_type: String,
    /// Stringified inline payload; empty for artifact representations.
    pub data: String,
    pub artifact_id: Option<String>,
    pub metadata: Option<Value>,
}

/// Coerce an inline payload to its string column form.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pick the primary representation of a bundle under a priority list.
///
/// Returns `None` when no listed MIME type is present (exotic-only bundles
/// keep their representations column but leave the denormalized ones empty).
pub fn select_primary(bundle: &MimeBundle, priority: &[&str]) -> Option<PrimaryRepresentation> {
    for &mime in priority {
        if let Some(rep) = bundle.get(mime) {
            return Some(match rep {
                Representation::Inline { data, metadata } => PrimaryRepresentation {
                    mime_type: mime.to_string(),
                    data: coerce_to_string(data),
                    artifact_id: None,
                    metadata: metadata.clone(),
                },
                Representation::Artifact {
                    artifact_id,
                    metadata,
                } => PrimaryRepresentation {
                    mime_type: mime.to_string(),
                    data: String::new(),
                    artifact_id: Some(artifact_id.clone()),
                    metadata: metadata.clone(),
                },
            });
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
