//! The notebook → event-sequence conversion.

use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use sumi_events::Event;
use sumi_index::JitterSource;
use sumi_ops::{create_cell_between, NewCell};
use sumi_types::{document_order, ActorType, CellReference, CellType, Representation};

use crate::nbformat::{Notebook, NotebookCell, NotebookOutput};
use crate::{ImportError, Result};

/// Knobs for an import run.
#[derive(Clone, Debug, Default)]
pub struct ImportOptions {
    /// Date string for the generated title. Defaults to today's local date;
    /// inject a fixed value to keep pipelines reproducible.
    pub title_date: Option<String>,
}

/// The produced event sequence plus bookkeeping.
#[derive(Debug)]
pub struct ImportResult {
    /// Events in append order.
    pub events: Vec<Event>,
    /// Id of the synthetic importer actor.
    pub actor_id: String,
    /// Number of cells imported.
    pub cell_count: usize,
}

fn today_local() -> String {
    use chrono::Datelike;
    let now = chrono::Local::now();
    format!("{}/{}/{}", now.month(), now.day(), now.year())
}

/// Fold a creation batch into the running cell list: rebalance moves update
/// indices in place, then the new cell joins and the list re-sorts.
fn track_creation(all_cells: &mut Vec<CellReference>, events: &[Event]) {
    for event in events {
        match event {
            Event::CellMovedV2 {
                id,
                fractional_index,
                ..
            } => {
                if let Some(cell) = all_cells.iter_mut().find(|c| c.id == *id) {
                    cell.fractional_index = Some(fractional_index.clone());
                }
            }
            Event::CellCreatedV2 {
                id,
                fractional_index,
                cell_type,
                ..
            } => {
                all_cells.push(CellReference::new(
                    id.clone(),
                    *cell_type,
                    fractional_index.clone(),
                ));
            }
            _ => {}
        }
    }
    all_cells.sort_by(document_order);
}

fn output_events(
    cell_id: &str,
    outputs: &[NotebookOutput],
    events: &mut Vec<Event>,
) {
    for (position, output) in outputs.iter().enumerate() {
        let position = position as f64;
        match output {
            NotebookOutput::Stream { name, text } => {
                events.push(Event::TerminalOutputAdded {
                    id: Uuid::new_v4().to_string(),
                    cell_id: cell_id.to_string(),
                    position,
                    stream_name: name.clone(),
                    content: Representation::inline(text.join()),
                });
            }
            NotebookOutput::ExecuteResult {
                data,
                execution_count,
            } => {
                let representations = data
                    .iter()
                    .map(|(mime, payload)| (mime.clone(), Representation::inline(payload.clone())))
                    .collect();
                events.push(Event::MultimediaResultOutputAdded {
                    id: Uuid::new_v4().to_string(),
                    cell_id: cell_id.to_string(),
                    position,
                    representations,
                    execution_count: execution_count.unwrap_or(0),
                });
            }
            NotebookOutput::DisplayData { data } => {
                let representations = data
                    .iter()
                    .map(|(mime, payload)| (mime.clone(), Representation::inline(payload.clone())))
                    .collect();
                events.push(Event::MultimediaDisplayOutputAdded {
                    id: Uuid::new_v4().to_string(),
                    cell_id: cell_id.to_string(),
                    position,
                    representations,
                    display_id: None,
                });
            }
            NotebookOutput::Error {
                ename,
                evalue,
                traceback,
            } => {
                events.push(Event::ErrorOutputAdded {
                    id: Uuid::new_v4().to_string(),
                    cell_id: cell_id.to_string(),
                    position,
                    content: Representation::inline(json!({
                        "ename": ename,
                        "evalue": evalue,
                        "traceback": traceback,
                    })),
                });
            }
            NotebookOutput::Unknown => {
                warn!(%cell_id, position, "skipping unrecognized output type");
            }
        }
    }
}

/// Raw cells carry no outputs and render as text, so they import as
/// markdown; everything that isn't code does.
fn cell_type_of(cell: &NotebookCell) -> CellType {
    if cell.cell_type == "code" {
        CellType::Code
    } else {
        CellType::Markdown
    }
}

/// Convert a parsed notebook into its event sequence.
pub fn import_notebook(
    notebook: &Notebook,
    options: &ImportOptions,
    jitter: &mut dyn JitterSource,
) -> Result<ImportResult> {
    if notebook.nbformat != 4 {
        return Err(ImportError::UnsupportedFormat(notebook.nbformat));
    }

    let actor_id = Uuid::new_v4().to_string();
    let mut events = vec![Event::ActorProfileSet {
        id: actor_id.clone(),
        actor_type: ActorType::Human,
        display_name: "Notebook Importer".into(),
        avatar: None,
    }];

    let date = options.title_date.clone().unwrap_or_else(today_local);
    events.push(Event::NotebookTitleChanged {
        title: format!("Imported Notebook - {date}"),
    });

    if let Some(kernelspec) = &notebook.metadata.kernelspec {
        if let Some(display_name) = &kernelspec.display_name {
            events.push(Event::NotebookMetadataSet {
                key: "kernelspec_display_name".into(),
                value: Value::String(display_name.clone()),
            });
        }
        if let Some(language) = &kernelspec.language {
            events.push(Event::NotebookMetadataSet {
                key: "language".into(),
                value: Value::String(language.clone()),
            });
        }
    }

    let mut all_cells: Vec<CellReference> = Vec::new();
    let mut cell_before: Option<CellReference> = None;

    for cell in &notebook.cells {
        let cell_type = cell_type_of(cell);
        let cell_id = Uuid::new_v4().to_string();

        let creation = create_cell_between(
            NewCell {
                id: cell_id.clone(),
                cell_type,
                created_by: actor_id.clone(),
            },
            cell_before.as_ref(),
            None,
            &all_cells,
            jitter,
        )?;
        track_creation(&mut all_cells, &creation.events);
        let placed_index = creation.fractional_index.clone();
        events.extend(creation.events);

        events.push(Event::CellSourceChanged {
            id: cell_id.clone(),
            source: cell.source.join(),
            actor_id: Some(actor_id.clone()),
        });

        if cell_type == CellType::Code && !cell.outputs.is_empty() {
            events.push(Event::CellOutputsCleared {
                cell_id: cell_id.clone(),
                wait: false,
                cleared_by: actor_id.clone(),
            });
            output_events(&cell_id, &cell.outputs, &mut events);
        }

        cell_before = Some(CellReference::new(cell_id, cell_type, placed_index));
    }

    Ok(ImportResult {
        events,
        actor_id,
        cell_count: notebook.cells.len(),
    })
}

/// Parse notebook JSON and convert it.
pub fn import_json(
    json: &str,
    options: &ImportOptions,
    jitter: &mut dyn JitterSource,
) -> Result<ImportResult> {
    let notebook: Notebook = serde_json::from_str(json)?;
    import_notebook(&notebook, options, jitter)
}

// ============================================================================
// Tests
// ============================================================================
