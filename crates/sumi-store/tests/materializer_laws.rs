//! Materializer laws: replay equivalence, pending clears, display-id
//! re-rendering, delta reconstruction.

use serde_json::json;

use sumi_events::Event;
use sumi_store::{
    apply_deltas, OutputDeltasForOutput, OutputsForCell, Query, State,
};
use sumi_types::{CellType, MimeBundle, Representation};

fn created(id: &str, index: &str) -> Event {
    Event::CellCreatedV2 {
        id: id.into(),
        fractional_index: index.into(),
        cell_type: CellType::Code,
        created_by: "amy".into(),
    }
}

fn terminal_added(id: &str, cell: &str, position: f64, text: &str) -> Event {
    Event::TerminalOutputAdded {
        id: id.into(),
        cell_id: cell.into(),
        position,
        stream_name: "stdout".into(),
        content: Representation::inline(text),
    }
}

fn bundle(entries: &[(&str, &str)]) -> MimeBundle {
    entries
        .iter()
        .map(|(mime, data)| (mime.to_string(), Representation::inline(*data)))
        .collect()
}

fn outputs_for(state: &State, cell: &str) -> Vec<sumi_store::OutputRow> {
    OutputsForCell {
        cell_id: cell.into(),
    }
    .run(state)
}

// ── Law 9: replay equivalence ───────────────────────────────────────────

#[test]
fn replay_is_batching_independent() {
    let events = vec![
        created("c1", "m"),
        terminal_added("o1", "c1", 0.0, "one"),
        Event::CellOutputsCleared {
            cell_id: "c1".into(),
            wait: true,
            cleared_by: "amy".into(),
        },
        terminal_added("o2", "c1", 1.0, "two"),
        Event::CellSourceChanged {
            id: "c1".into(),
            source: "print(2)".into(),
            actor_id: Some("amy".into()),
        },
    ];

    // One at a time.
    let mut one_by_one = State::new();
    for ev in &events {
        one_by_one.ingest_all([ev]);
    }

    // All at once, and once more through a serialization roundtrip.
    let all_at_once = State::replay(&events);
    let json = serde_json::to_string(&events).unwrap();
    let parsed: Vec<Event> = serde_json::from_str(&json).unwrap();
    let from_wire = State::replay(&parsed);

    assert_eq!(one_by_one, all_at_once);
    assert_eq!(all_at_once, from_wire);
}

// ── Law 10: pending-clear semantics ─────────────────────────────────────

#[test]
fn pending_clear_holds_until_next_output() {
    let mut state = State::replay(&[
        created("c1", "m"),
        terminal_added("p", "c1", 0.0, "old-p"),
        terminal_added("q", "c1", 1.0, "old-q"),
    ]);

    state.ingest(&Event::CellOutputsCleared {
        cell_id: "c1".into(),
        wait: true,
        cleared_by: "amy".into(),
    });

    // Nothing visible changes yet.
    let rows = outputs_for(&state, "c1");
    assert_eq!(rows.len(), 2);
    assert!(state.pending_clear("c1").is_some());

    // First add consumes the clear; second one appends normally.
    state.ingest(&terminal_added("x", "c1", 0.0, "new-x"));
    state.ingest(&terminal_added("y", "c1", 1.0, "new-y"));

    let rows = outputs_for(&state, "c1");
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["x", "y"]);
    assert!(state.pending_clear("c1").is_none());
}

#[test]
fn immediate_clear_deletes_now() {
    let mut state = State::replay(&[
        created("c1", "m"),
        terminal_added("p", "c1", 0.0, "old"),
    ]);
    state.ingest(&Event::CellOutputsCleared {
        cell_id: "c1".into(),
        wait: false,
        cleared_by: "amy".into(),
    });
    assert!(outputs_for(&state, "c1").is_empty());
    assert!(state.pending_clear("c1").is_none());
}

#[test]
fn repeated_wait_clears_replace_the_marker() {
    let mut state = State::replay(&[created("c1", "m")]);
    for user in ["amy", "bob"] {
        state.ingest(&Event::CellOutputsCleared {
            cell_id: "c1".into(),
            wait: true,
            cleared_by: user.into(),
        });
    }
    assert_eq!(state.pending_clear("c1").unwrap().cleared_by, "bob");
}

// ── Law 11: display-id updates ──────────────────────────────────────────

#[test]
fn display_id_add_updates_in_place_and_appends() {
    let mut state = State::replay(&[created("c1", "m")]);

    state.ingest(&Event::MultimediaDisplayOutputAdded {
        id: "d1".into(),
        cell_id: "c1".into(),
        position: 0.0,
        representations: bundle(&[("text/plain", "r1")]),
        display_id: Some("disp".into()),
    });
    state.ingest(&Event::MultimediaDisplayOutputAdded {
        id: "d2".into(),
        cell_id: "c1".into(),
        position: 1.0,
        representations: bundle(&[("text/plain", "r2")]),
        display_id: Some("disp".into()),
    });

    // Two rows, both re-rendered with the second bundle.
    let rows = outputs_for(&state, "c1");
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.data.as_deref(), Some("r2"));
        assert_eq!(row.mime_type.as_deref(), Some("text/plain"));
    }

    // An update patches both without creating a third.
    state.ingest(&Event::MultimediaDisplayOutputUpdated {
        display_id: "disp".into(),
        representations: bundle(&[("text/plain", "r3")]),
    });
    let rows = outputs_for(&state, "c1");
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.data.as_deref(), Some("r3"));
    }
}

#[test]
fn display_update_for_unknown_id_is_dropped() {
    let mut state = State::replay(&[created("c1", "m")]);
    state.ingest(&Event::MultimediaDisplayOutputUpdated {
        display_id: "nowhere".into(),
        representations: bundle(&[("text/plain", "x")]),
    });
    assert_eq!(state.output_count(), 0);
}

#[test]
fn display_primary_prefers_plotly_over_text() {
    let mut state = State::replay(&[created("c1", "m")]);
    let mut reps = bundle(&[("text/plain", "<Figure>")]);
    reps.insert(
        "application/vnd.plotly.v1+json".into(),
        Representation::inline(json!({"data": [1, 2]})),
    );
    state.ingest(&Event::MultimediaDisplayOutputAdded {
        id: "d1".into(),
        cell_id: "c1".into(),
        position: 0.0,
        representations: reps,
        display_id: None,
    });
    let row = state.output("d1").unwrap();
    assert_eq!(
        row.mime_type.as_deref(),
        Some("application/vnd.plotly.v1+json")
    );
    assert_eq!(row.data.as_deref(), Some(r#"{"data":[1,2]}"#));
}

// ── Law 12: terminal delta reconstruction ───────────────────────────────

#[test]
fn deltas_reconstruct_streamed_content() {
    let mut state = State::replay(&[
        created("c1", "m"),
        terminal_added("o1", "c1", 0.0, "hello"),
    ]);

    // Deliver out of order; reconstruction sorts by sequence number.
    for (id, seq, delta) in [("t2", 2u64, " world"), ("t1", 1, ","), ("t3", 3, "!")] {
        state.ingest(&Event::TerminalOutputAppendedV2 {
            id: id.into(),
            output_id: "o1".into(),
            delta: delta.into(),
            sequence_number: seq,
        });
    }

    let deltas = OutputDeltasForOutput {
        output_id: "o1".into(),
    }
    .run(&state);
    let original = state.output("o1").unwrap().data.clone();
    assert_eq!(
        apply_deltas(original.as_deref(), &deltas),
        "hello, world!"
    );
}

#[test]
fn v1_append_concatenates_into_data() {
    let mut state = State::replay(&[
        created("c1", "m"),
        terminal_added("o1", "c1", 0.0, "a"),
    ]);
    state.ingest(&Event::TerminalOutputAppendedV1 {
        output_id: "o1".into(),
        delta: "bc".into(),
    });
    assert_eq!(state.output("o1").unwrap().data.as_deref(), Some("abc"));

    // v1 and v2 appends coexist on the same output: v1 folds into data,
    // v2 lands in the delta table, and the consumer folds both.
    state.ingest(&Event::TerminalOutputAppendedV2 {
        id: "t1".into(),
        output_id: "o1".into(),
        delta: "d".into(),
        sequence_number: 1,
    });
    let deltas = OutputDeltasForOutput {
        output_id: "o1".into(),
    }
    .run(&state);
    let original = state.output("o1").unwrap().data.clone();
    assert_eq!(apply_deltas(original.as_deref(), &deltas), "abcd");
}

#[test]
fn duplicate_sequence_numbers_are_ignored() {
    let mut state = State::replay(&[
        created("c1", "m"),
        terminal_added("o1", "c1", 0.0, ""),
    ]);
    for id in ["t1", "t1-redelivered"] {
        state.ingest(&Event::TerminalOutputAppendedV2 {
            id: id.into(),
            output_id: "o1".into(),
            delta: "x".into(),
            sequence_number: 1,
        });
    }
    let deltas = OutputDeltasForOutput {
        output_id: "o1".into(),
    }
    .run(&state);
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].id, "t1");
}
