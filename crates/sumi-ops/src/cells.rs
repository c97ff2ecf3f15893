//! Cell placement operations returning event batches.

use sumi_events::Event;
use sumi_index::{between_jittered, JitterSource};
use sumi_types::{CellReference, CellType};

use crate::rebalance::{between_with_fallback, FallbackContext, DEFAULT_BUFFER_CELLS};
use crate::Result;

/// Payload for a cell about to be created.
#[derive(Clone, Debug)]
pub struct NewCell {
    pub id: String,
    pub cell_type: CellType,
    pub created_by: String,
}

/// Batch returned by [`create_cell_between`]: the events to append, in order.
#[derive(Debug)]
pub struct CellCreation {
    /// Rebalance moves (if any) followed by the `v2.CellCreated`.
    pub events: Vec<Event>,
    /// Id of the created cell.
    pub new_cell_id: String,
    /// Index the new cell landed on.
    pub fractional_index: String,
    /// Whether the insertion forced a rebalance.
    pub needs_rebalancing: bool,
    /// How many existing cells were reassigned (0 when none).
    pub rebalance_count: usize,
}

/// Batch returned by [`move_cell_between_with_rebalancing`].
#[derive(Debug)]
pub struct CellMove {
    /// Rebalance moves (if any) followed by the final `v2.CellMoved`.
    /// Empty when the move was a no-op.
    pub events: Vec<Event>,
    /// Whether the move forced a rebalance.
    pub needs_rebalancing: bool,
}

fn index_of(cells: &[CellReference], id: &str) -> Option<usize> {
    cells.iter().position(|c| c.id == id)
}

/// Resolve neighbour references into `(prev, next)` index bounds plus the
/// insertion slot in `all_cells`.
///
/// With neither neighbour given and a non-empty notebook, the insertion
/// defaults to after the greatest existing index (append).
fn resolve_bounds<'a>(
    before: Option<&'a CellReference>,
    after: Option<&'a CellReference>,
    all_cells: &'a [CellReference],
) -> (Option<&'a str>, Option<&'a str>, usize) {
    let mut prev = before.and_then(|c| c.fractional_index.as_deref());
    let next = after.and_then(|c| c.fractional_index.as_deref());

    if before.is_none() && after.is_none() && !all_cells.is_empty() {
        prev = all_cells
            .iter()
            .filter_map(|c| c.fractional_index.as_deref())
            .max();
    }

    let insert_pos = if let Some(b) = before {
        index_of(all_cells, &b.id)
            .map(|p| p + 1)
            .unwrap_or(all_cells.len())
    } else if let Some(a) = after {
        index_of(all_cells, &a.id).unwrap_or(all_cells.len())
    } else {
        all_cells.len()
    };

    (prev, next, insert_pos)
}

/// Create a cell between two neighbours, rebalancing the notebook when the
/// gap between them is exhausted.
///
/// `all_cells` must be the full cell list in document order; it is consulted
/// for the append default, the insertion slot, and the rebalance fallback.
/// The returned events are appended to the log as one batch: any rebalance
/// moves first, then the creation.
pub fn create_cell_between(
    cell: NewCell,
    before: Option<&CellReference>,
    after: Option<&CellReference>,
    all_cells: &[CellReference],
    jitter: &mut dyn JitterSource,
) -> Result<CellCreation> {
    let (prev, next, insert_pos) = resolve_bounds(before, after, all_cells);

    let placement = between_with_fallback(
        prev,
        next,
        Some(FallbackContext {
            all_cells,
            insert_pos,
            actor_id: Some(format!("{}-rebalance", cell.created_by)),
            buffer_cells: DEFAULT_BUFFER_CELLS,
        }),
        jitter,
    )?;

    let rebalance_count = placement
        .rebalance
        .as_ref()
        .map(|plan| plan.moved_count())
        .unwrap_or(0);
    let mut events = placement
        .rebalance
        .map(|plan| plan.events)
        .unwrap_or_default();
    events.push(Event::CellCreatedV2 {
        id: cell.id.clone(),
        fractional_index: placement.index.clone(),
        cell_type: cell.cell_type,
        created_by: cell.created_by,
    });

    Ok(CellCreation {
        events,
        new_cell_id: cell.id,
        fractional_index: placement.index,
        needs_rebalancing: placement.needs_rebalancing,
        rebalance_count,
    })
}

/// True when the cell already sits inside the supplied bounds, making the
/// move a no-op.
fn already_in_place(current: &str, prev: Option<&str>, next: Option<&str>) -> bool {
    prev.map_or(true, |p| p < current) && next.map_or(true, |n| current < n)
}

/// Move a cell between two neighbours.
///
/// Returns `None` when there is nothing to do: the cell has no index yet
/// (it was never placed), or the supplied bounds already straddle its
/// current index. Otherwise returns the single `v2.CellMoved` to append.
pub fn move_cell_between(
    cell: &CellReference,
    before: Option<&CellReference>,
    after: Option<&CellReference>,
    actor_id: Option<&str>,
    jitter: &mut dyn JitterSource,
) -> Result<Option<Event>> {
    let Some(current) = cell.fractional_index.as_deref() else {
        return Ok(None);
    };
    let prev = before.and_then(|c| c.fractional_index.as_deref());
    let next = after.and_then(|c| c.fractional_index.as_deref());
    if already_in_place(current, prev, next) {
        return Ok(None);
    }

    let index = between_jittered(prev, next, jitter)?;
    Ok(Some(Event::CellMovedV2 {
        id: cell.id.clone(),
        fractional_index: index,
        actor_id: actor_id.map(str::to_owned),
    }))
}

/// [`move_cell_between`] with the same rebalance fallback as creation.
pub fn move_cell_between_with_rebalancing(
    cell: &CellReference,
    before: Option<&CellReference>,
    after: Option<&CellReference>,
    all_cells: &[CellReference],
    actor_id: Option<&str>,
    jitter: &mut dyn JitterSource,
) -> Result<CellMove> {
    let Some(current) = cell.fractional_index.as_deref() else {
        return Ok(CellMove {
            events: Vec::new(),
            needs_rebalancing: false,
        });
    };
    let prev = before.and_then(|c| c.fractional_index.as_deref());
    let next = after.and_then(|c| c.fractional_index.as_deref());
    if already_in_place(current, prev, next) {
        return Ok(CellMove {
            events: Vec::new(),
            needs_rebalancing: false,
        });
    }

    let insert_pos = if let Some(b) = before {
        index_of(all_cells, &b.id)
            .map(|p| p + 1)
            .unwrap_or(all_cells.len())
    } else if let Some(a) = after {
        index_of(all_cells, &a.id).unwrap_or(all_cells.len())
    } else {
        all_cells.len()
    };

    let placement = between_with_fallback(
        prev,
        next,
        Some(FallbackContext {
            all_cells,
            insert_pos,
            actor_id: actor_id.map(|a| format!("{a}-rebalance")),
            buffer_cells: DEFAULT_BUFFER_CELLS,
        }),
        jitter,
    )?;

    let mut events = placement
        .rebalance
        .map(|plan| plan.events)
        .unwrap_or_default();
    events.push(Event::CellMovedV2 {
        id: cell.id.clone(),
        fractional_index: placement.index,
        actor_id: actor_id.map(str::to_owned),
    });

    Ok(CellMove {
        events,
        needs_rebalancing: placement.needs_rebalancing,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sumi_index::NoJitter;

    fn cell(id: &str, index: &str) -> CellReference {
        CellReference::new(id, CellType::Code, index)
    }

    fn new_cell(id: &str) -> NewCell {
        NewCell {
            id: id.into(),
            cell_type: CellType::Code,
            created_by: "amy".into(),
        }
    }

    // ── create_cell_between ─────────────────────────────────────────────

    #[test]
    fn test_create_into_empty_notebook() {
        let mut jitter = NoJitter;
        let creation = create_cell_between(new_cell("c1"), None, None, &[], &mut jitter).unwrap();
        assert_eq!(creation.fractional_index, "m");
        assert_eq!(creation.events.len(), 1);
        assert!(!creation.needs_rebalancing);
        assert_eq!(creation.rebalance_count, 0);
        assert!(matches!(
            &creation.events[0],
            Event::CellCreatedV2 { id, fractional_index, .. }
                if id == "c1" && fractional_index == "m"
        ));
    }

    #[test]
    fn test_create_defaults_to_append() {
        let cells = vec![cell("c1", "m"), cell("c2", "n")];
        let mut jitter = NoJitter;
        let creation =
            create_cell_between(new_cell("c3"), None, None, &cells, &mut jitter).unwrap();
        assert!(creation.fractional_index.as_str() > "n");
    }

    #[test]
    fn test_create_between_neighbours() {
        let cells = vec![cell("c1", "m"), cell("c2", "n")];
        let mut jitter = NoJitter;
        let creation = create_cell_between(
            new_cell("c3"),
            Some(&cells[0]),
            Some(&cells[1]),
            &cells,
            &mut jitter,
        )
        .unwrap();
        assert!("m" < creation.fractional_index.as_str());
        assert!(creation.fractional_index.as_str() < "n");
        assert_eq!(creation.events.len(), 1);
    }

    #[test]
    fn test_create_in_exhausted_gap_rebalances() {
        let cells = vec![
            cell("c1", "m"),
            cell("c2", "m0"),
            cell("c3", "m00"),
            cell("c4", "m000"),
        ];
        let mut jitter = NoJitter;
        let creation = create_cell_between(
            new_cell("cNew"),
            Some(&cells[1]),
            Some(&cells[2]),
            &cells,
            &mut jitter,
        )
        .unwrap();

        assert!(creation.needs_rebalancing);
        assert!(creation.rebalance_count >= 1);
        // Moves first, creation last.
        let (last, moves) = creation.events.split_last().unwrap();
        assert!(matches!(last, Event::CellCreatedV2 { .. }));
        let mut new_c2 = None;
        let mut new_c3 = None;
        for ev in moves {
            match ev {
                Event::CellMovedV2 {
                    id,
                    fractional_index,
                    actor_id,
                } => {
                    assert_eq!(actor_id.as_deref(), Some("amy-rebalance"));
                    if id == "c2" {
                        new_c2 = Some(fractional_index.clone());
                    }
                    if id == "c3" {
                        new_c3 = Some(fractional_index.clone());
                    }
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        let (new_c2, new_c3) = (new_c2.unwrap(), new_c3.unwrap());
        assert!(
            new_c2 < creation.fractional_index && creation.fractional_index < new_c3,
            "{new_c2} < {} < {new_c3} violated",
            creation.fractional_index
        );
    }

    // ── move_cell_between ───────────────────────────────────────────────

    #[test]
    fn test_move_unplaced_cell_is_noop() {
        let bare = CellReference {
            id: "c1".into(),
            cell_type: CellType::Code,
            fractional_index: None,
        };
        let mut jitter = NoJitter;
        let ev = move_cell_between(&bare, None, None, None, &mut jitter).unwrap();
        assert!(ev.is_none());
    }

    #[test]
    fn test_move_already_in_place_is_noop() {
        let a = cell("a", "f");
        let b = cell("b", "m");
        let c = cell("c", "t");
        let mut jitter = NoJitter;
        let ev = move_cell_between(&b, Some(&a), Some(&c), None, &mut jitter).unwrap();
        assert!(ev.is_none());
    }

    #[test]
    fn test_move_emits_single_event() {
        let a = cell("a", "f");
        let b = cell("b", "m");
        let c = cell("c", "t");
        // Move c between a and b.
        let mut jitter = NoJitter;
        let ev = move_cell_between(&c, Some(&a), Some(&b), Some("amy"), &mut jitter)
            .unwrap()
            .expect("move should produce an event");
        match ev {
            Event::CellMovedV2 {
                id,
                fractional_index,
                actor_id,
            } => {
                assert_eq!(id, "c");
                assert!("f" < fractional_index.as_str() && fractional_index.as_str() < "m");
                assert_eq!(actor_id.as_deref(), Some("amy"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_move_with_rebalancing_falls_back() {
        let cells = vec![
            cell("c1", "m"),
            cell("c2", "m0"),
            cell("c3", "m00"),
            cell("c4", "m000"),
        ];
        let mut jitter = NoJitter;
        // Move c4 between c1 and c2; the pinched gap forces a rebalance.
        let outcome = move_cell_between_with_rebalancing(
            &cells[3],
            Some(&cells[0]),
            Some(&cells[1]),
            &cells,
            Some("amy"),
            &mut jitter,
        )
        .unwrap();
        assert!(outcome.needs_rebalancing);
        let (last, moves) = outcome.events.split_last().unwrap();
        assert!(matches!(last, Event::CellMovedV2 { actor_id, .. }
            if actor_id.as_deref() == Some("amy")));
        assert!(!moves.is_empty());
        for ev in moves {
            assert!(matches!(ev, Event::CellMovedV2 { actor_id, .. }
                if actor_id.as_deref() == Some("amy-rebalance")));
        }
    }

    #[test]
    fn test_move_with_rebalancing_noop_passthrough() {
        let cells = vec![cell("c1", "f"), cell("c2", "m")];
        let mut jitter = NoJitter;
        let outcome = move_cell_between_with_rebalancing(
            &cells[1],
            Some(&cells[0]),
            None,
            &cells,
            None,
            &mut jitter,
        )
        .unwrap();
        assert!(outcome.events.is_empty());
        assert!(!outcome.needs_rebalancing);
    }
}
