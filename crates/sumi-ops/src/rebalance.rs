//! Rebalance planning: detect exhausted gaps and reassign index ranges.

use tracing::debug;

use sumi_events::Event;
use sumi_index::{between, between_jittered, generate, validate_order, IndexError, JitterSource};
use sumi_types::{document_order, CellReference};

use crate::{PlanError, Result};

/// Buffer slots reserved at each end of a rebalanced range. Head and tail
/// insertions after a rebalance land in reserved headroom instead of
/// immediately re-exhausting the boundary gaps.
pub const DEFAULT_BUFFER_CELLS: usize = 2;

/// Knobs for a rebalance run.
pub struct RebalanceOptions<'a> {
    /// Randomness for the freshly generated indices.
    pub jitter: &'a mut dyn JitterSource,
    /// Actor recorded on the emitted move events.
    pub actor_id: Option<String>,
    /// Buffer slots at each end (see [`DEFAULT_BUFFER_CELLS`]).
    pub buffer_cells: usize,
}

/// Outcome of a rebalance: the move events to append, plus the full cell
/// list with its new indices (in document order) for slot arithmetic.
#[derive(Debug)]
pub struct RebalancePlan {
    /// One `v2.CellMoved` per cell whose index actually changed.
    pub events: Vec<Event>,
    /// All cells in document order, carrying their post-rebalance indices.
    pub cells: Vec<CellReference>,
}

impl RebalancePlan {
    /// Number of cells that were reassigned.
    pub fn moved_count(&self) -> usize {
        self.events.len()
    }
}

/// Result of a placement attempt that may have rebalanced on the way.
#[derive(Debug)]
pub struct Placement {
    /// The minted index for the insertion.
    pub index: String,
    /// Whether the surrounding cells had to be reassigned first.
    pub needs_rebalancing: bool,
    /// The reassignment, when one happened.
    pub rebalance: Option<RebalancePlan>,
}

/// Context that lets a failed `between` recover by rebalancing.
pub struct FallbackContext<'a> {
    /// Every cell in the notebook, in document order.
    pub all_cells: &'a [CellReference],
    /// Slot the new index is headed for (0 = before everything,
    /// `all_cells.len()` = after everything).
    pub insert_pos: usize,
    /// Actor recorded on rebalance move events.
    pub actor_id: Option<String>,
    /// Buffer slots at each end of the reassigned range.
    pub buffer_cells: usize,
}

fn sorted(cells: &[CellReference]) -> Vec<CellReference> {
    let mut cells = cells.to_vec();
    cells.sort_by(document_order);
    cells
}

fn index_at(cells: &[CellReference], pos: usize) -> Option<&str> {
    cells.get(pos).and_then(|c| c.fractional_index.as_deref())
}

fn gap_is_exhausted(prev: Option<&str>, next: Option<&str>) -> bool {
    matches!(
        between(prev, next),
        Err(IndexError::EmptyInterval { .. } | IndexError::InvalidRange { .. })
    )
}

/// Check whether any adjacent pair (or the bounding pair of a prospective
/// insertion slot) no longer admits a between-insertion.
///
/// Probes with the zero-jitter algebra: duplicate indices show up as
/// `InvalidRange` and count as exhausted, matching the documented
/// id-tiebreak tolerance for index collisions.
pub fn needs_rebalancing(cells: &[CellReference], insert_pos: Option<usize>) -> bool {
    let cells = sorted(cells);
    for pair in cells.windows(2) {
        if let (Some(a), Some(b)) = (
            pair[0].fractional_index.as_deref(),
            pair[1].fractional_index.as_deref(),
        ) {
            if gap_is_exhausted(Some(a), Some(b)) {
                return true;
            }
        }
    }
    if let Some(pos) = insert_pos {
        let prev = pos.checked_sub(1).and_then(|p| index_at(&cells, p));
        let next = index_at(&cells, pos);
        if (prev.is_some() || next.is_some()) && gap_is_exhausted(prev, next) {
            return true;
        }
    }
    false
}

/// Reassign the whole range to fresh, evenly-spread indices.
///
/// Generates `|cells| + 2 * buffer_cells` indices from scratch and assigns
/// the middle window, so `buffer_cells` unissued slots remain below the first
/// cell and above the last. Cells whose index already matches the fresh
/// assignment are skipped: no event, no churn. Relative order is preserved
/// because assignment walks both sequences in document order; the result is
/// still re-checked and a violation fails loudly rather than corrupting the
/// notebook.
pub fn rebalance(cells: &[CellReference], opts: RebalanceOptions<'_>) -> Result<RebalancePlan> {
    let ordered = sorted(cells);
    let total = ordered.len() + 2 * opts.buffer_cells;
    let fresh = generate(None, None, total, opts.jitter)?;
    let window = &fresh[opts.buffer_cells..opts.buffer_cells + ordered.len()];

    let mut events = Vec::new();
    let mut reassigned = Vec::with_capacity(ordered.len());
    for (cell, index) in ordered.iter().zip(window) {
        if cell.fractional_index.as_deref() != Some(index.as_str()) {
            events.push(Event::CellMovedV2 {
                id: cell.id.clone(),
                fractional_index: index.clone(),
                actor_id: opts.actor_id.clone(),
            });
        }
        reassigned.push(CellReference {
            id: cell.id.clone(),
            cell_type: cell.cell_type,
            fractional_index: Some(index.clone()),
        });
    }

    if let Some(position) = first_order_violation(&reassigned) {
        return Err(PlanError::Index(IndexError::OrderViolation { position }));
    }

    debug!(
        cells = ordered.len(),
        moved = events.len(),
        buffer = opts.buffer_cells,
        "rebalanced cell indices"
    );
    Ok(RebalancePlan {
        events,
        cells: reassigned,
    })
}

fn first_order_violation(cells: &[CellReference]) -> Option<usize> {
    let indices: Vec<&str> = cells
        .iter()
        .filter_map(|c| c.fractional_index.as_deref())
        .collect();
    if validate_order(&indices) {
        None
    } else {
        indices
            .windows(2)
            .position(|pair| pair[0] >= pair[1])
            .map(|p| p + 1)
    }
}

/// `between`, with rebalance-and-retry when the gap is exhausted.
///
/// Without a context the algebra error propagates untouched, and callers that
/// did not opt into rebalancing see exactly what `between` saw. With one, an
/// `EmptyInterval`/`InvalidRange` triggers a full rebalance and the index is
/// recomputed from the *new* indices bounding the original slot.
pub fn between_with_fallback(
    a: Option<&str>,
    b: Option<&str>,
    ctx: Option<FallbackContext<'_>>,
    jitter: &mut dyn JitterSource,
) -> Result<Placement> {
    let err = match between_jittered(a, b, jitter) {
        Ok(index) => {
            return Ok(Placement {
                index,
                needs_rebalancing: false,
                rebalance: None,
            })
        }
        Err(err @ (IndexError::EmptyInterval { .. } | IndexError::InvalidRange { .. })) => err,
        Err(err) => return Err(err.into()),
    };

    let Some(ctx) = ctx else {
        return Err(err.into());
    };
    if !needs_rebalancing(ctx.all_cells, Some(ctx.insert_pos)) {
        return Err(err.into());
    }

    let plan = rebalance(
        ctx.all_cells,
        RebalanceOptions {
            jitter: &mut *jitter,
            actor_id: ctx.actor_id,
            buffer_cells: ctx.buffer_cells,
        },
    )?;
    let prev = ctx
        .insert_pos
        .checked_sub(1)
        .and_then(|p| index_at(&plan.cells, p));
    let next = index_at(&plan.cells, ctx.insert_pos);
    let index = between_jittered(prev, next, jitter)?;
    Ok(Placement {
        index,
        needs_rebalancing: true,
        rebalance: Some(plan),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sumi_index::NoJitter;
    use sumi_types::CellType;

    fn cell(id: &str, index: &str) -> CellReference {
        CellReference::new(id, CellType::Code, index)
    }

    fn crowded() -> Vec<CellReference> {
        vec![
            cell("c1", "m"),
            cell("c2", "m0"),
            cell("c3", "m00"),
            cell("c4", "m000"),
        ]
    }

    fn moved_index(event: &Event) -> &str {
        match event {
            Event::CellMovedV2 {
                fractional_index, ..
            } => fractional_index,
            other => panic!("expected v2.CellMoved, got {other:?}"),
        }
    }

    // ── needs_rebalancing ───────────────────────────────────────────────

    #[test]
    fn test_healthy_list_needs_nothing() {
        let cells = vec![cell("c1", "f"), cell("c2", "m"), cell("c3", "t")];
        assert!(!needs_rebalancing(&cells, None));
        assert!(!needs_rebalancing(&cells, Some(1)));
    }

    #[test]
    fn test_adjacent_pair_detected() {
        assert!(needs_rebalancing(&crowded(), None));
    }

    #[test]
    fn test_duplicate_indices_detected() {
        let cells = vec![cell("c1", "m"), cell("c2", "m")];
        assert!(needs_rebalancing(&cells, None));
    }

    #[test]
    fn test_insert_slot_probed() {
        // Pairs are fine, but the targeted slot is pinched.
        let cells = vec![cell("c1", "m"), cell("c2", "m0h")];
        assert!(!needs_rebalancing(&cells, None));
        // Slot 1 sits between "m" and "m0h", and that gap is fine too.
        assert!(!needs_rebalancing(&cells, Some(1)));

        let pinched = vec![cell("c1", "m"), cell("c2", "m0")];
        assert!(needs_rebalancing(&pinched, Some(1)));
    }

    #[test]
    fn test_empty_list_never_rebalances() {
        assert!(!needs_rebalancing(&[], None));
        assert!(!needs_rebalancing(&[], Some(0)));
    }

    // ── rebalance ───────────────────────────────────────────────────────

    #[test]
    fn test_rebalance_restores_room_everywhere() {
        let mut jitter = NoJitter;
        let plan = rebalance(
            &crowded(),
            RebalanceOptions {
                jitter: &mut jitter,
                actor_id: None,
                buffer_cells: 1,
            },
        )
        .unwrap();

        let indices: Vec<&str> = plan
            .cells
            .iter()
            .map(|c| c.fractional_index.as_deref().unwrap())
            .collect();
        assert!(validate_order(&indices));
        for pair in indices.windows(2) {
            assert!(between(Some(pair[0]), Some(pair[1])).is_ok());
        }
        // Headroom at both ends.
        assert!(between(None, Some(indices[0])).is_ok());
        assert!(between(Some(indices[indices.len() - 1]), None).is_ok());
    }

    #[test]
    fn test_rebalance_preserves_relative_order() {
        let mut jitter = NoJitter;
        let plan = rebalance(
            &crowded(),
            RebalanceOptions {
                jitter: &mut jitter,
                actor_id: None,
                buffer_cells: 2,
            },
        )
        .unwrap();
        let ids: Vec<&str> = plan.cells.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3", "c4"]);
    }

    #[test]
    fn test_rebalance_skips_unchanged_cells() {
        // Cells already sitting exactly on the generated grid produce no
        // events: with buffer 0 and no jitter the grid is m, n, o, ...
        let mut jitter = NoJitter;
        let settled = vec![cell("c1", "m"), cell("c2", "n"), cell("c3", "o")];
        let plan = rebalance(
            &settled,
            RebalanceOptions {
                jitter: &mut jitter,
                actor_id: None,
                buffer_cells: 0,
            },
        )
        .unwrap();
        assert!(plan.events.is_empty(), "no-op rebalance emitted events");
        assert_eq!(plan.moved_count(), 0);
    }

    #[test]
    fn test_rebalance_stamps_actor() {
        let mut jitter = NoJitter;
        let plan = rebalance(
            &crowded(),
            RebalanceOptions {
                jitter: &mut jitter,
                actor_id: Some("amy-rebalance".into()),
                buffer_cells: 1,
            },
        )
        .unwrap();
        assert!(!plan.events.is_empty());
        for ev in &plan.events {
            match ev {
                Event::CellMovedV2 { actor_id, .. } => {
                    assert_eq!(actor_id.as_deref(), Some("amy-rebalance"));
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    // ── between_with_fallback ───────────────────────────────────────────

    #[test]
    fn test_fallback_passthrough_on_success() {
        let mut jitter = NoJitter;
        let placement =
            between_with_fallback(Some("a"), Some("z"), None, &mut jitter).unwrap();
        assert_eq!(placement.index, "m");
        assert!(!placement.needs_rebalancing);
        assert!(placement.rebalance.is_none());
    }

    #[test]
    fn test_fallback_propagates_without_context() {
        let mut jitter = NoJitter;
        let err = between_with_fallback(Some("m"), Some("m0"), None, &mut jitter).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Index(IndexError::EmptyInterval { .. })
        ));
    }

    #[test]
    fn test_fallback_rebalances_and_places_in_new_gap() {
        let cells = crowded();
        let mut jitter = NoJitter;
        // Insert between c2 ("m0") and c3 ("m00"), slot 2.
        let placement = between_with_fallback(
            Some("m0"),
            Some("m00"),
            Some(FallbackContext {
                all_cells: &cells,
                insert_pos: 2,
                actor_id: None,
                buffer_cells: DEFAULT_BUFFER_CELLS,
            }),
            &mut jitter,
        )
        .unwrap();

        assert!(placement.needs_rebalancing);
        let plan = placement.rebalance.as_ref().unwrap();
        assert_eq!(plan.cells.len(), 4);
        let new_c2 = plan.cells[1].fractional_index.as_deref().unwrap();
        let new_c3 = plan.cells[2].fractional_index.as_deref().unwrap();
        assert!(new_c2 < placement.index.as_str() && placement.index.as_str() < new_c3);
    }

    #[test]
    fn test_fallback_events_are_moves_for_all_four() {
        let cells = crowded();
        let mut jitter = NoJitter;
        let placement = between_with_fallback(
            Some("m0"),
            Some("m00"),
            Some(FallbackContext {
                all_cells: &cells,
                insert_pos: 2,
                actor_id: None,
                buffer_cells: 1,
            }),
            &mut jitter,
        )
        .unwrap();
        let plan = placement.rebalance.unwrap();
        // All four crowded cells land on new indices.
        assert_eq!(plan.events.len(), 4);
        let mut seen: Vec<&str> = plan.events.iter().map(moved_index).collect();
        seen.sort_unstable();
        assert!(validate_order(&seen));
    }
}
