#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bridge between discrete agent decisions and world interventions.
//!
//! Agents address the action space as `(column, row, action_index)` where
//! index zero is the no-op and indexes one through six name the interventions
//! in protocol order. The same space is available flattened, with one slot
//! per cell and index at `(row * columns + column) * ACTION_SLOTS + index`.

use serde::{Deserialize, Serialize};
use simple_lemmings_core::{
    Action, CellCoord, Command, Event, GridSize, InterventionOutcome, Rejection, ACTION_COUNT,
};
use simple_lemmings_world::{self as world, query, World};

/// Action indexes per cell, including the no-op at index zero.
pub const ACTION_SLOTS: usize = ACTION_COUNT + 1;

/// Three-branch decision supplied by an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentDecision {
    /// Column of the targeted cell.
    pub column: u32,
    /// Row of the targeted cell.
    pub row: u32,
    /// Zero for the no-op, otherwise the 1-based action index.
    pub action_index: usize,
}

impl AgentDecision {
    /// Creates a decision targeting the provided cell.
    #[must_use]
    pub const fn new(cell: CellCoord, action_index: usize) -> Self {
        Self {
            column: cell.column(),
            row: cell.row(),
            action_index,
        }
    }

    /// Decision that spends nothing on the grid.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            column: 0,
            row: 0,
            action_index: 0,
        }
    }

    /// Cell targeted by the decision.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.column, self.row)
    }
}

/// Result of a decision that was not rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The decision was the no-op.
    Idle,
    /// The intervention mutated the grid.
    Applied(InterventionOutcome),
}

/// Validates the decision and forwards it to the world as an intervention.
///
/// Rejections are returned as values and leave the world untouched. Events
/// produced by the world are appended to `out_events`.
pub fn dispatch(
    world: &mut World,
    cell: CellCoord,
    action_index: usize,
    out_events: &mut Vec<Event>,
) -> Result<Dispatch, Rejection> {
    if action_index == 0 {
        return Ok(Dispatch::Idle);
    }
    let Some(action) = Action::from_index(action_index) else {
        tracing::debug!(target: "dispatch", action_index, "unknown action index");
        return Err(Rejection::UnknownAction {
            index: action_index,
        });
    };

    let first = out_events.len();
    world::apply(world, Command::Intervene { cell, action }, out_events);
    out_events[first..]
        .iter()
        .find_map(|event| match event {
            Event::InterventionApplied { outcome } => Some(Ok(Dispatch::Applied(outcome.clone()))),
            Event::InterventionRejected { reason } => Some(Err(*reason)),
            _ => None,
        })
        .unwrap_or(Err(Rejection::IllegalAction { cell, action }))
}

/// Dispatches a three-branch agent decision.
pub fn dispatch_decision(
    world: &mut World,
    decision: AgentDecision,
    out_events: &mut Vec<Event>,
) -> Result<Dispatch, Rejection> {
    dispatch(world, decision.cell(), decision.action_index, out_events)
}

/// Flat legality mask over every cell and action index. Index zero is always legal.
#[must_use]
pub fn flat_action_mask(world: &World) -> Vec<bool> {
    query::legal_action_grid(world)
        .into_iter()
        .flat_map(|mask| {
            let mut slots = [false; ACTION_SLOTS];
            slots[0] = true;
            slots[1..].copy_from_slice(mask.as_array());
            slots
        })
        .collect()
}

/// Flat index of the decision, if it addresses a cell inside the grid.
#[must_use]
pub fn flat_action_index(size: GridSize, decision: AgentDecision) -> Option<usize> {
    if decision.action_index >= ACTION_SLOTS {
        return None;
    }
    size.index(decision.cell())
        .map(|cell| cell * ACTION_SLOTS + decision.action_index)
}

/// Inverse of [`flat_action_index`].
#[must_use]
pub fn decode_flat_action(size: GridSize, index: usize) -> Option<AgentDecision> {
    let cell = size.cell_at(index / ACTION_SLOTS)?;
    Some(AgentDecision::new(cell, index % ACTION_SLOTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_lemmings_core::{CreatureTuning, LevelDescription};

    fn sample_world() -> World {
        World::from_description(&LevelDescription::sample(), CreatureTuning::default())
            .expect("sample level")
    }

    #[test]
    fn flat_mask_layout_matches_per_cell_legality() {
        let world = sample_world();
        let size = query::grid_size(&world);
        let mask = flat_action_mask(&world);
        assert_eq!(mask.len(), size.cell_count() * ACTION_SLOTS);

        for (index, legal) in mask.iter().enumerate() {
            let decision = decode_flat_action(size, index).expect("inside grid");
            assert_eq!(flat_action_index(size, decision), Some(index));
            match Action::from_index(decision.action_index) {
                None => assert!(*legal),
                Some(action) => assert_eq!(
                    *legal,
                    query::legal_actions(&world, decision.cell()).allows(action)
                ),
            }
        }
    }

    #[test]
    fn flat_index_follows_row_major_layout() {
        let size = GridSize::new(16, 8);
        let decision = AgentDecision::new(CellCoord::new(5, 3), 1);
        let expected = (3 * 16 + 5) * 7 + 1;
        assert_eq!(flat_action_index(size, decision), Some(expected));
        assert_eq!(
            flat_action_index(size, AgentDecision::new(CellCoord::new(16, 0), 1)),
            None
        );
        assert_eq!(
            flat_action_index(size, AgentDecision::new(CellCoord::new(0, 0), 7)),
            None
        );
        assert_eq!(decode_flat_action(size, 16 * 8 * 7), None);
    }

    #[test]
    fn idle_decision_is_a_no_op() {
        let mut world = sample_world();
        let mut events = Vec::new();
        let result = dispatch_decision(&mut world, AgentDecision::idle(), &mut events);
        assert_eq!(result, Ok(Dispatch::Idle));
        assert!(events.is_empty());
    }
}
