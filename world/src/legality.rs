//! Per-cell legality of interventions.
//!
//! Legality is a pure function of the grid: an occupied cell may only be
//! broken, demolished or cleared of its umbrella, while an empty cell may
//! only receive an umbrella or a stair. Cells outside the grid have no legal
//! actions, so neighbour lookups at the edges degrade to "empty" without
//! special casing.

use simple_lemmings_core::{Action, ActionMask, CellCoord, TileFacets};

use crate::{grid::GridState, tiles::TileCatalog};

/// Computes the legality vector of a single cell.
#[must_use]
pub(crate) fn legal_actions(
    grid: &GridState,
    catalog: &TileCatalog,
    cell: CellCoord,
) -> ActionMask {
    let mut mask = ActionMask::NONE;
    if !grid.size().contains(cell) {
        return mask;
    }

    let facets_at = |neighbour: Option<CellCoord>| -> Option<TileFacets> {
        neighbour
            .and_then(|neighbour| grid.structural_at(neighbour))
            .map(|tile| catalog.facets(tile))
    };

    if let Some(occupant) = facets_at(Some(cell)) {
        mask.set(Action::Break, occupant.destructible);
        mask.set(Action::Demolish, occupant.demolishable);
        mask.set(Action::RemoveUmbrella, occupant.umbrella_marker);
        return mask;
    }

    let below = facets_at(cell.below());
    mask.set(
        Action::PlaceUmbrella,
        below.map_or(true, |facets| !facets.structural),
    );

    let no_structure_above = facets_at(cell.above()).map_or(true, |facets| !facets.structural);
    if no_structure_above {
        let supports_stairs = |facets: Option<TileFacets>| {
            facets.map_or(false, |facets| facets.structural || facets.demolishable)
        };
        mask.set(
            Action::BuildRightStairs,
            supports_stairs(facets_at(cell.offset(-1, -1))),
        );
        mask.set(
            Action::BuildLeftStairs,
            supports_stairs(facets_at(cell.offset(1, -1))),
        );
    }

    mask
}

/// Computes the legality vector of every cell in row-major order.
#[must_use]
pub(crate) fn legal_action_grid(grid: &GridState, catalog: &TileCatalog) -> Vec<ActionMask> {
    grid.size()
        .cells()
        .map(|cell| legal_actions(grid, catalog, cell))
        .collect()
}
