//! Application of interventions to the grid.

use simple_lemmings_core::{
    Action, CellCoord, InterventionOutcome, ObjectHandle, PlacedObject, Rejection, StairsDirection,
};

use crate::{grid::GridState, legality::legal_actions, tiles::TileCatalog};

/// Re-validates and applies the intervention, mutating at most two cells.
pub(crate) fn apply(
    grid: &mut GridState,
    catalog: &TileCatalog,
    cell: CellCoord,
    action: Action,
) -> Result<InterventionOutcome, Rejection> {
    if !legal_actions(grid, catalog, cell).allows(action) {
        return Err(Rejection::IllegalAction { cell, action });
    }

    let mut outcome = InterventionOutcome {
        action,
        cell,
        placed: None,
        released: None,
        touched: vec![cell],
    };

    match action {
        Action::Break => break_block(grid, catalog, cell, &mut outcome),
        Action::PlaceUmbrella => {
            let _ = grid.set_structural(cell, Some(catalog.roles().umbrella));
            outcome.placed = register(grid.place_umbrella(cell), cell);
        }
        Action::BuildRightStairs => {
            build_stairs(grid, catalog, cell, StairsDirection::Right, &mut outcome);
        }
        Action::BuildLeftStairs => {
            build_stairs(grid, catalog, cell, StairsDirection::Left, &mut outcome);
        }
        Action::Demolish => {
            let _ = grid.set_structural(cell, None);
            outcome.released = release(grid, cell, action);
        }
        Action::RemoveUmbrella => {
            let _ = grid.set_structural(cell, None);
            outcome.released = release(grid, cell, action);
        }
    }

    tracing::debug!(
        target: "world::mutator",
        ?action,
        column = cell.column(),
        row = cell.row(),
        placed = ?outcome.placed,
        released = ?outcome.released,
        "intervention applied"
    );
    Ok(outcome)
}

fn break_block(
    grid: &mut GridState,
    catalog: &TileCatalog,
    cell: CellCoord,
    outcome: &mut InterventionOutcome,
) {
    let ledge_below = cell
        .below()
        .and_then(|below| grid.structural_at(below))
        .map_or(false, |tile| catalog.facets(tile).structural);

    let _ = grid.set_structural(cell, None);
    let _ = grid.set_detail(cell, None);
    if grid.placed_at(cell).is_some() {
        outcome.released = grid.release(cell).map(|object| object.handle());
    }

    // The ledge lost its top row, so the edge marker resting on it is stale.
    if let Some(above) = cell.above() {
        let stale = grid
            .detail_at(above)
            .map_or(false, |tile| catalog.facets(tile).top_detail);
        if stale {
            let _ = grid.set_detail(above, None);
            outcome.touched.push(above);
        }
    }

    if ledge_below {
        let _ = grid.set_detail(cell, Some(catalog.roles().top_detail));
    }
}

fn build_stairs(
    grid: &mut GridState,
    catalog: &TileCatalog,
    cell: CellCoord,
    direction: StairsDirection,
    outcome: &mut InterventionOutcome,
) {
    outcome.placed = register(grid.place_stairs(cell, direction), cell);
    let _ = grid.set_structural(cell, Some(catalog.roles().stairs(direction)));
}

fn register(
    placed: Option<(ObjectHandle, Option<PlacedObject>)>,
    cell: CellCoord,
) -> Option<ObjectHandle> {
    let (handle, displaced) = placed?;
    if let Some(displaced) = displaced {
        tracing::warn!(
            target: "world::mutator",
            column = cell.column(),
            row = cell.row(),
            ?displaced,
            "empty cell still had a registered object; replaced it"
        );
    }
    Some(handle)
}

fn release(grid: &mut GridState, cell: CellCoord, action: Action) -> Option<ObjectHandle> {
    let released = grid.release(cell);
    let expected = match (action, released) {
        (Action::Demolish, Some(PlacedObject::Stairs { .. })) => true,
        (Action::RemoveUmbrella, Some(PlacedObject::Umbrella { .. })) => true,
        _ => false,
    };
    if !expected {
        tracing::warn!(
            target: "world::mutator",
            ?action,
            column = cell.column(),
            row = cell.row(),
            ?released,
            "missing registry entry for cleared tile"
        );
    }
    released.map(|object| object.handle())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use simple_lemmings_core::{GridSize, LevelDescription};

    fn sample() -> (Level, GridState) {
        let level = Level::from_description(&LevelDescription::sample()).expect("sample level");
        let grid = level.initial_grid().clone();
        (level, grid)
    }

    #[test]
    fn break_exposes_new_ledge_and_clears_stale_marker() {
        let (level, mut grid) = sample();
        let soil = CellCoord::new(5, 3);
        let marker = CellCoord::new(5, 4);
        assert!(grid.detail_at(marker).is_some());

        let outcome = apply(&mut grid, level.catalog(), soil, Action::Break).expect("legal");

        assert_eq!(grid.structural_at(soil), None);
        assert_eq!(grid.detail_at(marker), None);
        let top_detail = level.catalog().roles().top_detail;
        assert_eq!(grid.detail_at(soil), Some(top_detail));
        assert_eq!(outcome.touched, vec![soil, marker]);
    }

    #[test]
    fn break_without_structure_below_leaves_no_marker() {
        let (level, _) = sample();
        let soil = level.catalog().id_of("soil");
        let mut grid = GridState::new(GridSize::new(2, 2));
        let cell = CellCoord::new(0, 1);
        let _ = grid.set_structural(cell, soil);

        let _ = apply(&mut grid, level.catalog(), cell, Action::Break).expect("legal");
        assert_eq!(grid.detail_at(cell), None);
    }

    #[test]
    fn umbrella_round_trip_releases_its_handle() {
        let (level, mut grid) = sample();
        let cell = CellCoord::new(9, 6);

        let placed = apply(&mut grid, level.catalog(), cell, Action::PlaceUmbrella).expect("legal");
        let handle = placed.placed.expect("handle");
        assert_eq!(
            grid.placed_at(cell),
            Some(PlacedObject::Umbrella { handle })
        );
        assert_eq!(
            grid.structural_at(cell),
            Some(level.catalog().roles().umbrella)
        );

        let removed =
            apply(&mut grid, level.catalog(), cell, Action::RemoveUmbrella).expect("legal");
        assert_eq!(removed.released, Some(handle));
        assert_eq!(grid.placed_at(cell), None);
        assert_eq!(grid.structural_at(cell), None);
    }

    #[test]
    fn stairs_register_direction_and_demolish_releases() {
        let (level, mut grid) = sample();
        let cell = CellCoord::new(7, 3);

        let built =
            apply(&mut grid, level.catalog(), cell, Action::BuildRightStairs).expect("legal");
        let handle = built.placed.expect("handle");
        assert_eq!(
            grid.placed_at(cell),
            Some(PlacedObject::Stairs {
                handle,
                direction: StairsDirection::Right,
            })
        );

        let demolished = apply(&mut grid, level.catalog(), cell, Action::Demolish).expect("legal");
        assert_eq!(demolished.released, Some(handle));
        assert_eq!(grid.structural_at(cell), None);
    }

    #[test]
    fn demolish_without_registry_entry_still_clears_tile() {
        let (level, _) = sample();
        let mut grid = GridState::new(GridSize::new(2, 2));
        let cell = CellCoord::new(1, 1);
        let _ = grid.set_structural(cell, Some(level.catalog().roles().stairs_left));

        let outcome = apply(&mut grid, level.catalog(), cell, Action::Demolish).expect("legal");
        assert_eq!(outcome.released, None);
        assert_eq!(grid.structural_at(cell), None);
    }

    #[test]
    fn stale_requests_are_rejected_without_mutation() {
        let (level, mut grid) = sample();
        let cell = CellCoord::new(5, 3);
        let _ = apply(&mut grid, level.catalog(), cell, Action::Break).expect("legal");
        let snapshot = grid.clone();

        let error = apply(&mut grid, level.catalog(), cell, Action::Break).expect_err("stale");
        assert_eq!(
            error,
            Rejection::IllegalAction {
                cell,
                action: Action::Break,
            }
        );
        assert_eq!(grid.detail_at(cell), snapshot.detail_at(cell));
        assert_eq!(grid.structural_at(cell), snapshot.structural_at(cell));
    }
}
