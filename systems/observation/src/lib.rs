#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Flat numeric observation of the world for learning agents.
//!
//! The encoding starts with the creature's grid cell, `(-1, -1)` when no
//! living creature exists, followed by one one-hot block of
//! [`CELL_CLASS_COUNT`] slots per cell in row-major order from the bottom row.

use simple_lemmings_core::{CellCoord, CreaturePhase, GridSize, PlacedObject, StairsDirection};
use simple_lemmings_world::{query, World};

/// Number of slots describing a single cell.
pub const CELL_CLASS_COUNT: usize = 8;

/// Number of leading slots holding the creature's cell.
pub const CREATURE_PREFIX_LEN: usize = 2;

/// Classification of a cell's structural-layer tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellClass {
    /// Nothing solid or interactive.
    Empty,
    /// Solid ground that cannot be broken.
    HardStructural,
    /// Solid ground that can be broken.
    SoftStructural,
    /// Tile that kills the creature.
    Damaging,
    /// Level exit.
    Portal,
    /// Placed umbrella.
    UmbrellaMarker,
    /// Built stair rising to the right.
    StairsRight,
    /// Built stair rising to the left.
    StairsLeft,
}

impl CellClass {
    /// Every class, ordered by slot.
    pub const ALL: [CellClass; CELL_CLASS_COUNT] = [
        CellClass::Empty,
        CellClass::HardStructural,
        CellClass::SoftStructural,
        CellClass::Damaging,
        CellClass::Portal,
        CellClass::UmbrellaMarker,
        CellClass::StairsRight,
        CellClass::StairsLeft,
    ];

    /// Slot set to one in the cell's block.
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }
}

/// Length of the observation for a grid of the provided size.
#[must_use]
pub fn observation_len(size: GridSize) -> usize {
    CREATURE_PREFIX_LEN + CELL_CLASS_COUNT * size.cell_count()
}

/// Classifies the structural tile at the cell.
///
/// Returns `None` outside the grid and for stairs tiles that have no registry
/// entry, whose direction cannot be recovered.
#[must_use]
pub fn classify_cell(world: &World, cell: CellCoord) -> Option<CellClass> {
    if !query::grid_size(world).contains(cell) {
        return None;
    }
    let Some(facets) = query::structural_facets(world, cell) else {
        return Some(CellClass::Empty);
    };

    let class = if facets.umbrella_marker {
        CellClass::UmbrellaMarker
    } else if facets.demolishable {
        match query::placed_at(world, cell) {
            Some(PlacedObject::Stairs {
                direction: StairsDirection::Right,
                ..
            }) => CellClass::StairsRight,
            Some(PlacedObject::Stairs {
                direction: StairsDirection::Left,
                ..
            }) => CellClass::StairsLeft,
            other => {
                tracing::debug!(
                    target: "observation",
                    column = cell.column(),
                    row = cell.row(),
                    registered = ?other,
                    "stairs tile without registry entry"
                );
                return None;
            }
        }
    } else if facets.portal {
        CellClass::Portal
    } else if facets.damaging {
        CellClass::Damaging
    } else if facets.structural && facets.destructible {
        CellClass::SoftStructural
    } else if facets.structural {
        CellClass::HardStructural
    } else {
        CellClass::Empty
    };
    Some(class)
}

/// Encodes the creature cell and every cell of the grid.
#[must_use]
pub fn encode(world: &World) -> Vec<f32> {
    let size = query::grid_size(world);
    let mut observation = Vec::with_capacity(observation_len(size));

    let creature_cell = query::creature(world)
        .filter(|creature| creature.phase != CreaturePhase::Dead)
        .and_then(|creature| creature.cell());
    match creature_cell {
        Some(cell) => observation.extend([cell.column() as f32, cell.row() as f32]),
        None => observation.extend([-1.0, -1.0]),
    }

    for cell in size.cells() {
        let mut slots = [0.0; CELL_CLASS_COUNT];
        if let Some(class) = classify_cell(world, cell) {
            slots[class.slot()] = 1.0;
        }
        observation.extend(slots);
    }
    observation
}

/// Decodes a cell block back into its class. All-zero or malformed blocks decode to `None`.
#[must_use]
pub fn decode_cell(slots: &[f32]) -> Option<CellClass> {
    if slots.len() != CELL_CLASS_COUNT {
        return None;
    }
    let mut hot = slots
        .iter()
        .enumerate()
        .filter(|(_, value)| **value != 0.0)
        .map(|(slot, _)| slot);
    match (hot.next(), hot.next()) {
        (Some(slot), None) => CellClass::ALL.get(slot).copied(),
        _ => None,
    }
}

/// Cell block of the encoded observation for the cell at `index` in row-major order.
#[must_use]
pub fn cell_block(observation: &[f32], index: usize) -> Option<&[f32]> {
    let start = CREATURE_PREFIX_LEN + index * CELL_CLASS_COUNT;
    observation.get(start..start + CELL_CLASS_COUNT)
}
