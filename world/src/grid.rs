//! Two-layer tile grid with its placed-object registry.

use simple_lemmings_core::{
    CellCoord, GridSize, ObjectHandle, PlacedObject, StairsDirection, TileId,
};

use crate::registry::ObjectRegistry;

/// Tile layers and placed objects of a level instance.
///
/// The structural layer carries solid ground, stairs, umbrella markers and
/// portals. The detail layer carries cosmetic cliff-edge tiles.
#[derive(Clone, Debug)]
pub struct GridState {
    size: GridSize,
    structural: Vec<Option<TileId>>,
    detail: Vec<Option<TileId>>,
    objects: ObjectRegistry,
}

impl GridState {
    /// Creates an empty grid of the provided size.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            structural: vec![None; size.cell_count()],
            detail: vec![None; size.cell_count()],
            objects: ObjectRegistry::new(size),
        }
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Structural tile at the cell. Out-of-bounds cells are empty.
    #[must_use]
    pub fn structural_at(&self, cell: CellCoord) -> Option<TileId> {
        self.size
            .index(cell)
            .and_then(|index| self.structural.get(index).copied().flatten())
    }

    /// Detail tile at the cell. Out-of-bounds cells are empty.
    #[must_use]
    pub fn detail_at(&self, cell: CellCoord) -> Option<TileId> {
        self.size
            .index(cell)
            .and_then(|index| self.detail.get(index).copied().flatten())
    }

    /// Object registered at the cell, if any.
    #[must_use]
    pub fn placed_at(&self, cell: CellCoord) -> Option<PlacedObject> {
        self.objects.get(cell)
    }

    /// Writes the structural tile. Returns `false` when the cell is out of bounds.
    pub(crate) fn set_structural(&mut self, cell: CellCoord, tile: Option<TileId>) -> bool {
        write_layer(&mut self.structural, self.size, cell, tile)
    }

    /// Writes the detail tile. Returns `false` when the cell is out of bounds.
    pub(crate) fn set_detail(&mut self, cell: CellCoord, tile: Option<TileId>) -> bool {
        write_layer(&mut self.detail, self.size, cell, tile)
    }

    pub(crate) fn place_umbrella(
        &mut self,
        cell: CellCoord,
    ) -> Option<(ObjectHandle, Option<PlacedObject>)> {
        self.objects.place_umbrella(cell)
    }

    pub(crate) fn place_stairs(
        &mut self,
        cell: CellCoord,
        direction: StairsDirection,
    ) -> Option<(ObjectHandle, Option<PlacedObject>)> {
        self.objects.place_stairs(cell, direction)
    }

    pub(crate) fn release(&mut self, cell: CellCoord) -> Option<PlacedObject> {
        self.objects.release(cell)
    }
}

fn write_layer(
    layer: &mut [Option<TileId>],
    size: GridSize,
    cell: CellCoord,
    tile: Option<TileId>,
) -> bool {
    match size.index(cell).and_then(|index| layer.get_mut(index)) {
        Some(slot) => {
            *slot = tile;
            true
        }
        None => false,
    }
}
