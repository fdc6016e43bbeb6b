//! Placed-object state management utilities.

use simple_lemmings_core::{CellCoord, GridSize, ObjectHandle, PlacedObject, StairsDirection};

/// Arena of objects placed by interventions, indexed by packed cell key.
///
/// A slot holds at most one object, so umbrellas and stairs never share a
/// cell.
#[derive(Clone, Debug)]
pub(crate) struct ObjectRegistry {
    size: GridSize,
    slots: Vec<Option<PlacedObject>>,
    next_handle: ObjectHandle,
}

impl ObjectRegistry {
    /// Creates an empty registry with a reset handle counter.
    pub(crate) fn new(size: GridSize) -> Self {
        Self {
            size,
            slots: vec![None; size.cell_count()],
            next_handle: ObjectHandle::new(0),
        }
    }

    /// Object registered at the cell, if any.
    pub(crate) fn get(&self, cell: CellCoord) -> Option<PlacedObject> {
        self.size
            .index(cell)
            .and_then(|index| self.slots.get(index).copied().flatten())
    }

    /// Registers an umbrella at the cell and returns its handle.
    pub(crate) fn place_umbrella(
        &mut self,
        cell: CellCoord,
    ) -> Option<(ObjectHandle, Option<PlacedObject>)> {
        let handle = self.allocate();
        self.store(cell, PlacedObject::Umbrella { handle })
            .map(|displaced| (handle, displaced))
    }

    /// Registers a stair at the cell and returns its handle.
    pub(crate) fn place_stairs(
        &mut self,
        cell: CellCoord,
        direction: StairsDirection,
    ) -> Option<(ObjectHandle, Option<PlacedObject>)> {
        let handle = self.allocate();
        self.store(cell, PlacedObject::Stairs { handle, direction })
            .map(|displaced| (handle, displaced))
    }

    /// Removes and returns the object registered at the cell.
    pub(crate) fn release(&mut self, cell: CellCoord) -> Option<PlacedObject> {
        let index = self.size.index(cell)?;
        self.slots.get_mut(index).and_then(Option::take)
    }

    fn allocate(&mut self) -> ObjectHandle {
        let handle = self.next_handle;
        self.next_handle = ObjectHandle::new(handle.get().saturating_add(1));
        handle
    }

    /// Writes the object into the slot, yielding whatever it displaced.
    /// Returns `None` when the cell lies outside the grid.
    fn store(&mut self, cell: CellCoord, object: PlacedObject) -> Option<Option<PlacedObject>> {
        let index = self.size.index(cell)?;
        let slot = self.slots.get_mut(index)?;
        Some(slot.replace(object))
    }
}
