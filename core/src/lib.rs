#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Simple Lemmings engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations or physics observations,
//! the world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values for systems and episode controllers to react
//! to deterministically.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod level;

pub use level::{CreatureTuning, LevelDescription, TileDefinition, TileRoles};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Simple Lemmings.";

/// Number of interventions in the closed [`Action`] set.
pub const ACTION_COUNT: usize = 6;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the single creature be spawned at the level spawn point.
    SpawnCreature,
    /// Restores the level to its initial layout and removes the creature.
    RestartLevel,
    /// Requests that an intervention be applied to a cell.
    Intervene {
        /// Cell targeted by the intervention.
        cell: CellCoord,
        /// Intervention to apply.
        action: Action,
    },
    /// Synchronises the creature body with the physics collaborator.
    SyncCreatureBody {
        /// Feet position resolved by the physics step, in grid units.
        position: Vec2,
        /// Velocity after collision response, in grid units per second.
        velocity: Vec2,
    },
    /// Reports a contact transition observed by one of the creature sensors.
    Contact {
        /// Category of the collider the sensor touched.
        category: ColliderCategory,
        /// Whether the overlap began or ended.
        phase: ContactPhase,
    },
    /// Reports that the creature body entered a trigger volume.
    TriggerEntered {
        /// Trigger that was entered.
        trigger: Trigger,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Asks the physics collaborator to integrate the creature body.
    MotionRequested {
        /// Velocity the creature wants to move with during this tick.
        velocity: Vec2,
        /// Duration of the step to integrate.
        dt: Duration,
    },
    /// Confirms that the creature was spawned.
    CreatureSpawned {
        /// Feet position of the spawned creature.
        position: Vec2,
        /// Initial horizontal facing.
        facing: Facing,
    },
    /// Announces that the creature lost its last ground contact.
    CreatureFell {
        /// Height recorded when the fall began.
        origin_height: f32,
    },
    /// Announces that the creature survived touching the ground after a fall.
    CreatureLanded {
        /// Distance fallen, measured in grid cells.
        fall_height: f32,
        /// Indicates whether fall protection absorbed the landing.
        protected: bool,
    },
    /// Confirms that the creature now carries fall protection.
    FallProtectionEquipped,
    /// Announces that the creature reversed its walking direction.
    CreatureTurned {
        /// Facing after the turn.
        facing: Facing,
    },
    /// Terminal notification emitted exactly once when the creature dies.
    CreatureKilled {
        /// Reason the creature died.
        cause: DeathCause,
    },
    /// Terminal notification emitted when the creature reaches the portal.
    CreatureSaved,
    /// Progress notification emitted the first time a checkpoint is reached.
    CheckpointReached {
        /// Cell hosting the checkpoint.
        cell: CellCoord,
    },
    /// Confirms that an intervention mutated the grid.
    InterventionApplied {
        /// Summary of the mutation.
        outcome: InterventionOutcome,
    },
    /// Reports that an intervention request was rejected.
    InterventionRejected {
        /// Specific reason the intervention failed.
        reason: Rejection,
    },
    /// Confirms that the level was restored to its initial layout.
    LevelRestarted,
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Row zero is the bottom row of the level; rows grow upward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the neighbouring coordinate shifted by the provided deltas.
    ///
    /// Yields `None` when the shift leaves the unsigned coordinate space.
    /// Grid bounds are not checked here.
    #[must_use]
    pub fn offset(self, columns: i32, rows: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(columns)?;
        let row = self.row.checked_add_signed(rows)?;
        Some(CellCoord::new(column, row))
    }

    /// Cell directly beneath this one.
    #[must_use]
    pub fn below(self) -> Option<CellCoord> {
        self.offset(0, -1)
    }

    /// Cell directly above this one.
    #[must_use]
    pub fn above(self) -> Option<CellCoord> {
        self.offset(0, 1)
    }
}

/// Dimensions of the level grid measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    columns: u32,
    rows: u32,
}

impl GridSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(0)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Packs the cell into a row-major index, or `None` when out of bounds.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }

    /// Unpacks a row-major index into a cell coordinate.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cell_count() {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Iterates every cell in row-major order starting at the bottom row.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }
}

/// Index of a tile definition inside the level's tile catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u16);

impl TileId {
    /// Creates a new tile identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Static classification flags attached to a tile identity.
///
/// Facets are orthogonal: a built stair is both `structural` and
/// `demolishable`, a soft block is both `structural` and `destructible`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TileFacets {
    /// The tile can be picked by the player.
    pub selectable: bool,
    /// The tile can be broken.
    pub destructible: bool,
    /// Standing on the tile kills the creature.
    pub damaging: bool,
    /// The tile is solid ground.
    pub structural: bool,
    /// The tile was built by the player and can be demolished.
    pub demolishable: bool,
    /// The tile decorates the top of a cliff edge.
    pub top_detail: bool,
    /// The tile marks a placed umbrella.
    pub umbrella_marker: bool,
    /// The tile is the level exit.
    pub portal: bool,
}

/// Interventions a player or agent can spend on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    /// Removes a destructible block.
    Break,
    /// Places an umbrella pickup in an empty cell.
    PlaceUmbrella,
    /// Builds a stair rising to the right.
    BuildRightStairs,
    /// Builds a stair rising to the left.
    BuildLeftStairs,
    /// Removes a previously built stair.
    Demolish,
    /// Removes a previously placed umbrella.
    RemoveUmbrella,
}

impl Action {
    /// Every action in external protocol order.
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::Break,
        Action::PlaceUmbrella,
        Action::BuildRightStairs,
        Action::BuildLeftStairs,
        Action::Demolish,
        Action::RemoveUmbrella,
    ];

    /// Resolves a 1-based protocol index. Zero is the no-op and yields `None`.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Action> {
        index
            .checked_sub(1)
            .and_then(|slot| Self::ALL.get(slot).copied())
    }

    /// 1-based protocol index of the action.
    #[must_use]
    pub const fn index(self) -> usize {
        self.slot() + 1
    }

    /// 0-based slot of the action inside an [`ActionMask`].
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::Break => 0,
            Self::PlaceUmbrella => 1,
            Self::BuildRightStairs => 2,
            Self::BuildLeftStairs => 3,
            Self::Demolish => 4,
            Self::RemoveUmbrella => 5,
        }
    }

    /// Reports whether the action targets an occupied cell.
    #[must_use]
    pub const fn targets_occupied(self) -> bool {
        matches!(self, Self::Break | Self::Demolish | Self::RemoveUmbrella)
    }
}

/// Fixed-size legality vector indexed by [`Action::slot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionMask([bool; ACTION_COUNT]);

impl ActionMask {
    /// Mask with every action illegal.
    pub const NONE: ActionMask = ActionMask([false; ACTION_COUNT]);

    /// Marks the action as legal or illegal.
    pub fn set(&mut self, action: Action, legal: bool) {
        self.0[action.slot()] = legal;
    }

    /// Reports whether the action is legal.
    #[must_use]
    pub const fn allows(&self, action: Action) -> bool {
        self.0[action.slot()]
    }

    /// Reports whether no action is legal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|legal| *legal)
    }

    /// Iterates the legal actions in protocol order.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL
            .into_iter()
            .filter(move |action| self.allows(*action))
    }

    /// Raw slots of the mask.
    #[must_use]
    pub const fn as_array(&self) -> &[bool; ACTION_COUNT] {
        &self.0
    }
}

/// Direction in which a built stair rises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StairsDirection {
    /// Surface rises toward increasing columns.
    Right,
    /// Surface rises toward decreasing columns.
    Left,
}

/// Handle assigned to an object placed by an intervention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(u32);

impl ObjectHandle {
    /// Creates a new handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Object registered at a cell by an intervention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacedObject {
    /// A placed umbrella pickup.
    Umbrella {
        /// Handle of the umbrella.
        handle: ObjectHandle,
    },
    /// A built stair.
    Stairs {
        /// Handle of the stair.
        handle: ObjectHandle,
        /// Direction the stair rises.
        direction: StairsDirection,
    },
}

impl PlacedObject {
    /// Handle of the placed object.
    #[must_use]
    pub const fn handle(&self) -> ObjectHandle {
        match self {
            Self::Umbrella { handle } | Self::Stairs { handle, .. } => *handle,
        }
    }
}

/// Summary of the side effects produced by a successful intervention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionOutcome {
    /// Intervention that was applied.
    pub action: Action,
    /// Cell targeted by the intervention.
    pub cell: CellCoord,
    /// Handle registered by the intervention, if any.
    pub placed: Option<ObjectHandle>,
    /// Handle released by the intervention, if any.
    pub released: Option<ObjectHandle>,
    /// Cells whose structural or detail tiles changed.
    pub touched: Vec<CellCoord>,
}

/// Reasons an intervention request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum Rejection {
    /// The action is not currently legal at the target cell.
    #[error("{action:?} is not legal at ({}, {})", cell.column(), cell.row())]
    IllegalAction {
        /// Cell targeted by the request.
        cell: CellCoord,
        /// Action that was requested.
        action: Action,
    },
    /// The external action index does not name an action.
    #[error("action index {index} is outside the action set")]
    UnknownAction {
        /// Index supplied by the caller.
        index: usize,
    },
}

/// Horizontal facing of the creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Walking toward increasing columns.
    Right,
    /// Walking toward decreasing columns.
    Left,
}

impl Facing {
    /// Signed horizontal unit of the facing.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Right => 1.0,
            Self::Left => -1.0,
        }
    }

    /// Opposite facing.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
        }
    }
}

/// Phase of the creature state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreaturePhase {
    /// Standing or walking on ground.
    Grounded,
    /// Airborne after losing every ground contact.
    Falling,
    /// Terminal phase.
    Dead,
}

/// Reason the creature died.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Landed from a height at or above the deadly threshold.
    FatalFall {
        /// Height fallen, measured in grid cells.
        height: f32,
    },
    /// Touched a damaging tile.
    DamagingTile,
    /// Dropped below the level floor.
    BelowFloor,
    /// Walked outside the horizontal level bounds.
    OutOfBounds,
}

/// Collider categories delivered by the physics collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderCategory {
    /// Walkable ground under the feet sensor.
    Ground,
    /// Stair slope under the slope sensor.
    Stairs,
    /// Obstacle in front of the wall sensor.
    Wall,
}

/// Transition of a sensor overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    /// A new overlap started.
    Began,
    /// An existing overlap ended.
    Ended,
}

/// Trigger volumes the creature body can enter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// A placed umbrella granting fall protection.
    Umbrella,
    /// The level exit.
    Portal,
    /// A checkpoint anchored at the provided cell.
    Checkpoint(CellCoord),
}

/// Immutable representation of the creature used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreatureSnapshot {
    /// Feet position in grid units.
    pub position: Vec2,
    /// Velocity in grid units per second.
    pub velocity: Vec2,
    /// Horizontal facing.
    pub facing: Facing,
    /// Current state machine phase.
    pub phase: CreaturePhase,
    /// Number of ground colliders currently overlapped.
    pub ground_contacts: u32,
    /// Indicates whether fall protection is equipped.
    pub fall_protection: bool,
    /// Indicates whether the creature is traversing a stair.
    pub climbing_slope: bool,
    /// Visual orientation flag mirrored on every turn.
    pub mirrored: bool,
}

impl CreatureSnapshot {
    /// Grid cell containing the creature's feet, if inside the positive quadrant.
    #[must_use]
    pub fn cell(&self) -> Option<CellCoord> {
        cell_containing(self.position)
    }
}

/// Grid cell containing the provided point, if inside the positive quadrant.
#[must_use]
pub fn cell_containing(point: Vec2) -> Option<CellCoord> {
    let column = point.x.floor();
    let row = point.y.floor();
    if !column.is_finite() || !row.is_finite() || column < 0.0 || row < 0.0 {
        return None;
    }
    if column > u32::MAX as f32 || row > u32::MAX as f32 {
        return None;
    }
    Some(CellCoord::new(column as u32, row as u32))
}
