#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Simple Lemmings.
//!
//! The world owns the two-layer tile grid, the placed-object registry and the
//! single creature. Every mutation flows through [`apply`]; read access goes
//! through the functions in [`query`].

mod creature;
mod grid;
mod legality;
mod level;
mod mutator;
mod registry;
mod tiles;

use std::time::Duration;

use glam::Vec2;
use simple_lemmings_core::{
    cell_containing, Action, CellCoord, ColliderCategory, Command, ContactPhase, CreatureTuning,
    DeathCause, Event, InterventionOutcome, LevelDescription, Rejection, Trigger, WELCOME_BANNER,
};

use crate::creature::{Creature, Transition};

pub use grid::GridState;
pub use level::{Level, LevelError};
pub use tiles::{RoleTiles, TileCatalog};

/// Depth below the feet checked for damaging tiles.
const HAZARD_DEPTH: f32 = 0.5;

/// Represents the authoritative Simple Lemmings world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    level: Level,
    grid: GridState,
    creature: Option<Creature>,
    checkpoints_reached: Vec<bool>,
    tuning: CreatureTuning,
    tick_index: u64,
}

impl World {
    /// Creates a world instance holding the level's initial layout and no creature.
    #[must_use]
    pub fn new(level: Level, tuning: CreatureTuning) -> Self {
        let grid = level.initial_grid().clone();
        let checkpoints_reached = vec![false; level.checkpoints().len()];
        Self {
            banner: WELCOME_BANNER,
            level,
            grid,
            creature: None,
            checkpoints_reached,
            tuning,
            tick_index: 0,
        }
    }

    /// Validates the description and creates a world instance from it.
    pub fn from_description(
        description: &LevelDescription,
        tuning: CreatureTuning,
    ) -> Result<Self, LevelError> {
        Ok(Self::new(Level::from_description(description)?, tuning))
    }

    fn restart(&mut self) {
        self.grid = self.level.initial_grid().clone();
        self.checkpoints_reached
            .iter_mut()
            .for_each(|reached| *reached = false);
        self.creature = None;
        self.tick_index = 0;
    }

    fn spawn_creature(&mut self, out_events: &mut Vec<Event>) {
        if self
            .creature
            .as_ref()
            .map_or(false, |creature| !creature.is_dead())
        {
            tracing::debug!(target: "world", "spawn ignored while a creature is alive");
            return;
        }
        let spawn = self.level.spawn();
        let position = Vec2::new(spawn.column() as f32 + 0.5, spawn.row() as f32);
        let facing = self.level.facing();
        self.creature = Some(Creature::spawn(position, facing));
        out_events.push(Event::CreatureSpawned { position, facing });
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let hazard = self
            .creature
            .as_ref()
            .filter(|creature| !creature.is_dead())
            .and_then(|creature| self.hazard_at(creature.position()));
        let tuning = self.tuning;
        let Some(creature) = self.creature.as_mut() else {
            return;
        };

        if let Some(transition) = creature.settle() {
            publish(transition, out_events);
        }
        if let Some(cause) = hazard {
            if let Some(transition) = creature.kill(cause) {
                publish(transition, out_events);
            }
            return;
        }
        if creature.is_dead() {
            return;
        }

        let velocity = creature.motion_intent(&tuning, dt.as_secs_f32());
        out_events.push(Event::MotionRequested { velocity, dt });
    }

    fn hazard_at(&self, feet: Vec2) -> Option<DeathCause> {
        let columns = self.grid.size().columns() as f32;
        if !(0.0..columns).contains(&feet.x) {
            return Some(DeathCause::OutOfBounds);
        }
        if feet.y < self.tuning.floor_height {
            return Some(DeathCause::BelowFloor);
        }
        let damaging = cell_containing(feet - Vec2::new(0.0, HAZARD_DEPTH))
            .and_then(|cell| self.grid.structural_at(cell))
            .map_or(false, |tile| self.level.catalog().facets(tile).damaging);
        damaging.then_some(DeathCause::DamagingTile)
    }

    fn contact(
        &mut self,
        category: ColliderCategory,
        phase: ContactPhase,
        out_events: &mut Vec<Event>,
    ) {
        let tuning = self.tuning;
        let Some(creature) = self.creature.as_mut() else {
            return;
        };
        match (category, phase) {
            (ColliderCategory::Ground, ContactPhase::Began) => {
                if let Some(transition) = creature.ground_contact_began(&tuning) {
                    publish(transition, out_events);
                }
            }
            (ColliderCategory::Ground, ContactPhase::Ended) => {
                if let Some(transition) = creature.ground_contact_ended() {
                    publish(transition, out_events);
                }
            }
            (ColliderCategory::Stairs, phase) => {
                creature.stairs_contact(phase == ContactPhase::Began);
            }
            (ColliderCategory::Wall, ContactPhase::Began) => {
                if let Some(facing) = creature.turn() {
                    out_events.push(Event::CreatureTurned { facing });
                }
            }
            (ColliderCategory::Wall, ContactPhase::Ended) => {}
        }
    }

    fn trigger(&mut self, trigger: Trigger, out_events: &mut Vec<Event>) {
        let Some(creature) = self
            .creature
            .as_mut()
            .filter(|creature| !creature.is_dead())
        else {
            return;
        };
        match trigger {
            Trigger::Umbrella => {
                if creature.equip_fall_protection() {
                    out_events.push(Event::FallProtectionEquipped);
                }
            }
            Trigger::Portal => {
                self.creature = None;
                tracing::info!(target: "world", tick = self.tick_index, "creature saved");
                out_events.push(Event::CreatureSaved);
            }
            Trigger::Checkpoint(cell) => {
                let slot = self
                    .level
                    .checkpoints()
                    .iter()
                    .position(|checkpoint| *checkpoint == cell)
                    .and_then(|index| self.checkpoints_reached.get_mut(index));
                if let Some(reached) = slot.filter(|reached| !**reached) {
                    *reached = true;
                    tracing::info!(
                        target: "world",
                        column = cell.column(),
                        row = cell.row(),
                        "checkpoint reached"
                    );
                    out_events.push(Event::CheckpointReached { cell });
                }
            }
        }
    }
}

fn publish(transition: Transition, out_events: &mut Vec<Event>) {
    match transition {
        Transition::Fell { origin_height } => {
            out_events.push(Event::CreatureFell { origin_height });
        }
        Transition::Landed {
            fall_height,
            protected,
        } => {
            out_events.push(Event::CreatureLanded {
                fall_height,
                protected,
            });
        }
        Transition::Killed(cause) => {
            tracing::info!(target: "world::creature", ?cause, "creature killed");
            out_events.push(Event::CreatureKilled { cause });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(dt, out_events);
        }
        Command::SpawnCreature => world.spawn_creature(out_events),
        Command::RestartLevel => {
            world.restart();
            tracing::debug!(target: "world", level = world.level.name(), "level restarted");
            out_events.push(Event::LevelRestarted);
        }
        Command::Intervene { cell, action } => match apply_intervention(world, cell, action) {
            Ok(outcome) => out_events.push(Event::InterventionApplied { outcome }),
            Err(reason) => out_events.push(Event::InterventionRejected { reason }),
        },
        Command::SyncCreatureBody { position, velocity } => {
            if let Some(creature) = world.creature.as_mut() {
                creature.sync_body(position, velocity);
            }
        }
        Command::Contact { category, phase } => world.contact(category, phase, out_events),
        Command::TriggerEntered { trigger } => world.trigger(trigger, out_events),
    }
}

/// Re-validates and applies an intervention, reporting the mutation or the rejection.
pub fn apply_intervention(
    world: &mut World,
    cell: CellCoord,
    action: Action,
) -> Result<InterventionOutcome, Rejection> {
    mutator::apply(&mut world.grid, world.level.catalog(), cell, action).map_err(|reason| {
        tracing::debug!(target: "world", %reason, "intervention rejected");
        reason
    })
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use simple_lemmings_core::{
        ActionMask, CellCoord, CreatureSnapshot, GridSize, PlacedObject, TileFacets,
    };

    use super::{legality, GridState, Level, TileCatalog, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Level the world was built from.
    #[must_use]
    pub fn level(world: &World) -> &Level {
        &world.level
    }

    /// Tile catalog of the loaded level.
    #[must_use]
    pub fn catalog(world: &World) -> &TileCatalog {
        world.level.catalog()
    }

    /// Current tile layers and placed objects.
    #[must_use]
    pub fn grid(world: &World) -> &GridState {
        &world.grid
    }

    /// Dimensions of the level grid.
    #[must_use]
    pub fn grid_size(world: &World) -> GridSize {
        world.grid.size()
    }

    /// Number of ticks processed since the last restart.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Facets of the structural tile at the cell, if any.
    #[must_use]
    pub fn structural_facets(world: &World, cell: CellCoord) -> Option<TileFacets> {
        world
            .grid
            .structural_at(cell)
            .map(|tile| world.level.catalog().facets(tile))
    }

    /// Object registered at the cell, if any.
    #[must_use]
    pub fn placed_at(world: &World, cell: CellCoord) -> Option<PlacedObject> {
        world.grid.placed_at(cell)
    }

    /// Legality vector of the cell. Cells outside the grid allow nothing.
    #[must_use]
    pub fn legal_actions(world: &World, cell: CellCoord) -> ActionMask {
        legality::legal_actions(&world.grid, world.level.catalog(), cell)
    }

    /// Legality vectors of every cell in row-major order.
    #[must_use]
    pub fn legal_action_grid(world: &World) -> Vec<ActionMask> {
        legality::legal_action_grid(&world.grid, world.level.catalog())
    }

    /// Snapshot of the creature, if one exists.
    #[must_use]
    pub fn creature(world: &World) -> Option<CreatureSnapshot> {
        world.creature.as_ref().map(|creature| creature.snapshot())
    }

    /// Checkpoint cells paired with whether they were reached this episode.
    #[must_use]
    pub fn checkpoints(world: &World) -> Vec<(CellCoord, bool)> {
        world
            .level
            .checkpoints()
            .iter()
            .copied()
            .zip(world.checkpoints_reached.iter().copied())
            .collect()
    }
}
