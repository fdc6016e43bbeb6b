#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless kinematic physics for the creature body.
//!
//! The system consumes motion requests published by the world, integrates the
//! creature's feet point against the tile grid and answers with body
//! synchronisation, sensor contacts and trigger commands. Solid blocks fill
//! their whole cell, stairs are 45 degree slopes and every other tile is
//! passable.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use simple_lemmings_core::{
    cell_containing, CellCoord, ColliderCategory, Command, ContactPhase, Event, StairsDirection,
    TileFacets, Trigger,
};
use simple_lemmings_world::{query, GridState, TileCatalog, World};

const MAX_SUBSTEPS: u32 = 64;
const SURFACE_EPSILON: f32 = 1e-4;

/// Tolerances of the kinematic integrator and the creature sensors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Half-width of the feet sensor. Straddling a seam touches two colliders.
    pub sensor_half_width: f32,
    /// Height difference a grounded body snaps across, up or down.
    pub step_tolerance: f32,
    /// Distance below the feet checked for ground colliders.
    pub ground_reach: f32,
    /// Height of the body, used for the wall sensor and triggers.
    pub body_height: f32,
    /// Largest displacement integrated in a single substep.
    pub max_substep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            sensor_half_width: 0.3,
            step_tolerance: 0.5,
            ground_reach: 0.05,
            body_height: 0.8,
            max_substep: 0.25,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Body {
    position: Vec2,
    velocity: Vec2,
}

/// Collision shape of a structural tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Block,
    Slope(StairsDirection),
}

impl Shape {
    fn surface(self, row: u32, along: f32) -> f32 {
        let base = row as f32;
        match self {
            Shape::Block => base + 1.0,
            Shape::Slope(StairsDirection::Right) => base + along,
            Shape::Slope(StairsDirection::Left) => base + 1.0 - along,
        }
    }
}

struct Terrain<'a> {
    grid: &'a GridState,
    catalog: &'a TileCatalog,
    checkpoints: &'a [CellCoord],
}

impl<'a> Terrain<'a> {
    fn of(world: &'a World) -> Self {
        Self {
            grid: query::grid(world),
            catalog: query::catalog(world),
            checkpoints: query::level(world).checkpoints(),
        }
    }

    fn facets(&self, cell: CellCoord) -> Option<TileFacets> {
        self.grid
            .structural_at(cell)
            .map(|tile| self.catalog.facets(tile))
    }

    fn shape(&self, cell: CellCoord) -> Option<Shape> {
        let tile = self.grid.structural_at(cell)?;
        if !self.catalog.facets(tile).structural {
            return None;
        }
        Some(
            self.catalog
                .stairs_direction(tile)
                .map_or(Shape::Block, Shape::Slope),
        )
    }

    fn is_solid(&self, point: Vec2) -> bool {
        let Some(cell) = cell_containing(point) else {
            return false;
        };
        let local = point - point.floor();
        match self.shape(cell) {
            Some(shape) => local.y < shape.surface(0, local.x),
            None => false,
        }
    }

    /// Highest surface in the column at `x` lying at or below `ceiling`.
    fn surface_below(&self, x: f32, ceiling: f32) -> Option<f32> {
        if x < 0.0 || ceiling < 0.0 {
            return None;
        }
        let column = x.floor() as u32;
        let along = x - x.floor();
        let top = (ceiling.floor() as u32).min(self.grid.size().rows().saturating_sub(1));
        (0..=top).rev().find_map(|row| {
            let shape = self.shape(CellCoord::new(column, row))?;
            let surface = shape.surface(row, along);
            (surface <= ceiling + SURFACE_EPSILON).then_some(surface)
        })
    }
}

/// Kinematic stand-in for the physics engine driving the creature body.
#[derive(Debug)]
pub struct Physics {
    config: PhysicsConfig,
    body: Option<Body>,
    ground: BTreeSet<CellCoord>,
    on_stairs: bool,
    against_wall: bool,
    occupied_cell: Option<CellCoord>,
}

impl Physics {
    /// Creates a physics system without a body.
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            body: None,
            ground: BTreeSet::new(),
            on_stairs: false,
            against_wall: false,
            occupied_cell: None,
        }
    }

    /// Feet position of the simulated body, if one exists.
    #[must_use]
    pub fn body_position(&self) -> Option<Vec2> {
        self.body.map(|body| body.position)
    }

    /// Consumes world events and emits body, contact and trigger commands.
    pub fn handle(&mut self, events: &[Event], world: &World, out: &mut Vec<Command>) {
        let terrain = Terrain::of(world);
        for event in events {
            match event {
                Event::CreatureSpawned { position, .. } => {
                    self.reset();
                    self.body = Some(Body {
                        position: *position,
                        velocity: Vec2::ZERO,
                    });
                    let mut triggers = Vec::new();
                    self.track_cell(&terrain, *position, &mut triggers);
                    push_triggers(triggers, out);
                    self.sense(&terrain, out);
                }
                Event::MotionRequested { velocity, dt } => {
                    self.step(&terrain, *velocity, dt.as_secs_f32(), out);
                }
                Event::InterventionApplied { .. } => {
                    // The body may already overlap a freshly placed trigger.
                    if let Some(body) = self.body {
                        self.occupied_cell = None;
                        let mut triggers = Vec::new();
                        self.track_cell(&terrain, body.position, &mut triggers);
                        push_triggers(triggers, out);
                    }
                    self.sense(&terrain, out);
                }
                Event::CreatureKilled { .. } | Event::CreatureSaved | Event::LevelRestarted => {
                    self.reset();
                }
                _ => {}
            }
        }
    }

    fn reset(&mut self) {
        self.body = None;
        self.ground.clear();
        self.on_stairs = false;
        self.against_wall = false;
        self.occupied_cell = None;
    }

    fn step(&mut self, terrain: &Terrain<'_>, velocity: Vec2, dt: f32, out: &mut Vec<Command>) {
        let Some(mut body) = self.body else {
            return;
        };
        body.velocity = velocity;

        let travel = (velocity * dt).abs().max_element();
        let substeps = (travel / self.config.max_substep)
            .ceil()
            .clamp(1.0, MAX_SUBSTEPS as f32) as u32;
        let h = dt / substeps as f32;
        let mut supported = !self.ground.is_empty();
        let mut blocked = false;
        let mut triggers = Vec::new();

        for _ in 0..substeps {
            let dx = body.velocity.x * h;
            if dx != 0.0 {
                let next_x = body.position.x + dx;
                let lead = next_x + dx.signum() * self.config.sensor_half_width;
                if self.blocks(terrain, lead, body.position.y) {
                    blocked = true;
                    body.velocity.x = 0.0;
                } else {
                    body.position.x = next_x;
                }
            }

            if supported {
                let reach = body.position.y + self.config.step_tolerance;
                if let Some(surface) = terrain
                    .surface_below(body.position.x, reach)
                    .filter(|surface| *surface >= body.position.y - self.config.step_tolerance)
                {
                    body.position.y = surface;
                    body.velocity.y = 0.0;
                }
            } else {
                let next_y = body.position.y + body.velocity.y * h;
                let landing = terrain
                    .surface_below(body.position.x, body.position.y + SURFACE_EPSILON)
                    .filter(|surface| next_y <= *surface);
                match landing {
                    Some(surface) => {
                        body.position.y = surface;
                        body.velocity.y = 0.0;
                        supported = true;
                    }
                    None => body.position.y = next_y,
                }
            }

            self.track_cell(terrain, body.position, &mut triggers);
        }

        self.body = Some(body);
        out.push(Command::SyncCreatureBody {
            position: body.position,
            velocity: body.velocity,
        });
        push_triggers(triggers, out);
        self.sense(terrain, out);

        if blocked != self.against_wall {
            self.against_wall = blocked;
            tracing::trace!(target: "physics", blocked, x = body.position.x, "wall sensor");
            out.push(Command::Contact {
                category: ColliderCategory::Wall,
                phase: phase_of(blocked),
            });
        }
    }

    fn blocks(&self, terrain: &Terrain<'_>, lead: f32, feet: f32) -> bool {
        let knee = Vec2::new(lead, feet + self.config.step_tolerance);
        let head = Vec2::new(lead, feet + self.config.body_height);
        terrain.is_solid(knee) || terrain.is_solid(head)
    }

    fn track_cell(&mut self, terrain: &Terrain<'_>, feet: Vec2, triggers: &mut Vec<Trigger>) {
        let cell = cell_containing(feet + Vec2::new(0.0, self.config.body_height * 0.5));
        if cell == self.occupied_cell {
            return;
        }
        self.occupied_cell = cell;
        let Some(cell) = cell else {
            return;
        };
        if let Some(facets) = terrain.facets(cell) {
            if facets.umbrella_marker {
                triggers.push(Trigger::Umbrella);
            }
            if facets.portal {
                triggers.push(Trigger::Portal);
            }
        }
        if terrain.checkpoints.contains(&cell) {
            triggers.push(Trigger::Checkpoint(cell));
        }
    }

    /// Diffs the ground and stairs sensors against the previous reading.
    fn sense(&mut self, terrain: &Terrain<'_>, out: &mut Vec<Command>) {
        let Some(body) = self.body else {
            return;
        };
        let sample_y = body.position.y - self.config.ground_reach;
        let half_width = self.config.sensor_half_width;
        let x = body.position.x;
        // The feet point keeps contact on slopes whose edges fall away on both sides.
        let ground: BTreeSet<CellCoord> = [x - half_width, x, x + half_width]
            .into_iter()
            .map(|x| Vec2::new(x, sample_y))
            .filter(|point| terrain.is_solid(*point))
            .filter_map(cell_containing)
            .collect();

        // Gains before losses, so moving across a seam never reads as airborne.
        for _ in ground.difference(&self.ground) {
            out.push(Command::Contact {
                category: ColliderCategory::Ground,
                phase: ContactPhase::Began,
            });
        }
        for _ in self.ground.difference(&ground) {
            out.push(Command::Contact {
                category: ColliderCategory::Ground,
                phase: ContactPhase::Ended,
            });
        }

        let on_stairs = ground
            .iter()
            .any(|cell| matches!(terrain.shape(*cell), Some(Shape::Slope(_))));
        if on_stairs != self.on_stairs {
            self.on_stairs = on_stairs;
            out.push(Command::Contact {
                category: ColliderCategory::Stairs,
                phase: phase_of(on_stairs),
            });
        }
        self.ground = ground;
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

fn phase_of(active: bool) -> ContactPhase {
    if active {
        ContactPhase::Began
    } else {
        ContactPhase::Ended
    }
}

fn push_triggers(triggers: Vec<Trigger>, out: &mut Vec<Command>) {
    out.extend(
        triggers
            .into_iter()
            .map(|trigger| Command::TriggerEntered { trigger }),
    );
}
