#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Episode controller for agents steering the creature through a level.
//!
//! An episode restarts the level, spawns the creature and then advances the
//! world and the physics collaborator tick by tick. Agents spend a fixed
//! budget of decisions on interventions; every decision consumes budget
//! whether it idles, applies or gets rejected. Saving or losing the creature
//! ends the episode.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use simple_lemmings_core::{Command, DeathCause, Event, Rejection};
use simple_lemmings_system_dispatch::{
    dispatch_decision, flat_action_mask, AgentDecision, Dispatch,
};
use simple_lemmings_system_observation::encode;
use simple_lemmings_system_physics::Physics;
use simple_lemmings_world::{self as world, World};

/// Budget, pacing and reward settings of an episode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Decisions available per episode.
    pub decision_budget: u32,
    /// Ticks between decision requests.
    pub decision_interval: u64,
    /// Simulated milliseconds per tick.
    pub tick_ms: u64,
    /// Ticks after which a running episode is abandoned.
    pub max_ticks: u64,
    /// Whether rewards are accumulated.
    pub training: bool,
    /// Reward for reaching the portal.
    pub reward_saved: f32,
    /// Reward for losing the creature.
    pub reward_killed: f32,
    /// Reward for each checkpoint reached.
    pub reward_checkpoint: f32,
    /// Reward added for every rejected decision.
    pub invalid_action_penalty: f32,
}

impl EpisodeConfig {
    /// Simulated duration of a single tick.
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            decision_budget: 10,
            decision_interval: 25,
            tick_ms: 20,
            max_ticks: 3_000,
            training: true,
            reward_saved: 1.0,
            reward_killed: -1.0,
            reward_checkpoint: 0.2,
            invalid_action_penalty: 0.0,
        }
    }
}

/// Progress of an episode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EpisodeStatus {
    /// The creature is still in play.
    Running,
    /// The creature reached the portal.
    Saved,
    /// The creature died.
    Killed(DeathCause),
    /// The tick limit elapsed first.
    TimedOut,
}

impl EpisodeStatus {
    /// Reports whether the episode has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Controller owning the world and its physics collaborator for one level.
#[derive(Debug)]
pub struct Episode {
    world: World,
    physics: Physics,
    config: EpisodeConfig,
    decisions_left: u32,
    status: EpisodeStatus,
    ticks: u64,
    pending_reward: f32,
    total_reward: f32,
}

impl Episode {
    /// Creates a controller. Call [`Episode::begin`] before advancing it.
    #[must_use]
    pub fn new(world: World, physics: Physics, config: EpisodeConfig) -> Self {
        Self {
            world,
            physics,
            config,
            decisions_left: config.decision_budget,
            status: EpisodeStatus::Running,
            ticks: 0,
            pending_reward: 0.0,
            total_reward: 0.0,
        }
    }

    /// Restarts the level, spawns the creature and refills the decision budget.
    pub fn begin(&mut self) -> Vec<Event> {
        self.decisions_left = self.config.decision_budget;
        self.status = EpisodeStatus::Running;
        self.ticks = 0;
        self.pending_reward = 0.0;
        self.total_reward = 0.0;

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::RestartLevel, &mut events);
        world::apply(&mut self.world, Command::SpawnCreature, &mut events);
        self.pump(events)
    }

    /// Reports whether the agent should be asked for a decision this tick.
    #[must_use]
    pub fn wants_decision(&self) -> bool {
        self.status == EpisodeStatus::Running
            && self.decisions_left > 0
            && self.ticks % self.config.decision_interval.max(1) == 0
    }

    /// Spends one decision of the budget.
    ///
    /// Decisions arriving after the episode ended or the budget ran out are
    /// treated as idle and consume nothing.
    pub fn decide(&mut self, decision: AgentDecision) -> Result<Dispatch, Rejection> {
        if self.status.is_terminal() || self.decisions_left == 0 {
            tracing::debug!(
                target: "episode",
                ?decision,
                decisions_left = self.decisions_left,
                "decision ignored"
            );
            return Ok(Dispatch::Idle);
        }
        self.decisions_left -= 1;

        let mut events = Vec::new();
        let result = dispatch_decision(&mut self.world, decision, &mut events);
        if let Err(reason) = &result {
            tracing::debug!(target: "episode", %reason, "decision rejected");
            self.credit(self.config.invalid_action_penalty);
        }
        let _ = self.pump(events);
        result
    }

    /// Advances the simulation by one tick.
    pub fn advance(&mut self) -> Vec<Event> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        self.ticks = self.ticks.saturating_add(1);

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::Tick {
                dt: self.config.tick(),
            },
            &mut events,
        );
        let log = self.pump(events);

        if self.status == EpisodeStatus::Running && self.ticks >= self.config.max_ticks {
            self.status = EpisodeStatus::TimedOut;
            tracing::info!(target: "episode", ticks = self.ticks, "episode timed out");
        }
        log
    }

    /// Observation made of the remaining budget followed by the world encoding.
    #[must_use]
    pub fn observation(&self) -> Vec<f32> {
        let mut observation = vec![self.decisions_left as f32];
        observation.extend(encode(&self.world));
        observation
    }

    /// Flat legality mask of the discrete action space.
    #[must_use]
    pub fn action_mask(&self) -> Vec<bool> {
        flat_action_mask(&self.world)
    }

    /// Returns the reward accumulated since the previous call.
    pub fn take_reward(&mut self) -> f32 {
        std::mem::take(&mut self.pending_reward)
    }

    /// Reward accumulated since the episode began.
    #[must_use]
    pub const fn total_reward(&self) -> f32 {
        self.total_reward
    }

    /// Current progress of the episode.
    #[must_use]
    pub const fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// Decisions left in the budget.
    #[must_use]
    pub const fn decisions_left(&self) -> u32 {
        self.decisions_left
    }

    /// Ticks advanced since the episode began.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// World driven by the episode.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Routes events between the world and physics until both are quiet.
    fn pump(&mut self, events: Vec<Event>) -> Vec<Event> {
        let mut log = Vec::new();
        let mut pending = events;
        while !pending.is_empty() {
            for event in &pending {
                self.observe(event);
            }
            let mut commands = Vec::new();
            self.physics.handle(&pending, &self.world, &mut commands);
            log.append(&mut pending);
            for command in commands {
                world::apply(&mut self.world, command, &mut pending);
            }
        }
        log
    }

    fn observe(&mut self, event: &Event) {
        if self.status.is_terminal() {
            return;
        }
        match event {
            Event::CreatureSaved => {
                self.status = EpisodeStatus::Saved;
                self.credit(self.config.reward_saved);
                tracing::info!(target: "episode", ticks = self.ticks, "creature saved");
            }
            Event::CreatureKilled { cause } => {
                self.status = EpisodeStatus::Killed(*cause);
                self.credit(self.config.reward_killed);
                tracing::info!(target: "episode", ticks = self.ticks, ?cause, "creature lost");
            }
            Event::CheckpointReached { .. } => self.credit(self.config.reward_checkpoint),
            _ => {}
        }
    }

    fn credit(&mut self, reward: f32) {
        if self.config.training {
            self.pending_reward += reward;
            self.total_reward += reward;
        }
    }
}
