#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Simple Lemmings episodes headlessly.

mod config;
mod policy;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use simple_lemmings_system_episode::Episode;
use simple_lemmings_system_physics::Physics;
use simple_lemmings_world::{query, World};
use tracing_subscriber::EnvFilter;

use crate::{config::RunConfig, policy::PolicyKind};

/// Plays Simple Lemmings episodes with a scripted policy and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "simple-lemmings", version)]
struct Args {
    /// Level description in TOML. The built-in sample level is used when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    /// Run configuration in TOML with optional creature, episode and physics sections.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of episodes to play.
    #[arg(long, default_value_t = 1)]
    episodes: usize,
    /// Seed of the random policy.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Policy asked for a decision at every decision point.
    #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
    policy: PolicyKind,
    /// Overrides the tick limit of an episode.
    #[arg(long)]
    max_ticks: Option<u64>,
    /// Overrides the simulated milliseconds per tick.
    #[arg(long)]
    tick_ms: Option<u64>,
}

/// Log filter taken from `RUST_LOG`, defaulting to `info` when unset or invalid.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Entry point for the Simple Lemmings command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let mut run_config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(max_ticks) = args.max_ticks {
        run_config.episode.max_ticks = max_ticks;
    }
    if let Some(tick_ms) = args.tick_ms {
        run_config.episode.tick_ms = tick_ms;
    }

    let description = config::load_level(args.level.as_deref())?;
    let world = World::from_description(&description, run_config.creature)
        .with_context(|| format!("level {} cannot be played", description.name))?;
    println!("{}", query::welcome_banner(&world));
    tracing::info!(
        target: "cli",
        level = %description.name,
        episodes = args.episodes,
        policy = ?args.policy,
        seed = args.seed,
        "starting run"
    );

    let mut episode = Episode::new(world, Physics::new(run_config.physics), run_config.episode);
    let mut policy = policy::build(args.policy, args.seed);
    let summary = session::run(&mut episode, policy.as_mut(), args.episodes);
    println!("{summary}");
    Ok(())
}
