//! Level and run configuration loaded from TOML files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use simple_lemmings_core::{CreatureTuning, LevelDescription};
use simple_lemmings_system_episode::EpisodeConfig;
use simple_lemmings_system_physics::PhysicsConfig;

/// Tunables of a run. Every section and field falls back to its default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunConfig {
    pub(crate) creature: CreatureTuning,
    pub(crate) episode: EpisodeConfig,
    pub(crate) physics: PhysicsConfig,
}

impl RunConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read run config at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid run config at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse run config toml contents")
    }
}

/// Loads the level at `path`, or the built-in sample level when no path is given.
pub(crate) fn load_level(path: Option<&Path>) -> Result<LevelDescription> {
    let Some(path) = path else {
        return Ok(LevelDescription::sample());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level at {}", path.display()))?;
    parse_level(&contents).with_context(|| format!("invalid level at {}", path.display()))
}

fn parse_level(contents: &str) -> Result<LevelDescription> {
    toml::from_str(contents).context("failed to parse level toml contents")
}
