//! Decision policies used by the headless runner.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use simple_lemmings_core::GridSize;
use simple_lemmings_system_dispatch::{decode_flat_action, AgentDecision, ACTION_SLOTS};

/// Policies selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum PolicyKind {
    /// Never intervenes.
    Idle,
    /// Picks a uniformly random legal intervention at every decision point.
    Random,
}

/// Chooses a decision from the flat legality mask.
pub(crate) trait Policy {
    fn decide(&mut self, mask: &[bool], size: GridSize) -> AgentDecision;
}

#[derive(Debug)]
struct IdlePolicy;

impl Policy for IdlePolicy {
    fn decide(&mut self, _mask: &[bool], _size: GridSize) -> AgentDecision {
        AgentDecision::idle()
    }
}

#[derive(Debug)]
struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn decide(&mut self, mask: &[bool], size: GridSize) -> AgentDecision {
        let candidates: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(index, legal)| **legal && index % ACTION_SLOTS != 0)
            .map(|(index, _)| index)
            .collect();
        candidates
            .choose(&mut self.rng)
            .and_then(|index| decode_flat_action(size, *index))
            .unwrap_or_else(AgentDecision::idle)
    }
}

/// Builds the policy selected on the command line.
pub(crate) fn build(kind: PolicyKind, seed: u64) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Idle => Box::new(IdlePolicy),
        PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
    }
}
