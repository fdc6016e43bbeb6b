//! Episode loop of the headless runner.

use std::fmt;

use simple_lemmings_system_dispatch::Dispatch;
use simple_lemmings_system_episode::{Episode, EpisodeStatus};
use simple_lemmings_world::query;

use crate::policy::Policy;

#[derive(Clone, Copy, Debug, PartialEq)]
struct EpisodeReport {
    status: EpisodeStatus,
    ticks: u64,
    reward: f32,
    decisions_used: u32,
}

/// Outcome counts of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    reports: Vec<EpisodeReport>,
}

impl Summary {
    fn count(&self, predicate: impl Fn(EpisodeStatus) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(report.status))
            .count()
    }

    fn mean_reward(&self) -> f32 {
        if self.reports.is_empty() {
            return 0.0;
        }
        let total: f32 = self.reports.iter().map(|report| report.reward).sum();
        total / self.reports.len() as f32
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "episodes: {} saved: {} killed: {} timed out: {} mean reward: {:.3}",
            self.reports.len(),
            self.count(|status| status == EpisodeStatus::Saved),
            self.count(|status| matches!(status, EpisodeStatus::Killed(_))),
            self.count(|status| status == EpisodeStatus::TimedOut),
            self.mean_reward(),
        )
    }
}

/// Plays `episodes` episodes, asking the policy for a decision whenever the episode wants one.
pub(crate) fn run(episode: &mut Episode, policy: &mut dyn Policy, episodes: usize) -> Summary {
    let size = query::grid_size(episode.world());
    let mut summary = Summary::default();

    for index in 0..episodes {
        let _ = episode.begin();
        let budget = episode.decisions_left();
        while !episode.status().is_terminal() {
            if episode.wants_decision() {
                let decision = policy.decide(&episode.action_mask(), size);
                match episode.decide(decision) {
                    Ok(Dispatch::Applied(outcome)) => tracing::debug!(
                        target: "cli",
                        action = ?outcome.action,
                        column = outcome.cell.column(),
                        row = outcome.cell.row(),
                        "intervention applied"
                    ),
                    Ok(Dispatch::Idle) => {}
                    Err(reason) => tracing::debug!(target: "cli", %reason, "decision rejected"),
                }
            }
            let _ = episode.advance();
        }

        let report = EpisodeReport {
            status: episode.status(),
            ticks: episode.ticks(),
            reward: episode.total_reward(),
            decisions_used: budget - episode.decisions_left(),
        };
        tracing::info!(
            target: "cli",
            episode = index,
            status = ?report.status,
            ticks = report.ticks,
            reward = report.reward,
            decisions_used = report.decisions_used,
            "episode finished"
        );
        summary.reports.push(report);
    }
    summary
}
