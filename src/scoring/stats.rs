use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use crate::scoring::types::{Outcome, Verdict};

pub const RECENT_RESULTS_CAP: usize = 10;

/// Running win/loss aggregates. Only ever advanced one verdict at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_games: u64,
    pub total_wins: u64,
    pub total_losses: u64,
    pub win_percentage: f64,
    pub current_streak: u64,
    /// Oldest first, newest last
    pub recent_results: VecDeque<Outcome>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&self, verdict: &Verdict) -> Statistics {
        let won = verdict.outcome == Outcome::Win;

        let total_games = self.total_games + 1;
        let total_wins = self.total_wins + u64::from(won);
        let total_losses = self.total_losses + u64::from(!won);

        let mut recent_results = self.recent_results.clone();
        while recent_results.len() >= RECENT_RESULTS_CAP {
            recent_results.pop_front();
        }
        recent_results.push_back(verdict.outcome);

        Statistics {
            total_games,
            total_wins,
            total_losses,
            win_percentage: round2(100.0 * total_wins as f64 / total_games as f64),
            current_streak: if won { self.current_streak + 1 } else { 0 },
            recent_results,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
