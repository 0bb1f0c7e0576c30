use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use crate::scoring::stats::Statistics;
use crate::scoring::types::Verdict;

const HEADER: &str =
    "timestamp,period,predicted,actual,outcome,total_games,total_wins,win_pct,streak";

/// Append-only CSV journal of verdicts.
pub struct VerdictLogger {
    log_path: String,
}

impl VerdictLogger {
    pub fn new(log_path: String) -> Result<Self> {
        // Create CSV file with headers if it doesn't exist
        if !std::path::Path::new(&log_path).exists() {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .open(&log_path)?;

            writeln!(file, "{}", HEADER)?;
        }

        Ok(Self { log_path })
    }

    pub fn log_verdict(&self, verdict: &Verdict, stats: &Statistics) -> Result<()> {
        self.log_verdict_at(Utc::now(), verdict, stats)
    }

    fn log_verdict_at(
        &self,
        at: DateTime<Utc>,
        verdict: &Verdict,
        stats: &Statistics,
    ) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)?;

        writeln!(
            file,
            "{},{},{},{},{},{},{},{:.2},{}",
            at.to_rfc3339(),
            verdict.period,
            verdict.prediction,
            verdict.actual,
            verdict.outcome,
            stats.total_games,
            stats.total_wins,
            stats.win_percentage,
            stats.current_streak
        )?;

        Ok(())
    }
}
