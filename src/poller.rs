use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, OptionFuture};
use futures::FutureExt;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use crate::config::PollerConfig;
use crate::data::draw_api::{DrawSource, FetchError};
use crate::data::period::current_period;
use crate::data::types::{DrawRecord, Period};
use crate::scoring::stats::Statistics;
use crate::scoring::types::{Outcome, Verdict};
use crate::scoring::verdict::evaluate;
use crate::strategies::types::{Prediction, PredictionError, Predictor, Refresh};

const EVENT_CAPACITY: usize = 64;

/// Read-only view handed to display collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub current_prediction: Option<Prediction>,
    pub current_period: Option<Period>,
    /// Most-recent-first
    pub latest_draws: Vec<DrawRecord>,
    pub statistics: Statistics,
    /// Most-recent-first
    pub verdict_history: VecDeque<Verdict>,
}

/// Tag for audio/animation collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Prediction,
    Win,
    Loss,
}

#[derive(Debug, Clone)]
pub enum PollerEvent {
    PredictionChanged(Prediction),
    Verdict {
        verdict: Verdict,
        statistics: Statistics,
    },
}

impl PollerEvent {
    pub fn cue(&self) -> Cue {
        match self {
            PollerEvent::PredictionChanged(_) => Cue::Prediction,
            PollerEvent::Verdict { verdict, .. } => match verdict.outcome {
                Outcome::Win => Cue::Win,
                Outcome::Loss => Cue::Loss,
            },
        }
    }
}

#[derive(Debug, Default)]
struct PollerState {
    current_period: Option<Period>,
    latest_draws: Vec<DrawRecord>,
    last_issue: Option<String>,
    pending: Option<Prediction>,
    /// Calls already made, oldest first, at most one per period
    issued: VecDeque<Prediction>,
    statistics: Statistics,
    verdict_history: VecDeque<Verdict>,
}

/// Owns all prediction/verdict state; readers only see published snapshots.
pub struct Poller {
    config: PollerConfig,
    source: Arc<dyn DrawSource>,
    predictor: Box<dyn Predictor>,
    state: PollerState,
    snapshot_tx: watch::Sender<Snapshot>,
    event_tx: broadcast::Sender<PollerEvent>,
}

type FetchFuture = BoxFuture<'static, Result<Vec<DrawRecord>, FetchError>>;

impl Poller {
    pub fn new(
        config: PollerConfig,
        source: Arc<dyn DrawSource>,
        predictor: Box<dyn Predictor>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Snapshot::default());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            config,
            source,
            predictor,
            state: PollerState::default(),
            snapshot_tx,
            event_tx,
        }
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PollerEvent> {
        self.event_tx.subscribe()
    }

    /// Drive the clock and fetch timers until `shutdown` flips (or its sender
    /// is dropped). A fetch still in flight at that point is dropped, not awaited.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut clock_tick = tokio::time::interval(Duration::from_millis(self.config.clock_interval_ms));
        let mut fetch_tick = tokio::time::interval(Duration::from_millis(self.config.fetch_interval_ms));
        clock_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        fetch_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: Option<FetchFuture> = None;

        info!(
            "Poller started: strategy={}, fetch every {}ms",
            self.predictor.name(),
            self.config.fetch_interval_ms
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Poller stopping");
                    break;
                }

                _ = clock_tick.tick() => {
                    if self.on_clock(Utc::now()) {
                        self.publish();
                    }
                }

                _ = fetch_tick.tick() => {
                    if in_flight.is_some() {
                        debug!("Previous fetch still in flight, skipping tick");
                        continue;
                    }
                    in_flight = Some(self.start_fetch());
                }

                Some(result) = OptionFuture::from(in_flight.as_mut()) => {
                    in_flight = None;
                    if self.on_fetch(result) {
                        self.publish();
                    }
                }
            }
        }

        if in_flight.take().is_some() {
            debug!("Abandoned in-flight fetch");
        }

        Ok(())
    }

    fn start_fetch(&self) -> FetchFuture {
        let source = Arc::clone(&self.source);
        let limit = Duration::from_millis(self.config.fetch_timeout_ms);

        async move {
            match tokio::time::timeout(limit, source.fetch_draws()).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit)),
            }
        }
        .boxed()
    }

    /// Advance the period clock. Returns whether the snapshot changed.
    fn on_clock(&mut self, now: DateTime<Utc>) -> bool {
        let period = current_period(now);
        let mut changed = false;

        if self.state.current_period.as_ref() != Some(&period) {
            debug!("Current period: {}", period);
            self.state.current_period = Some(period);
            changed = true;
        }

        if self.predictor.refresh() == Refresh::OnPeriodChange {
            changed |= self.repredict();
        }

        changed
    }

    /// Fold one fetch result into the state. Returns whether the snapshot changed.
    fn on_fetch(&mut self, result: Result<Vec<DrawRecord>, FetchError>) -> bool {
        let mut draws = match result {
            Ok(draws) => draws,
            Err(e) => {
                warn!(error = %e, "Draw fetch failed, keeping last snapshot");
                return false;
            }
        };

        if draws.is_empty() {
            debug!("Empty draw page, nothing to do");
            return false;
        }

        draws.truncate(self.config.draw_window.max(1));
        let newest = draws[0].clone();

        if self.state.last_issue.as_deref() == Some(newest.issue.as_str()) {
            if self.state.latest_draws == draws {
                return false;
            }
            self.state.latest_draws = draws;
            return true;
        }

        if self.state.last_issue.is_none() {
            debug!("First issue seen: {}, nothing to score", newest.issue);
        } else if let Some(prediction) = self.prediction_for(&newest.issue) {
            let verdict = evaluate(&prediction, &newest);
            self.record_verdict(verdict, newest.number);
        } else {
            debug!("No pending prediction for issue {}", newest.issue);
        }

        self.state.last_issue = Some(newest.issue);
        self.state.latest_draws = draws;

        if self.predictor.refresh() == Refresh::OnNewDraw {
            self.repredict();
        }

        true
    }

    /// Ask the predictor for a fresh call. Returns whether the pending
    /// prediction changed.
    fn repredict(&mut self) -> bool {
        let period = match &self.state.current_period {
            Some(period) => period.clone(),
            None => {
                let period = current_period(Utc::now());
                self.state.current_period = Some(period.clone());
                period
            }
        };

        match self.predictor.predict(&period, &self.state.latest_draws) {
            Ok(prediction) => {
                if self.state.pending.as_ref() == Some(&prediction) {
                    return false;
                }

                let is_new_call = self.state.pending
                    .as_ref()
                    .map_or(true, |prev| !prev.same_call(&prediction));

                if is_new_call {
                    info!("New prediction for {}: {}", prediction.for_period, prediction);
                    self.emit(PollerEvent::PredictionChanged(prediction.clone()));
                }

                self.remember(prediction.clone());
                self.state.pending = Some(prediction);
                true
            }
            Err(e @ PredictionError::InsufficientData { .. }) => {
                debug!("{}", e);
                self.state.pending.take().is_some()
            }
            Err(e) => {
                warn!(error = %e, "Prediction failed");
                self.state.pending.take().is_some()
            }
        }
    }

    /// The call made for `issue`'s own period, else the latest pending one.
    fn prediction_for(&self, issue: &str) -> Option<Prediction> {
        self.state.issued
            .iter()
            .rev()
            .find(|p| p.for_period == issue)
            .or(self.state.pending.as_ref())
            .cloned()
    }

    fn remember(&mut self, prediction: Prediction) {
        let issued = &mut self.state.issued;
        if let Some(slot) = issued.iter_mut().find(|p| p.for_period == prediction.for_period) {
            *slot = prediction;
            return;
        }

        issued.push_back(prediction);
        while issued.len() > self.config.draw_window.max(1) {
            issued.pop_front();
        }
    }

    fn record_verdict(&mut self, verdict: Verdict, number: u8) {
        self.state.statistics = self.state.statistics.fold(&verdict);

        let stats = &self.state.statistics;
        info!(
            "Issue {}: predicted {}, drew {} ({}) -> {} | {}/{} ({:.2}%), streak {}",
            verdict.period,
            verdict.prediction,
            number,
            verdict.actual,
            verdict.outcome,
            stats.total_wins,
            stats.total_games,
            stats.win_percentage,
            stats.current_streak
        );

        self.state.verdict_history.push_front(verdict.clone());
        self.state.verdict_history.truncate(self.config.verdict_history_len);

        self.emit(PollerEvent::Verdict {
            verdict,
            statistics: self.state.statistics.clone(),
        });
    }

    fn emit(&self, event: PollerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No event listeners");
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            current_prediction: self.state.pending.clone(),
            current_period: self.state.current_period.clone(),
            latest_draws: self.state.latest_draws.clone(),
            statistics: self.state.statistics.clone(),
            verdict_history: self.state.verdict_history.clone(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
