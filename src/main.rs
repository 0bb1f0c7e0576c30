mod config;
mod data;
mod monitoring;
mod poller;
mod scoring;
mod strategies;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::EnvFilter;
use config::{Config, EnvConfig, StrategyConfig, StrategyKind};
use data::draw_api::DrawApiClient;
use monitoring::logger::VerdictLogger;
use poller::{Cue, Poller, PollerEvent, Snapshot};
use strategies::formula::FormulaPredictor;
use strategies::history::HistoryPredictor;
use strategies::types::Predictor;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let env_config = EnvConfig::load()?;
    let config = Config::load(&env_config.config_path)?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.system.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("🚀 drawwatch starting...");
    tracing::info!("Config: {}", env_config.config_path);
    tracing::info!("Strategy: {:?}", config.strategy.kind);
    tracing::info!("Fetch interval: {}ms", config.poller.fetch_interval_ms);

    let client = DrawApiClient::new(&config.source, &env_config)?;
    let predictor = build_predictor(&config.strategy);
    let poller = Poller::new(config.poller.clone(), Arc::new(client), predictor);

    let verdict_log = if config.monitoring.csv_logging {
        tracing::info!("Verdict journal: {}", config.monitoring.csv_log_path);
        Some(VerdictLogger::new(config.monitoring.csv_log_path.clone())?)
    } else {
        None
    };

    let events = tokio::spawn(listen_events(poller.subscribe_events(), verdict_log));
    let display = tokio::spawn(watch_snapshots(poller.subscribe_snapshots()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_task = tokio::spawn(poller.run(shutdown_rx));

    tracing::info!("✅ Poller running, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    shutdown_tx.send(true).ok();
    poller_task.await??;

    // both listeners end once the poller's channels close
    events.await?;
    display.await?;

    Ok(())
}

fn build_predictor(config: &StrategyConfig) -> Box<dyn Predictor> {
    match config.kind {
        StrategyKind::Formula => Box::new(FormulaPredictor::new()),
        StrategyKind::History => {
            let rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            Box::new(HistoryPredictor::new(config.history_window, rng))
        }
    }
}

/// Stand-in for the audio/animation collaborators: log each cue and
/// journal verdicts.
async fn listen_events(
    mut rx: broadcast::Receiver<PollerEvent>,
    verdict_log: Option<VerdictLogger>,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Event listener lagged, skipped {} events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event.cue() {
            Cue::Prediction => {
                if let PollerEvent::PredictionChanged(prediction) = &event {
                    tracing::info!("🔔 prediction cue: {} for {}", prediction, prediction.for_period);
                }
            }
            Cue::Win => tracing::info!("🟢 win cue"),
            Cue::Loss => tracing::info!("🔴 loss cue"),
        }

        if let (PollerEvent::Verdict { verdict, statistics }, Some(log)) = (&event, &verdict_log) {
            if let Err(e) = log.log_verdict(verdict, statistics) {
                tracing::warn!("Failed to journal verdict {}: {}", verdict.period, e);
            }
        }
    }
}

/// Stand-in for the display: summarize every published snapshot.
async fn watch_snapshots(mut rx: watch::Receiver<Snapshot>) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow().clone();
        let prediction = snapshot
            .current_prediction
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let latest = snapshot
            .latest_draws
            .first()
            .map(|d| format!("{}={}", d.issue, d.number))
            .unwrap_or_else(|| "-".to_string());

        tracing::debug!(
            "Period {} | prediction {} | latest {} | {} games, {:.2}% won, streak {}",
            snapshot.current_period.as_ref().map(|p| p.id.as_str()).unwrap_or("-"),
            prediction,
            latest,
            snapshot.statistics.total_games,
            snapshot.statistics.win_percentage,
            snapshot.statistics.current_streak
        );
    }
}
