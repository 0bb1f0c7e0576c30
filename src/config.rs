use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_no")]
    pub page_no: u32,
    #[serde(default = "default_type_id")]
    pub type_id: u32,
    #[serde(default)]
    pub language: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_ms: u64,
    #[serde(default = "default_clock_interval")]
    pub clock_interval_ms: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_draw_window")]
    pub draw_window: usize,
    #[serde(default = "default_verdict_history")]
    pub verdict_history_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Formula,
    #[default]
    History,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub kind: StrategyKind,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Fixed seed for the tie-break RNG; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_log_path")]
    pub csv_log_path: String,
}

fn default_log_level() -> String { "info".to_string() }
fn default_api_url() -> String {
    "https://api.bdg88zf.com/api/webapi/GetNoaverageEmerdList".to_string()
}
fn default_page_size() -> u32 { 10 }
fn default_page_no() -> u32 { 1 }
fn default_type_id() -> u32 { 1 }
fn default_request_timeout() -> u64 { 10 }
fn default_fetch_interval() -> u64 { 5000 }
fn default_clock_interval() -> u64 { 1000 }
fn default_fetch_timeout() -> u64 { 8000 }
fn default_draw_window() -> usize { 10 }
fn default_verdict_history() -> usize { 50 }
fn default_history_window() -> usize { 5 }
fn default_csv_log_path() -> String { "verdicts.csv".to_string() }

impl Default for SystemConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            page_no: default_page_no(),
            type_id: default_type_id(),
            language: 0,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            fetch_interval_ms: default_fetch_interval(),
            clock_interval_ms: default_clock_interval(),
            fetch_timeout_ms: default_fetch_timeout(),
            draw_window: default_draw_window(),
            verdict_history_len: default_verdict_history(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::default(),
            history_window: default_history_window(),
            seed: None,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: false,
            csv_log_path: default_csv_log_path(),
        }
    }
}

/// Secrets and per-deployment overrides, read from the environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub config_path: String,
    pub draw_api_url: Option<String>,
    /// Opaque anti-tampering fields, forwarded to the source verbatim
    pub draw_api_random: String,
    pub draw_api_signature: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.poller.fetch_interval_ms == 0 || self.poller.clock_interval_ms == 0 {
            anyhow::bail!("poller intervals must be non-zero");
        }
        if self.poller.fetch_timeout_ms == 0 {
            anyhow::bail!("poller.fetch_timeout_ms must be non-zero");
        }
        if self.strategy.history_window == 0 {
            anyhow::bail!("strategy.history_window must be at least 1");
        }
        if self.strategy.kind == StrategyKind::History
            && self.poller.draw_window < self.strategy.history_window
        {
            anyhow::bail!(
                "poller.draw_window ({}) is smaller than strategy.history_window ({})",
                self.poller.draw_window,
                self.strategy.history_window
            );
        }
        Ok(())
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            config_path: std::env::var("CONFIG_PATH")
                .unwrap_or_else(|_| "config.toml".to_string()),
            draw_api_url: std::env::var("DRAW_API_URL").ok(),
            draw_api_random: std::env::var("DRAW_API_RANDOM")
                .context("DRAW_API_RANDOM not set")?,
            draw_api_signature: std::env::var("DRAW_API_SIGNATURE")
                .context("DRAW_API_SIGNATURE not set")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.poller.fetch_interval_ms, 5000);
        assert_eq!(config.poller.verdict_history_len, 50);
        assert_eq!(config.source.page_size, 10);
        assert_eq!(config.strategy.kind, StrategyKind::History);
        assert!(!config.monitoring.csv_logging);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [poller]
            fetch_interval_ms = 1000

            [strategy]
            kind = "formula"
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.poller.fetch_interval_ms, 1000);
        assert_eq!(config.poller.clock_interval_ms, 1000);
        assert_eq!(config.strategy.kind, StrategyKind::Formula);
        assert_eq!(config.strategy.seed, Some(7));
        assert_eq!(config.strategy.history_window, 5);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Config::parse("[poller]\nfetch_interval_ms = 0").is_err());
    }

    #[test]
    fn test_zero_fetch_timeout_rejected() {
        assert!(Config::parse("[poller]\nfetch_timeout_ms = 0").is_err());
    }

    #[test]
    fn test_draw_window_must_cover_history_window() {
        let too_small = "[poller]\ndraw_window = 3\n[strategy]\nhistory_window = 5";
        assert!(Config::parse(too_small).is_err());

        // the formula strategy never reads history
        let formula = "[poller]\ndraw_window = 3\n[strategy]\nkind = \"formula\"\nhistory_window = 5";
        assert!(Config::parse(formula).is_ok());

        let exact = "[poller]\ndraw_window = 5\n[strategy]\nhistory_window = 5";
        assert!(Config::parse(exact).is_ok());
    }
}
