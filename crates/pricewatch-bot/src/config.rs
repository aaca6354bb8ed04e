//! Application configuration.
//!
//! Loaded once from TOML at startup; every section and field has a default,
//! so an empty file (or no file) is a valid configuration.

use crate::error::{AppError, AppResult};
use pricewatch_core::{SessionBoundaries, SessionCalendar};
use pricewatch_feed::ChartClientConfig;
use pricewatch_gate::GateSemantics;
use pricewatch_notify::{PushoverConfig, DEFAULT_PUSHOVER_URL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "PRICEWATCH_CONFIG";

/// Env var overriding `notifier.pushover.user_key`.
pub const PUSHOVER_USER_KEY_ENV: &str = "PUSHOVER_USER_KEY";

/// Env var overriding `notifier.pushover.api_token`.
pub const PUSHOVER_API_TOKEN_ENV: &str = "PUSHOVER_API_TOKEN";

/// Exchange calendar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// IANA time zone of the exchange.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_pre_market_start")]
    pub pre_market_start: String,
    #[serde(default = "default_market_open")]
    pub market_open: String,
    #[serde(default = "default_market_close")]
    pub market_close: String,
    #[serde(default = "default_post_market_end")]
    pub post_market_end: String,
    /// Treat Saturday and Sunday as closed.
    #[serde(default = "default_true")]
    pub weekends_closed: bool,
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_pre_market_start() -> String {
    "04:00".to_string()
}

fn default_market_open() -> String {
    "09:30".to_string()
}

fn default_market_close() -> String {
    "16:00".to_string()
}

fn default_post_market_end() -> String {
    "20:00".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            pre_market_start: default_pre_market_start(),
            market_open: default_market_open(),
            market_close: default_market_close(),
            post_market_end: default_post_market_end(),
            weekends_closed: true,
        }
    }
}

impl MarketConfig {
    /// Build the session calendar. Fails on unknown zones or unordered boundaries.
    pub fn session_calendar(&self) -> AppResult<SessionCalendar> {
        let boundaries = SessionBoundaries::parse(
            &self.pre_market_start,
            &self.market_open,
            &self.market_close,
            &self.post_market_end,
        )?;
        let timezone = SessionCalendar::parse_timezone(&self.timezone)?;
        Ok(SessionCalendar::new(
            boundaries,
            timezone,
            self.weekends_closed,
        ))
    }
}

/// Market data endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_chart_url")]
    pub chart_url: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_analysis_range")]
    pub analysis_range: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_chart_url() -> String {
    pricewatch_feed::DEFAULT_CHART_URL.to_string()
}

fn default_interval() -> String {
    "5m".to_string()
}

fn default_range() -> String {
    "1d".to_string()
}

fn default_analysis_range() -> String {
    "1mo".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            chart_url: default_chart_url(),
            interval: default_interval(),
            range: default_range(),
            analysis_range: default_analysis_range(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FeedConfig {
    pub fn client_config(&self) -> ChartClientConfig {
        ChartClientConfig {
            base_url: self.chart_url.clone(),
            interval: self.interval.clone(),
            range: self.range.clone(),
            analysis_range: self.analysis_range.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Frequency gate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub semantics: GateSemantics,
}

/// Pushover settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushoverSettings {
    #[serde(default = "default_pushover_url")]
    pub api_url: String,
    #[serde(default)]
    pub user_key: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_pushover_url() -> String {
    DEFAULT_PUSHOVER_URL.to_string()
}

impl Default for PushoverSettings {
    fn default() -> Self {
        Self {
            api_url: default_pushover_url(),
            user_key: None,
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Notifier configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub pushover: PushoverSettings,
}

impl NotifierConfig {
    pub fn pushover_config(&self) -> PushoverConfig {
        PushoverConfig {
            api_url: self.pushover.api_url.clone(),
            user_key: self.pushover.user_key.clone(),
            api_token: self.pushover.api_token.clone(),
            timeout: Duration::from_secs(self.pushover.timeout_secs),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_history_path")]
    pub history_path: String,
    #[serde(default = "default_alert_log_path")]
    pub alert_log_path: String,
    #[serde(default = "default_api_log_path")]
    pub api_log_path: String,
}

fn default_history_path() -> String {
    "alert_history.json".to_string()
}

fn default_alert_log_path() -> String {
    "stock_monitor.log".to_string()
}

fn default_api_log_path() -> String {
    "api_log.txt".to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            alert_log_path: default_alert_log_path(),
            api_log_path: default_api_log_path(),
        }
    }
}

/// Polling loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    /// Run a single cycle and exit.
    #[serde(default)]
    pub run_once: bool,
}

fn default_poll_interval_secs() -> u64 {
    300
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            run_once: false,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default tracing directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Watchlist CSV file.
    #[serde(default = "default_watchlist_path")]
    pub watchlist_path: String,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_watchlist_path() -> String {
    "watchlist.txt".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watchlist_path: default_watchlist_path(),
            market: MarketConfig::default(),
            feed: FeedConfig::default(),
            gate: GateConfig::default(),
            notifier: NotifierConfig::default(),
            persistence: PersistenceConfig::default(),
            polling: PollingConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Where [`AppConfig::load`] took its settings from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    /// No file named and the default file is absent.
    Defaults,
}

impl ConfigSource {
    /// `cli_path`, else `env_path`, else the default file if it exists.
    pub fn resolve(cli_path: Option<&str>, env_path: Option<String>, default_exists: bool) -> Self {
        match cli_path.map(str::to_string).or(env_path) {
            Some(path) => Self::File(path),
            None if default_exists => Self::File(DEFAULT_CONFIG_PATH.to_string()),
            None => Self::Defaults,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path: `cli_path`, else `PRICEWATCH_CONFIG`, else `config/default.toml`.
    /// An explicitly named file must exist; a missing default file yields
    /// built-in defaults. Pushover credentials are then overridden from the
    /// environment. Runs before logging is up, so the source is returned for
    /// the caller to report.
    pub fn load(cli_path: Option<&str>) -> AppResult<(Self, ConfigSource)> {
        let source = ConfigSource::resolve(
            cli_path,
            std::env::var(CONFIG_ENV).ok(),
            Path::new(DEFAULT_CONFIG_PATH).exists(),
        );

        let mut config = match &source {
            ConfigSource::File(path) => Self::from_file(path)?,
            ConfigSource::Defaults => Self::default(),
        };

        config.apply_credential_overrides(
            std::env::var(PUSHOVER_USER_KEY_ENV).ok(),
            std::env::var(PUSHOVER_API_TOKEN_ENV).ok(),
        );
        Ok((config, source))
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Replace Pushover credentials with non-empty overrides.
    pub fn apply_credential_overrides(&mut self, user_key: Option<String>, api_token: Option<String>) {
        if let Some(user_key) = user_key.filter(|v| !v.trim().is_empty()) {
            self.notifier.pushover.user_key = Some(user_key);
        }
        if let Some(api_token) = api_token.filter(|v| !v.trim().is_empty()) {
            self.notifier.pushover.api_token = Some(api_token);
        }
    }

    /// Check startup-fatal settings.
    pub fn validate(&self) -> AppResult<()> {
        self.market.session_calendar()?;
        if self.feed.interval.trim().is_empty() || self.feed.range.trim().is_empty() {
            return Err(AppError::Config(
                "feed.interval and feed.range must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
