//! Stock price alert monitor.
//!
//! Main application that orchestrates all components:
//! - Market session gating of the polling loop
//! - Price fetching and rule evaluation per watchlist ticker
//! - Frequency gating against persisted alert history
//! - Notification delivery and alert logging

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;

pub use app::{Application, CycleReport, WatchlistSource};
pub use config::{AppConfig, ConfigSource, DEFAULT_CONFIG_PATH};
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherConfig};
pub use error::{AppError, AppResult};
