//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] pricewatch_core::CoreError),

    #[error("Feed error: {0}")]
    Feed(#[from] pricewatch_feed::FeedError),

    #[error("Notify error: {0}")]
    Notify(#[from] pricewatch_notify::NotifyError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pricewatch_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] pricewatch_persistence::PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
