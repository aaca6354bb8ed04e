//! Error types for pricewatch-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid session boundaries: {0}")]
    InvalidSession(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
