//! Notification error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Notification rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

pub type NotifyResult<T> = Result<T, NotifyError>;
