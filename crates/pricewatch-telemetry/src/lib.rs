//! Prometheus metrics and structured logging for pricewatch.
//!
//! - Prometheus counters for polling cycles, alerts, suppressions, failures
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - End-of-run alert summary

pub mod error;
pub mod logging;
pub mod metrics;
pub mod summary;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use summary::{AlertSummary, SummaryReporter};
