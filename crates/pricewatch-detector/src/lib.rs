//! Price change evaluation for pricewatch.
//!
//! Turns a watchlist entry plus a previous/current price pair into the set of
//! alert events whose rules fire:
//! - Percent-change rule (threshold + direction)
//! - Absolute target rules (`price_below`, `price_above`)
//!
//! Also provides threshold back-analysis over a historical price series.

pub mod analysis;
pub mod detector;
pub mod error;
pub mod signal;

pub use analysis::{count_threshold_crossings, ThresholdCount, DEFAULT_ANALYSIS_THRESHOLDS};
pub use detector::{evaluate, percent_change};
pub use error::{DetectorError, DetectorResult};
pub use signal::{AlertEvent, RuleKind};
