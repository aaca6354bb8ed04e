//! Price observation types.

use crate::decimal::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A price for one instrument at a point on the polling timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub timestamp: DateTime<Utc>,
    pub price: Price,
}

impl PriceObservation {
    pub fn new(timestamp: DateTime<Utc>, price: Price) -> Self {
        Self { timestamp, price }
    }
}

/// Last successful notification for a ticker.
///
/// One record per ticker; every successful notification overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub ticker: String,
    pub last_sent_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn new(ticker: impl Into<String>, last_sent_at: DateTime<Utc>) -> Self {
        Self {
            ticker: ticker.into(),
            last_sent_at,
        }
    }
}

/// What the alert history knows about one ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    /// The ticker has never been alerted.
    Absent,
    /// A well-formed record exists.
    Present(AlertRecord),
    /// A record exists but could not be decoded.
    Corrupted(String),
}

impl HistoryEntry {
    pub fn record(&self) -> Option<&AlertRecord> {
        match self {
            Self::Present(record) => Some(record),
            _ => None,
        }
    }
}
