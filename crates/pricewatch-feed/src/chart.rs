//! Chart response parsing.
//!
//! Expected shape (fields not listed are ignored):
//!
//! ```json
//! {"chart": {"result": [{"timestamp": [1736519400, ...],
//!   "indicators": {"quote": [{"close": [187.42, null, ...]}]}}],
//!   "error": null}}
//! ```
//!
//! `close` entries may be `null` for bars without trades.

use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, TimeZone, Utc};
use pricewatch_core::{Price, PriceObservation};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// One bar of a chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    /// `None` when the bar has no close.
    pub close: Option<Price>,
}

/// Time-ordered bars for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSeries {
    points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn new(points: Vec<ChartPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Previous and current observations for evaluation.
    ///
    /// The current observation is the last bar and must have a close. The
    /// previous one is the closest earlier bar with a close. `None` when
    /// either is missing.
    pub fn latest_pair(&self) -> Option<(PriceObservation, PriceObservation)> {
        let (last, earlier) = self.points.split_last()?;
        let current = PriceObservation::new(last.timestamp, last.close?);
        let previous = earlier
            .iter()
            .rev()
            .find_map(|p| p.close.map(|c| PriceObservation::new(p.timestamp, c)))?;
        Some((previous, current))
    }

    /// All non-null closes, oldest first.
    pub fn closes(&self) -> Vec<Price> {
        self.points.iter().filter_map(|p| p.close).collect()
    }
}

/// Parse a chart response body.
///
/// Returns `Ok(None)` when the endpoint reports no data for the symbol.
pub fn parse_chart(body: &str) -> FeedResult<Option<ChartSeries>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.chart.error {
        if err.code.eq_ignore_ascii_case("Not Found") {
            return Ok(None);
        }
        let description = err.description.unwrap_or_default();
        return Err(FeedError::Api(format!("{}: {}", err.code, description)));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(None);
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (idx, ts) in result.timestamp.iter().enumerate() {
        let timestamp = Utc
            .timestamp_opt(*ts, 0)
            .single()
            .ok_or_else(|| FeedError::Parse(format!("invalid timestamp {ts} at index {idx}")))?;
        let close = closes
            .get(idx)
            .copied()
            .flatten()
            .and_then(Price::from_f64);
        points.push(ChartPoint { timestamp, close });
    }

    if points.is_empty() {
        return Ok(None);
    }
    Ok(Some(ChartSeries::new(points)))
}
