//! Market data source trait.

use crate::chart::{ChartPoint, ChartSeries};
use crate::error::{FeedError, FeedResult};
use parking_lot::Mutex;
pub use pricewatch_core::BoxFuture;
use pricewatch_core::{Price, PriceObservation};
use std::collections::HashMap;
use std::sync::Arc;

/// Source of recent prices per ticker.
///
/// `Ok(None)` means the source has no usable data for the ticker right now.
/// Both `Ok(None)` and `Err` make the caller skip the ticker for the cycle.
pub trait MarketDataSource: Send + Sync {
    /// Previous and current observations on the polling timeline.
    fn latest_pair<'a>(
        &'a self,
        ticker: &'a str,
    ) -> BoxFuture<'a, FeedResult<Option<(PriceObservation, PriceObservation)>>>;

    /// Closes over the analysis window, oldest first.
    fn history<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, FeedResult<Vec<Price>>>;
}

/// Arc wrapper for MarketDataSource trait objects.
pub type DynMarketDataSource = Arc<dyn MarketDataSource>;

/// Scripted data source.
///
/// Each ticker holds a chart series; a ticker can also be made to fail.
#[derive(Debug, Default)]
pub struct StaticPriceSource {
    series: Mutex<HashMap<String, ChartSeries>>,
    failures: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the series for `ticker`.
    pub fn set_series(&self, ticker: &str, series: ChartSeries) {
        self.failures.lock().remove(ticker);
        self.series.lock().insert(ticker.to_string(), series);
    }

    /// Set `ticker` to a two-bar series one minute apart.
    pub fn set_pair(&self, ticker: &str, previous: Price, current: Price) {
        let now = chrono::Utc::now();
        self.set_series(
            ticker,
            ChartSeries::new(vec![
                ChartPoint {
                    timestamp: now - chrono::Duration::minutes(1),
                    close: Some(previous),
                },
                ChartPoint {
                    timestamp: now,
                    close: Some(current),
                },
            ]),
        );
    }

    /// Make every request for `ticker` fail.
    pub fn fail(&self, ticker: &str, reason: &str) {
        self.failures
            .lock()
            .insert(ticker.to_string(), reason.to_string());
    }

    /// Tickers requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn lookup(&self, ticker: &str) -> FeedResult<Option<ChartSeries>> {
        self.requests.lock().push(ticker.to_string());
        if let Some(reason) = self.failures.lock().get(ticker) {
            return Err(FeedError::HttpClient(reason.clone()));
        }
        Ok(self.series.lock().get(ticker).cloned())
    }
}

impl MarketDataSource for StaticPriceSource {
    fn latest_pair<'a>(
        &'a self,
        ticker: &'a str,
    ) -> BoxFuture<'a, FeedResult<Option<(PriceObservation, PriceObservation)>>> {
        Box::pin(async move { Ok(self.lookup(ticker)?.and_then(|s| s.latest_pair())) })
    }

    fn history<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, FeedResult<Vec<Price>>> {
        Box::pin(async move {
            Ok(self
                .lookup(ticker)?
                .map(|s| s.closes())
                .unwrap_or_default())
        })
    }
}
