//! HTTP client for the chart endpoint.
//!
//! Requests `GET {base_url}/{ticker}?range={range}&interval={interval}`.
//! When an API log is attached, each request and its outcome are appended as
//! `Request: ...` / `Response: ...` lines.

use crate::chart::{parse_chart, ChartSeries};
use crate::error::{FeedError, FeedResult};
use crate::source::{BoxFuture, MarketDataSource};
use chrono_tz::Tz;
use pricewatch_core::{Clock, Price, PriceObservation, SystemClock};
use pricewatch_persistence::LineLog;
use pricewatch_telemetry::Metrics;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default chart endpoint.
pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Chart client settings.
#[derive(Debug, Clone)]
pub struct ChartClientConfig {
    pub base_url: String,
    /// Bar size, e.g. `5m`.
    pub interval: String,
    /// Window for polling, e.g. `1d`.
    pub range: String,
    /// Window for threshold analysis, e.g. `1mo`.
    pub analysis_range: String,
    pub timeout: Duration,
}

impl Default for ChartClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHART_URL.to_string(),
            interval: "5m".to_string(),
            range: "1d".to_string(),
            analysis_range: "1mo".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for chart data.
pub struct ChartClient {
    client: Client,
    config: ChartClientConfig,
    api_log: Option<(LineLog, Tz)>,
    clock: Arc<dyn Clock>,
}

impl ChartClient {
    /// Create a new chart client.
    pub fn new(config: ChartClientConfig) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pricewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_log: None,
            clock: Arc::new(SystemClock),
        })
    }

    /// Attach an API log stamped in `timezone`.
    pub fn with_api_log(mut self, log: LineLog, timezone: Tz) -> Self {
        self.api_log = Some((log, timezone));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ChartClientConfig {
        &self.config
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), ticker)
    }

    fn log_api(&self, line: &str) {
        if let Some((log, timezone)) = &self.api_log {
            log.append_or_warn(&self.clock.now().with_timezone(timezone), line);
        }
    }

    /// Fetch one chart series over `range`.
    pub async fn fetch_chart(&self, ticker: &str, range: &str) -> FeedResult<Option<ChartSeries>> {
        let url = self.chart_url(ticker);
        debug!(%url, range, interval = %self.config.interval, "Fetching chart");
        self.log_api(&format!(
            "Request: GET {url} range={range} interval={}",
            self.config.interval
        ));

        let started = Instant::now();
        let result = self.request(&url, range).await;
        Metrics::feed_request(range, started.elapsed().as_secs_f64() * 1000.0);

        match &result {
            Ok(Some(series)) => self.log_api(&format!(
                "Response: {ticker} received {} rows of data.",
                series.len()
            )),
            Ok(None) => self.log_api(&format!("Response: {ticker} no data.")),
            Err(e) => self.log_api(&format!("Response: {ticker} error: {e}")),
        }
        result
    }

    async fn request(&self, url: &str, range: &str) -> FeedResult<Option<ChartSeries>> {
        let response = self
            .client
            .get(url)
            .query(&[("range", range), ("interval", self.config.interval.as_str())])
            .send()
            .await
            .map_err(|e| FeedError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedError::HttpClient(format!("Failed to read response: {e}")))?;

        if status == StatusCode::NOT_FOUND {
            // Unknown symbols come back as 404 with a chart error body.
            return match parse_chart(&body) {
                Ok(series) => Ok(series),
                Err(_) => Ok(None),
            };
        }
        if !status.is_success() {
            return Err(FeedError::HttpClient(format!("HTTP {status}: {body}")));
        }

        parse_chart(&body)
    }
}

impl MarketDataSource for ChartClient {
    fn latest_pair<'a>(
        &'a self,
        ticker: &'a str,
    ) -> BoxFuture<'a, FeedResult<Option<(PriceObservation, PriceObservation)>>> {
        Box::pin(async move {
            let Some(series) = self.fetch_chart(ticker, &self.config.range).await? else {
                return Ok(None);
            };
            let pair = series.latest_pair();
            if pair.is_none() {
                warn!(ticker, bars = series.len(), "Not enough closes for a price pair");
            }
            Ok(pair)
        })
    }

    fn history<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, FeedResult<Vec<Price>>> {
        Box::pin(async move {
            let closes = self
                .fetch_chart(ticker, &self.config.analysis_range)
                .await?
                .map(|s| s.closes())
                .unwrap_or_default();
            info!(ticker, closes = closes.len(), range = %self.config.analysis_range, "Fetched price history");
            Ok(closes)
        })
    }
}
