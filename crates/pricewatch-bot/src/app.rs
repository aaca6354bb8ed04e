//! Main application orchestration.
//!
//! Coordinates all components:
//! - Market session gating
//! - Watchlist reload per cycle
//! - Price fetching and rule evaluation
//! - Alert dispatch through the frequency gate
//! - Threshold analysis and test notifications (CLI modes)

use crate::config::AppConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher, DispatcherConfig};
use crate::error::{AppError, AppResult};
use pricewatch_core::watchlist;
use pricewatch_core::{Clock, MarketSession, SessionCalendar, SystemClock, Watchlist};
use pricewatch_detector::{count_threshold_crossings, evaluate, ThresholdCount, DEFAULT_ANALYSIS_THRESHOLDS};
use pricewatch_feed::{ChartClient, DynMarketDataSource};
use pricewatch_notify::{DynNotifier, PushoverNotifier};
use pricewatch_persistence::{AlertHistoryStore, JsonHistoryStore, LineLog};
use pricewatch_telemetry::{Metrics, SummaryReporter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Message sent by `--testpush`.
pub const TEST_NOTIFICATION: &str = "This is a test notification from the stock monitor.";

/// Where each cycle gets its watchlist from.
#[derive(Debug, Clone)]
pub enum WatchlistSource {
    /// Re-read the CSV file every cycle.
    File(PathBuf),
    /// Fixed in memory.
    Fixed(Watchlist),
}

impl WatchlistSource {
    fn load(&self) -> Watchlist {
        match self {
            Self::File(path) => watchlist::load(path).watchlist,
            Self::Fixed(watchlist) => watchlist.clone(),
        }
    }
}

/// Counts for one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub session: MarketSession,
    pub tickers: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub notified: usize,
    pub suppressed: usize,
    pub failed: usize,
}

impl CycleReport {
    fn new(session: MarketSession) -> Self {
        Self {
            session,
            tickers: 0,
            evaluated: 0,
            skipped: 0,
            notified: 0,
            suppressed: 0,
            failed: 0,
        }
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    calendar: SessionCalendar,
    watchlist: WatchlistSource,
    source: DynMarketDataSource,
    clock: Arc<dyn Clock>,
    dispatcher: Dispatcher,
}

impl Application {
    /// Create the application with live collaborators.
    ///
    /// `api_log` attaches the request/response log to the chart client.
    pub fn new(config: AppConfig, api_log: bool) -> AppResult<Self> {
        let mut client = ChartClient::new(config.feed.client_config())?;
        if api_log {
            let timezone = config.market.session_calendar()?.timezone();
            client = client.with_api_log(LineLog::new(&config.persistence.api_log_path), timezone);
        }
        let notifier = PushoverNotifier::new(config.notifier.pushover_config())?;
        let history = JsonHistoryStore::open(&config.persistence.history_path);

        Self::with_components(
            WatchlistSource::File(PathBuf::from(&config.watchlist_path)),
            Arc::new(client),
            Arc::new(notifier),
            Box::new(history),
            Arc::new(SystemClock),
            config,
        )
    }

    /// Create the application from explicit collaborators.
    pub fn with_components(
        watchlist: WatchlistSource,
        source: DynMarketDataSource,
        notifier: DynNotifier,
        history: Box<dyn AlertHistoryStore>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> AppResult<Self> {
        config.validate()?;
        let calendar = config.market.session_calendar()?;
        let dispatcher = Dispatcher::new(
            DispatcherConfig {
                semantics: config.gate.semantics,
                timezone: calendar.timezone(),
            },
            notifier,
            history,
            Some(LineLog::new(&config.persistence.alert_log_path)),
        );

        info!(
            timezone = %calendar.timezone(),
            semantics = ?config.gate.semantics,
            watchlist = %watchlist_label(&watchlist),
            "Application configured"
        );

        Ok(Self {
            config,
            calendar,
            watchlist,
            source,
            clock,
            dispatcher,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one polling cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let now = self.clock.now();
        let session = self.calendar.session_at(now);
        Metrics::cycle(session.as_str());
        let mut report = CycleReport::new(session);

        if !session.allows_polling() {
            info!(local_time = %self.calendar.local(now).format("%Y-%m-%d %H:%M:%S"), "Market closed, skipping cycle");
            return report;
        }

        let watchlist = self.watchlist.load();
        Metrics::watchlist_size(watchlist.len());
        report.tickers = watchlist.len();
        if watchlist.is_empty() {
            info!("Watchlist is empty");
            return report;
        }

        debug!(%session, tickers = watchlist.len(), "Starting cycle");

        for entry in watchlist.iter() {
            let ticker = entry.ticker.as_str();
            let (previous, current) = match self.source.latest_pair(ticker).await {
                Ok(Some(pair)) => pair,
                Ok(None) => {
                    info!(ticker, "No data, skipping");
                    Metrics::ticker_skipped("no_data");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(ticker, error = %e, "Price fetch failed, skipping");
                    Metrics::ticker_skipped("fetch_error");
                    report.skipped += 1;
                    continue;
                }
            };

            let events = match evaluate(entry, previous.price, current.price) {
                Ok(events) => events,
                Err(e) => {
                    warn!(ticker, previous = %previous.price, error = %e, "Cannot evaluate, skipping");
                    Metrics::ticker_skipped("zero_previous");
                    report.skipped += 1;
                    continue;
                }
            };
            report.evaluated += 1;

            debug!(
                ticker,
                previous_time = %previous.timestamp,
                previous_price = %previous.price.fmt_2dp(),
                current_time = %current.timestamp,
                current_price = %current.price.fmt_2dp(),
                threshold = %entry.threshold_percent,
                direction = %entry.direction,
                price_below = ?entry.price_below,
                price_above = ?entry.price_above,
                events = events.len(),
                "Evaluated"
            );

            if events.is_empty() {
                continue;
            }

            for event in &events {
                match self.dispatcher.dispatch(entry, event, now).await {
                    DispatchOutcome::Notified => report.notified += 1,
                    DispatchOutcome::Suppressed(_) => report.suppressed += 1,
                    DispatchOutcome::NotifyFailed => report.failed += 1,
                }
            }
        }

        info!(
            %session,
            tickers = report.tickers,
            evaluated = report.evaluated,
            skipped = report.skipped,
            notified = report.notified,
            suppressed = report.suppressed,
            failed = report.failed,
            "Cycle complete"
        );
        report
    }

    /// Run the polling loop until Ctrl-C, or a single cycle when `run_once`.
    pub async fn run(mut self) -> AppResult<()> {
        let reporter = SummaryReporter::new();

        if self.config.polling.run_once {
            self.run_cycle().await;
            reporter.log_summary();
            return Ok(());
        }

        let mut interval = tokio::time::interval(self.config.polling.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.config.polling.interval_secs, "Entering polling loop");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        reporter.log_summary();
        Ok(())
    }

    /// Count how many alerts each default threshold would have produced per
    /// ticker over the analysis window.
    pub async fn analyze(&self) -> Vec<(String, AppResult<Vec<ThresholdCount>>)> {
        let watchlist = self.watchlist.load();
        let mut results = Vec::with_capacity(watchlist.len());

        for entry in watchlist.iter() {
            let ticker = entry.ticker.clone();
            let result = match self.source.history(&ticker).await {
                Ok(prices) if prices.len() < 2 => {
                    info!(ticker = %ticker, bars = prices.len(), "Not enough history to analyze");
                    Ok(Vec::new())
                }
                Ok(prices) => {
                    let counts = count_threshold_crossings(&prices, &DEFAULT_ANALYSIS_THRESHOLDS);
                    for c in &counts {
                        info!(ticker = %ticker, threshold = %c.threshold, alerts = c.alerts, "Threshold analysis");
                    }
                    Ok(counts)
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "History fetch failed");
                    Err(AppError::from(e))
                }
            };
            results.push((ticker, result));
        }
        results
    }

    /// Send a fixed test message through the configured notifier.
    pub async fn send_test_notification(&self) -> AppResult<()> {
        info!("Sending test notification");
        self.dispatcher.notifier().send(TEST_NOTIFICATION).await?;
        info!("Test notification sent");
        Ok(())
    }
}

fn watchlist_label(source: &WatchlistSource) -> String {
    match source {
        WatchlistSource::File(path) => path.display().to_string(),
        WatchlistSource::Fixed(w) => format!("<{} fixed entries>", w.len()),
    }
}
