//! Prometheus metrics for pricewatch.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

/// Polling cycles started.
/// Labels: session (pre-market/regular/post-market/closed)
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pricewatch_cycles_total",
        "Polling cycles by market session",
        &["session"]
    )
    .unwrap()
});

/// Alerts delivered to the notifier.
/// Labels: rule (percent_change/price_below/price_above)
pub static ALERTS_NOTIFIED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pricewatch_alerts_notified_total",
        "Alerts delivered by rule",
        &["rule"]
    )
    .unwrap()
});

/// Alerts blocked by the frequency gate.
/// Labels: reason (once_already_sent/same_period)
pub static ALERTS_SUPPRESSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pricewatch_alerts_suppressed_total",
        "Alerts suppressed by the frequency gate",
        &["reason"]
    )
    .unwrap()
});

/// Notification attempts that failed.
/// Labels: rule
pub static NOTIFY_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pricewatch_notify_failures_total",
        "Failed notification attempts by rule",
        &["rule"]
    )
    .unwrap()
});

/// Tickers skipped within a cycle.
/// Labels: reason (no_data/fetch_error/zero_previous)
pub static TICKERS_SKIPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pricewatch_tickers_skipped_total",
        "Tickers skipped during a cycle",
        &["reason"]
    )
    .unwrap()
});

/// Market data request latency in milliseconds.
pub static FEED_REQUEST_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pricewatch_feed_request_ms",
        "Market data request latency in milliseconds",
        &["kind"],
        vec![25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Watchlist size after the last load.
pub static WATCHLIST_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("pricewatch_watchlist_size", "Tickers in the watchlist").unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a polling cycle in `session`.
    pub fn cycle(session: &str) {
        CYCLES_TOTAL.with_label_values(&[session]).inc();
    }

    /// Record an alert delivered for `rule`.
    pub fn alert_notified(rule: &str) {
        ALERTS_NOTIFIED_TOTAL.with_label_values(&[rule]).inc();
    }

    /// Record an alert suppressed by the gate.
    pub fn alert_suppressed(reason: &str) {
        ALERTS_SUPPRESSED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a failed notification.
    pub fn notify_failed(rule: &str) {
        NOTIFY_FAILURES_TOTAL.with_label_values(&[rule]).inc();
    }

    /// Record a skipped ticker.
    pub fn ticker_skipped(reason: &str) {
        TICKERS_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a market data request latency.
    pub fn feed_request(kind: &str, latency_ms: f64) {
        FEED_REQUEST_MS.with_label_values(&[kind]).observe(latency_ms);
    }

    /// Set the watchlist size.
    pub fn watchlist_size(size: usize) {
        WATCHLIST_SIZE.set(size as i64);
    }
}
