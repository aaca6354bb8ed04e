//! End-of-run alert summary.
//!
//! Reads the process-wide counters back and logs a one-shot overview of
//! what the monitor did: cycles, alerts per rule, suppressions, failures.

use crate::metrics::{
    ALERTS_NOTIFIED_TOTAL, ALERTS_SUPPRESSED_TOTAL, CYCLES_TOTAL, NOTIFY_FAILURES_TOTAL,
    TICKERS_SKIPPED_TOTAL,
};
use prometheus::core::Collector;
use prometheus::IntCounterVec;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Snapshot of alert counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    /// Cycles keyed by session.
    pub cycles: BTreeMap<String, u64>,
    /// Delivered alerts keyed by rule.
    pub notified: BTreeMap<String, u64>,
    /// Suppressed alerts keyed by gate reason.
    pub suppressed: BTreeMap<String, u64>,
    /// Failed notifications keyed by rule.
    pub notify_failures: BTreeMap<String, u64>,
    /// Skipped tickers keyed by reason.
    pub skipped: BTreeMap<String, u64>,
}

impl AlertSummary {
    pub fn total_notified(&self) -> u64 {
        self.notified.values().sum()
    }

    pub fn total_suppressed(&self) -> u64 {
        self.suppressed.values().sum()
    }

    pub fn total_cycles(&self) -> u64 {
        self.cycles.values().sum()
    }
}

/// Builds [`AlertSummary`] snapshots from the registered counters.
#[derive(Debug, Default)]
pub struct SummaryReporter;

impl SummaryReporter {
    pub fn new() -> Self {
        Self
    }

    /// Current counter values.
    pub fn snapshot(&self) -> AlertSummary {
        AlertSummary {
            cycles: by_label(&CYCLES_TOTAL),
            notified: by_label(&ALERTS_NOTIFIED_TOTAL),
            suppressed: by_label(&ALERTS_SUPPRESSED_TOTAL),
            notify_failures: by_label(&NOTIFY_FAILURES_TOTAL),
            skipped: by_label(&TICKERS_SKIPPED_TOTAL),
        }
    }

    /// Log the current snapshot.
    pub fn log_summary(&self) -> AlertSummary {
        let summary = self.snapshot();
        info!(
            cycles = summary.total_cycles(),
            notified = summary.total_notified(),
            suppressed = summary.total_suppressed(),
            by_rule = ?summary.notified,
            notify_failures = ?summary.notify_failures,
            skipped = ?summary.skipped,
            "Alert summary"
        );
        summary
    }
}

/// Sum a single-label counter vec into label value -> count.
fn by_label(counter: &IntCounterVec) -> BTreeMap<String, u64> {
    let mut out = BTreeMap::new();
    for family in counter.collect() {
        for metric in family.get_metric() {
            let Some(label) = metric.get_label().first() else {
                continue;
            };
            let value = metric.get_counter().get_value() as u64;
            *out.entry(label.get_value().to_string()).or_insert(0) += value;
        }
    }
    out
}
