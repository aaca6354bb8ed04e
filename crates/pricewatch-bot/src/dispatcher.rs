//! Alert dispatcher.
//!
//! For each evaluated event: frequency gate against the stored record, then
//! alert log, then one
//! notification attempt, then (on success only) an overwrite of the
//! ticker's alert record. Suppressed events leave no trace besides a log line.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use pricewatch_core::{AlertRecord, WatchlistEntry};
use pricewatch_detector::AlertEvent;
use pricewatch_gate::{FrequencyGate, GateDecision, GateSemantics};
use pricewatch_notify::DynNotifier;
use pricewatch_persistence::{AlertHistoryStore, LineLog};
use pricewatch_telemetry::Metrics;
use tracing::{info, warn};

/// Immutable dispatcher settings.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub semantics: GateSemantics,
    /// Exchange time zone; defines day / week / month boundaries.
    pub timezone: Tz,
}

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered and recorded.
    Notified,
    /// Blocked by the frequency gate.
    Suppressed(GateDecision),
    /// Gate passed but delivery failed; history untouched.
    NotifyFailed,
}

/// Alert dispatcher.
pub struct Dispatcher {
    config: DispatcherConfig,
    gate: FrequencyGate,
    notifier: DynNotifier,
    history: Box<dyn AlertHistoryStore>,
    alert_log: Option<LineLog>,
}

impl Dispatcher {
    pub fn new(
        config: DispatcherConfig,
        notifier: DynNotifier,
        history: Box<dyn AlertHistoryStore>,
        alert_log: Option<LineLog>,
    ) -> Self {
        Self {
            gate: FrequencyGate::new(config.semantics),
            config,
            notifier,
            history,
            alert_log,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn notifier(&self) -> &DynNotifier {
        &self.notifier
    }

    #[cfg(test)]
    fn history_entry(&self, ticker: &str) -> pricewatch_core::HistoryEntry {
        self.history.get(ticker)
    }

    /// Dispatch one event. The gate sees the record as it stands now, so an
    /// earlier success in the same cycle counts against later events.
    pub async fn dispatch(
        &mut self,
        entry: &WatchlistEntry,
        event: &AlertEvent,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        let local_now = now.with_timezone(&self.config.timezone);
        let current = self.history.get(&event.ticker);
        let decision = self
            .gate
            .decide(&event.ticker, entry.alert_frequency, &current, &local_now);

        if !decision.allows() {
            info!(
                ticker = %event.ticker,
                rule = %event.rule_kind,
                reason = %decision,
                message = %event.message,
                "Alert suppressed"
            );
            Metrics::alert_suppressed(decision.as_str());
            return DispatchOutcome::Suppressed(decision);
        }

        info!(
            ticker = %event.ticker,
            rule = %event.rule_kind,
            reason = %decision,
            current_price = %event.current_price,
            "{}",
            event.message
        );
        if let Some(log) = &self.alert_log {
            log.append_or_warn(&local_now, &event.message);
        }

        if let Err(e) = self.notifier.send(&event.message).await {
            warn!(ticker = %event.ticker, rule = %event.rule_kind, error = %e, "Notification failed");
            Metrics::notify_failed(event.rule_kind.as_str());
            return DispatchOutcome::NotifyFailed;
        }

        Metrics::alert_notified(event.rule_kind.as_str());
        if let Err(e) = self.history.put(AlertRecord::new(&event.ticker, now)) {
            warn!(ticker = %event.ticker, error = %e, "Failed to record alert");
        }
        DispatchOutcome::Notified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pricewatch_core::{AlertFrequency, Direction, HistoryEntry, Price};
    use pricewatch_notify::{MockNotifier, NotifyError};
    use pricewatch_persistence::MemoryHistoryStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn utc(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, h, m, s).unwrap()
    }

    fn dispatcher(notifier: Arc<MockNotifier>, history: MemoryHistoryStore) -> Dispatcher {
        Dispatcher::new(
            DispatcherConfig {
                semantics: GateSemantics::Calendar,
                timezone: chrono_tz::UTC,
            },
            notifier,
            Box::new(history),
            None,
        )
    }

    fn entry(frequency: AlertFrequency) -> WatchlistEntry {
        WatchlistEntry {
            alert_frequency: frequency,
            ..WatchlistEntry::new("AAPL")
        }
    }

    fn event() -> AlertEvent {
        AlertEvent::percent_change(
            "AAPL",
            dec!(1.5),
            dec!(1.0),
            Direction::Both,
            Price::new(dec!(101.5)),
        )
    }

    #[tokio::test]
    async fn test_first_alert_notifies_and_records() {
        let notifier = Arc::new(MockNotifier::new());
        let mut d = dispatcher(notifier.clone(), MemoryHistoryStore::new());
        let now = utc(10, 15, 0, 0);

        let outcome = d
            .dispatch(&entry(AlertFrequency::Daily), &event(), now)
            .await;

        assert_eq!(outcome, DispatchOutcome::Notified);
        assert_eq!(notifier.get_sends(), vec![event().message]);
        assert_eq!(
            d.history_entry("AAPL"),
            HistoryEntry::Present(AlertRecord::new("AAPL", now))
        );
    }

    #[tokio::test]
    async fn test_same_day_suppressed_without_side_effects() {
        let notifier = Arc::new(MockNotifier::new());
        let earlier = HistoryEntry::Present(AlertRecord::new("AAPL", utc(10, 23, 59, 0)));
        let mut history = MemoryHistoryStore::new();
        history.insert("AAPL", earlier.clone());
        let mut d = dispatcher(notifier.clone(), history);

        let outcome = d
            .dispatch(&entry(AlertFrequency::Daily), &event(), utc(10, 23, 59, 30))
            .await;

        assert_eq!(outcome, DispatchOutcome::Suppressed(GateDecision::SamePeriod));
        assert!(notifier.get_sends().is_empty());
        assert_eq!(d.history_entry("AAPL"), earlier);
    }

    #[tokio::test]
    async fn test_notify_failure_leaves_history() {
        let notifier = Arc::new(MockNotifier::new());
        notifier.set_next_result(Err(NotifyError::NotConfigured("no credentials".to_string())));
        let mut d = dispatcher(notifier.clone(), MemoryHistoryStore::new());

        let outcome = d
            .dispatch(&entry(AlertFrequency::Once), &event(), utc(10, 15, 0, 0))
            .await;

        assert_eq!(outcome, DispatchOutcome::NotifyFailed);
        assert_eq!(notifier.get_sends().len(), 1);
        assert_eq!(d.history_entry("AAPL"), HistoryEntry::Absent);
    }

    #[tokio::test]
    async fn test_corrupted_record_replaced_after_success() {
        let notifier = Arc::new(MockNotifier::new());
        let corrupted = HistoryEntry::Corrupted("not a timestamp".to_string());
        let mut history = MemoryHistoryStore::new();
        history.insert("AAPL", corrupted.clone());
        let mut d = dispatcher(notifier, history);
        let now = utc(11, 0, 1, 0);

        let outcome = d
            .dispatch(&entry(AlertFrequency::Once), &event(), now)
            .await;

        assert_eq!(outcome, DispatchOutcome::Notified);
        assert_eq!(
            d.history_entry("AAPL"),
            HistoryEntry::Present(AlertRecord::new("AAPL", now))
        );
    }

    #[tokio::test]
    async fn test_alert_log_written_before_notify() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = LineLog::new(dir.path().join("stock_monitor.log"));
        let notifier = Arc::new(MockNotifier::new());
        notifier.set_next_result(Err(NotifyError::HttpClient("down".to_string())));
        let mut d = Dispatcher::new(
            DispatcherConfig {
                semantics: GateSemantics::Calendar,
                timezone: chrono_tz::America::New_York,
            },
            notifier,
            Box::new(MemoryHistoryStore::new()),
            Some(log.clone()),
        );

        // 15:00 UTC = 10:00 EST
        d.dispatch(&entry(AlertFrequency::Daily), &event(), utc(10, 15, 0, 0))
            .await;

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, format!("[2025-01-10 10:00:00] {}\n", event().message));
    }

    #[tokio::test]
    async fn test_once_second_event_same_cycle_suppressed() {
        let notifier = Arc::new(MockNotifier::new());
        let mut d = dispatcher(notifier.clone(), MemoryHistoryStore::new());
        let once = WatchlistEntry {
            price_below: Some(Price::new(dec!(160))),
            ..entry(AlertFrequency::Once)
        };
        let target = AlertEvent::price_below("AAPL", Price::new(dec!(160)), Price::new(dec!(150)));
        let now = utc(10, 15, 0, 0);

        assert_eq!(d.dispatch(&once, &event(), now).await, DispatchOutcome::Notified);
        assert_eq!(
            d.dispatch(&once, &target, now).await,
            DispatchOutcome::Suppressed(GateDecision::OnceAlreadySent)
        );
        assert_eq!(notifier.get_sends().len(), 1);
    }
}
