//! End-to-end polling cycles against file-backed history and watchlist.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pricewatch_bot::{AppConfig, Application, WatchlistSource};
use pricewatch_core::{FixedClock, HistoryEntry, MarketSession, Price};
use pricewatch_feed::StaticPriceSource;
use pricewatch_notify::{MockNotifier, NotifyError};
use pricewatch_persistence::{AlertHistoryStore, JsonHistoryStore};
use rust_decimal_macros::dec;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    source: Arc<StaticPriceSource>,
    notifier: Arc<MockNotifier>,
    clock: Arc<FixedClock>,
}

impl Fixture {
    fn new(watchlist: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("watchlist.txt"), watchlist).unwrap();
        Self {
            dir,
            source: Arc::new(StaticPriceSource::new()),
            notifier: Arc::new(MockNotifier::new()),
            // Friday 2025-01-10 10:00 EST
            clock: Arc::new(FixedClock::new(at(2025, 1, 10, 15, 0))),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn app(&self) -> Application {
        let mut config = AppConfig::default();
        config.watchlist_path = self.path("watchlist.txt").display().to_string();
        config.persistence.history_path = self.path("alert_history.json").display().to_string();
        config.persistence.alert_log_path = self.path("stock_monitor.log").display().to_string();

        Application::with_components(
            WatchlistSource::File(PathBuf::from(&config.watchlist_path)),
            self.source.clone(),
            self.notifier.clone(),
            Box::new(JsonHistoryStore::open(&config.persistence.history_path)),
            self.clock.clone(),
            config,
        )
        .unwrap()
    }
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn px(v: rust_decimal::Decimal) -> Price {
    Price::new(v)
}

fn history(path: &Path, ticker: &str) -> HistoryEntry {
    JsonHistoryStore::open(path).get(ticker)
}

#[tokio::test]
async fn test_daily_alert_once_per_exchange_day() {
    let fx = Fixture::new("ticker,threshold,direction\nAAPL,1.0,both\n");
    fx.source.set_pair("AAPL", px(dec!(100.00)), px(dec!(101.50)));
    let mut app = fx.app();

    let report = app.run_cycle().await;
    assert_eq!(report.session, MarketSession::Regular);
    assert_eq!(report.notified, 1);
    assert!(fx.notifier.get_sends()[0].contains("+1.50%"));
    assert_eq!(
        history(&fx.path("alert_history.json"), "AAPL")
            .record()
            .map(|r| r.last_sent_at),
        Some(at(2025, 1, 10, 15, 0))
    );

    fx.clock.advance(Duration::minutes(5));
    let report = app.run_cycle().await;
    assert_eq!(report.suppressed, 1);
    assert_eq!(fx.notifier.get_sends().len(), 1);

    // Monday pre-market
    fx.clock.set(at(2025, 1, 13, 10, 0));
    let report = app.run_cycle().await;
    assert_eq!(report.session, MarketSession::PreMarket);
    assert_eq!(report.notified, 1);
    assert_eq!(fx.notifier.get_sends().len(), 2);

    let log = std::fs::read_to_string(fx.path("stock_monitor.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.starts_with("[2025-01-10 10:00:00] Unusual price change detected for AAPL"));
}

#[tokio::test]
async fn test_second_event_same_day_suppressed() {
    let fx = Fixture::new("ticker,threshold,direction,price_below\nMSFT,1,drop,100\n");
    fx.source.set_pair("MSFT", px(dec!(100)), px(dec!(90)));
    let mut app = fx.app();

    let report = app.run_cycle().await;
    assert_eq!(report.notified, 1);
    assert_eq!(report.suppressed, 1);
    assert!(fx.notifier.get_sends()[0].starts_with("Unusual price change detected for MSFT"));

    fx.clock.advance(Duration::minutes(5));
    let report = app.run_cycle().await;
    assert_eq!(report.notified, 0);
    assert_eq!(report.suppressed, 2);
}

#[tokio::test]
async fn test_once_fires_single_alert_when_rules_coincide() {
    let fx = Fixture::new(
        "ticker,threshold,direction,price_below,price_above,alert_frequency\nTSLA,1,both,160,,once\n",
    );
    fx.source.set_pair("TSLA", px(dec!(200)), px(dec!(150)));
    let mut app = fx.app();

    let report = app.run_cycle().await;
    assert_eq!(report.notified, 1);
    assert_eq!(report.suppressed, 1);
    assert_eq!(fx.notifier.get_sends().len(), 1);
}

#[tokio::test]
async fn test_notify_failure_retries_next_cycle() {
    let fx = Fixture::new("ticker,threshold,direction,price_below,price_above,alert_frequency\nTSLA,1,both,,,once\n");
    fx.source.set_pair("TSLA", px(dec!(200)), px(dec!(150)));
    fx.notifier
        .set_next_result(Err(NotifyError::NotConfigured("missing credentials".to_string())));
    let mut app = fx.app();

    let report = app.run_cycle().await;
    assert_eq!(report.failed, 1);
    assert_eq!(history(&fx.path("alert_history.json"), "TSLA"), HistoryEntry::Absent);

    fx.notifier.set_next_result(Ok(()));
    fx.clock.advance(Duration::minutes(5));
    let report = app.run_cycle().await;
    assert_eq!(report.notified, 1);

    // once: never again
    fx.clock.set(at(2025, 3, 3, 15, 0));
    let report = app.run_cycle().await;
    assert_eq!(report.suppressed, 1);
}

#[tokio::test]
async fn test_corrupted_history_fails_open_and_is_rewritten() {
    let fx = Fixture::new("ticker,threshold,direction,price_below,price_above,alert_frequency\nNVDA,0.5\n");
    std::fs::write(
        fx.path("alert_history.json"),
        r#"{"NVDA": {"last_sent_at": 12}}"#,
    )
    .unwrap();
    fx.source.set_pair("NVDA", px(dec!(100)), px(dec!(99)));
    let mut app = fx.app();

    let report = app.run_cycle().await;
    assert_eq!(report.notified, 1);
    assert!(matches!(
        history(&fx.path("alert_history.json"), "NVDA"),
        HistoryEntry::Present(_)
    ));
}

#[tokio::test]
async fn test_watchlist_reloaded_each_cycle() {
    let fx = Fixture::new("ticker,threshold,direction,price_below,price_above,alert_frequency\nAAPL\n");
    fx.source.set_pair("AAPL", px(dec!(100)), px(dec!(100)));
    fx.source.set_pair("AMZN", px(dec!(100)), px(dec!(120)));
    let mut app = fx.app();

    assert_eq!(app.run_cycle().await.tickers, 1);

    std::fs::write(fx.path("watchlist.txt"), "ticker,threshold,direction\nAAPL\nAMZN,5,gain\n").unwrap();
    let report = app.run_cycle().await;
    assert_eq!(report.tickers, 2);
    assert_eq!(report.notified, 1);
    assert!(fx.notifier.get_sends()[0].starts_with("Unusual price change detected for AMZN"));
}

#[tokio::test]
async fn test_after_hours_is_closed() {
    let fx = Fixture::new("ticker,threshold,direction,price_below,price_above,alert_frequency\nAAPL\n");
    fx.source.set_pair("AAPL", px(dec!(100)), px(dec!(150)));
    // 20:30 EST
    fx.clock.set(at(2025, 1, 11, 1, 30));
    let mut app = fx.app();

    let report = app.run_cycle().await;
    assert_eq!(report.session, MarketSession::Closed);
    assert!(fx.source.requests().is_empty());
    assert!(fx.notifier.get_sends().is_empty());
}
