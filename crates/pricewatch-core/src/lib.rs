//! Core domain types for pricewatch.
//!
//! This crate provides the fundamental types used throughout the alerting system:
//! - `Watchlist`, `WatchlistEntry`: validated per-ticker alert configuration
//! - `Price`, `PriceObservation`: precision-safe price points
//! - `MarketSession`, `SessionCalendar`: trading-day phase classification
//! - `Clock`: injectable wall-clock source

pub mod clock;
pub mod decimal;
pub mod error;
pub mod future;
pub mod session;
pub mod types;
pub mod watchlist;

pub use clock::{Clock, FixedClock, SystemClock};
pub use decimal::Price;
pub use error::{CoreError, Result};
pub use future::BoxFuture;
pub use session::{MarketSession, SessionBoundaries, SessionCalendar};
pub use types::{AlertRecord, HistoryEntry, PriceObservation};
pub use watchlist::{
    AlertFrequency, Direction, Watchlist, WatchlistEntry, WatchlistParse, WatchlistRow,
    WatchlistWarning, DEFAULT_THRESHOLD_PERCENT,
};
