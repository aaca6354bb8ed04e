//! Market data sources for pricewatch.
//!
//! - `MarketDataSource`: the seam the polling loop fetches prices through
//! - `ChartClient`: HTTP client for a Yahoo-style chart endpoint
//! - `StaticPriceSource`: scripted source for tests and dry runs

pub mod chart;
pub mod client;
pub mod error;
pub mod source;

pub use chart::{parse_chart, ChartPoint, ChartSeries};
pub use client::{ChartClient, ChartClientConfig, DEFAULT_CHART_URL};
pub use error::{FeedError, FeedResult};
pub use source::{BoxFuture, DynMarketDataSource, MarketDataSource, StaticPriceSource};
