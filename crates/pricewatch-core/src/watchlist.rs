//! Watchlist model.
//!
//! Parses raw configuration rows (typically `watchlist.txt`, a CSV file with a
//! header row) into a ticker-unique, insertion-ordered [`Watchlist`].
//!
//! Parsing never fails. A malformed field degrades to its default and a
//! [`WatchlistWarning`] is recorded; a row with an empty ticker is skipped.
//! An unreadable source yields an empty watchlist, which callers report as
//! "watchlist is empty" rather than treating as fatal.

use crate::decimal::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Default percent-change threshold.
pub const DEFAULT_THRESHOLD_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Sign sensitivity of the percent-change rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Fire on moves of either sign.
    #[default]
    Both,
    /// Fire on upward moves only.
    Gain,
    /// Fire on downward moves only.
    Drop,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Gain => "gain",
            Self::Drop => "drop",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(Self::Both),
            "gain" => Ok(Self::Gain),
            "drop" => Ok(Self::Drop),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Re-alert cadence for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    /// One alert per ticker, ever.
    Once,
    /// At most one alert per calendar day.
    #[default]
    Daily,
    /// At most one alert per ISO week.
    Weekly,
    /// At most one alert per calendar month.
    Monthly,
}

impl AlertFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for AlertFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!("unknown alert frequency '{other}'")),
        }
    }
}

impl fmt::Display for AlertFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated alert configuration for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub threshold_percent: Decimal,
    pub direction: Direction,
    pub price_below: Option<Price>,
    pub price_above: Option<Price>,
    pub alert_frequency: AlertFrequency,
}

impl WatchlistEntry {
    /// Entry with every field at its default.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            direction: Direction::default(),
            price_below: None,
            price_above: None,
            alert_frequency: AlertFrequency::default(),
        }
    }
}

/// One raw configuration row. Every field is an unvalidated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchlistRow {
    pub ticker: String,
    pub threshold: Option<String>,
    pub direction: Option<String>,
    pub price_below: Option<String>,
    pub price_above: Option<String>,
    pub alert_frequency: Option<String>,
}

impl WatchlistRow {
    /// Build a row from positional fields:
    /// `ticker, threshold, direction, price_below, price_above, alert_frequency`.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut fields = fields.into_iter().map(|f| f.trim());
        let ticker = fields.next().unwrap_or_default().to_string();
        let mut next = || {
            fields
                .next()
                .filter(|f| !f.is_empty())
                .map(str::to_string)
        };
        Self {
            ticker,
            threshold: next(),
            direction: next(),
            price_below: next(),
            price_above: next(),
            alert_frequency: next(),
        }
    }
}

/// A recoverable watchlist defect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchlistWarning {
    /// The source could not be read or parsed at all.
    Source(String),
    /// A row without a ticker was skipped.
    EmptyTicker { row: usize },
    /// A numeric field could not be parsed and fell back to its default.
    InvalidNumber {
        row: usize,
        ticker: String,
        field: &'static str,
        value: String,
    },
    /// A numeric field was not positive and fell back to its default.
    NotPositive {
        row: usize,
        ticker: String,
        field: &'static str,
        value: String,
    },
    /// An enum field was not recognized and fell back to its default.
    InvalidChoice {
        row: usize,
        ticker: String,
        field: &'static str,
        value: String,
    },
    /// A later row replaced an earlier row for the same ticker.
    DuplicateTicker { row: usize, ticker: String },
}

impl fmt::Display for WatchlistWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(reason) => write!(f, "watchlist source unusable: {reason}"),
            Self::EmptyTicker { row } => write!(f, "row {row}: empty ticker, row skipped"),
            Self::InvalidNumber {
                row,
                ticker,
                field,
                value,
            } => write!(
                f,
                "row {row} ({ticker}): {field} '{value}' is not a number, using default"
            ),
            Self::NotPositive {
                row,
                ticker,
                field,
                value,
            } => write!(
                f,
                "row {row} ({ticker}): {field} '{value}' must be positive, using default"
            ),
            Self::InvalidChoice {
                row,
                ticker,
                field,
                value,
            } => write!(
                f,
                "row {row} ({ticker}): {field} '{value}' is not recognized, using default"
            ),
            Self::DuplicateTicker { row, ticker } => {
                write!(f, "row {row}: duplicate ticker {ticker}, later row wins")
            }
        }
    }
}

/// Ticker-unique, insertion-ordered collection of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
    index: HashMap<String, usize>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. A duplicate ticker replaces the earlier values but
    /// keeps the earlier position. Returns `true` if an entry was replaced.
    pub fn insert(&mut self, entry: WatchlistEntry) -> bool {
        match self.index.get(&entry.ticker) {
            Some(&pos) => {
                self.entries[pos] = entry;
                true
            }
            None => {
                self.index.insert(entry.ticker.clone(), self.entries.len());
                self.entries.push(entry);
                false
            }
        }
    }

    pub fn get(&self, ticker: &str) -> Option<&WatchlistEntry> {
        self.index.get(ticker).map(|&pos| &self.entries[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchlistEntry> {
        self.entries.iter()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.ticker.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<WatchlistEntry> for Watchlist {
    fn from_iter<I: IntoIterator<Item = WatchlistEntry>>(iter: I) -> Self {
        let mut watchlist = Self::new();
        for entry in iter {
            watchlist.insert(entry);
        }
        watchlist
    }
}

/// Result of parsing a watchlist: the usable entries plus every defect found.
#[derive(Debug, Clone, Default)]
pub struct WatchlistParse {
    pub watchlist: Watchlist,
    pub warnings: Vec<WatchlistWarning>,
}

impl WatchlistParse {
    fn push_warning(&mut self, warning: WatchlistWarning) {
        warn!(%warning, "Watchlist defect");
        self.warnings.push(warning);
    }

    fn source_failure(reason: String) -> Self {
        let mut parse = Self::default();
        parse.push_warning(WatchlistWarning::Source(reason));
        parse
    }
}

/// Parse raw rows into a watchlist. Rows are numbered from 1.
pub fn parse_rows(rows: impl IntoIterator<Item = WatchlistRow>) -> WatchlistParse {
    let mut parse = WatchlistParse::default();

    for (idx, row) in rows.into_iter().enumerate() {
        let row_no = idx + 1;
        let ticker = row.ticker.trim().to_string();
        if ticker.is_empty() {
            parse.push_warning(WatchlistWarning::EmptyTicker { row: row_no });
            continue;
        }

        let mut entry = WatchlistEntry::new(ticker.clone());

        if let Some(raw) = row.threshold.as_deref() {
            match parse_decimal(raw) {
                Some(v) if v > Decimal::ZERO => entry.threshold_percent = v,
                Some(_) => parse.push_warning(WatchlistWarning::NotPositive {
                    row: row_no,
                    ticker: ticker.clone(),
                    field: "threshold",
                    value: raw.to_string(),
                }),
                None => parse.push_warning(WatchlistWarning::InvalidNumber {
                    row: row_no,
                    ticker: ticker.clone(),
                    field: "threshold",
                    value: raw.to_string(),
                }),
            }
        }

        if let Some(raw) = row.direction.as_deref() {
            match raw.parse::<Direction>() {
                Ok(d) => entry.direction = d,
                Err(_) => parse.push_warning(WatchlistWarning::InvalidChoice {
                    row: row_no,
                    ticker: ticker.clone(),
                    field: "direction",
                    value: raw.to_string(),
                }),
            }
        }

        entry.price_below = parse_target(&mut parse, row_no, &ticker, "price_below", &row.price_below);
        entry.price_above = parse_target(&mut parse, row_no, &ticker, "price_above", &row.price_above);

        if let Some(raw) = row.alert_frequency.as_deref() {
            match raw.parse::<AlertFrequency>() {
                Ok(f) => entry.alert_frequency = f,
                Err(_) => parse.push_warning(WatchlistWarning::InvalidChoice {
                    row: row_no,
                    ticker: ticker.clone(),
                    field: "alert_frequency",
                    value: raw.to_string(),
                }),
            }
        }

        if parse.watchlist.insert(entry) {
            parse.push_warning(WatchlistWarning::DuplicateTicker {
                row: row_no,
                ticker,
            });
        }
    }

    parse
}

/// Parse CSV text whose first line is a header row.
pub fn parse_csv(text: &str) -> WatchlistParse {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut read_errors = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                if record.iter().all(str::is_empty) {
                    continue;
                }
                rows.push(WatchlistRow::from_fields(record.iter()));
            }
            Err(e) => read_errors.push(WatchlistWarning::Source(format!("unreadable row: {e}"))),
        }
    }

    let mut parse = parse_rows(rows);
    for warning in read_errors {
        parse.push_warning(warning);
    }
    parse
}

/// Load and parse a watchlist file. A missing or unreadable file yields an
/// empty watchlist with a warning.
pub fn load(path: impl AsRef<Path>) -> WatchlistParse {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => parse_csv(&text),
        Err(e) => WatchlistParse::source_failure(format!("{}: {e}", path.display())),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_target(
    parse: &mut WatchlistParse,
    row: usize,
    ticker: &str,
    field: &'static str,
    raw: &Option<String>,
) -> Option<Price> {
    let raw = raw.as_deref()?;
    match parse_decimal(raw) {
        Some(v) if v > Decimal::ZERO => Some(Price::new(v)),
        Some(_) => {
            parse.push_warning(WatchlistWarning::NotPositive {
                row,
                ticker: ticker.to_string(),
                field,
                value: raw.to_string(),
            });
            None
        }
        None => {
            parse.push_warning(WatchlistWarning::InvalidNumber {
                row,
                ticker: ticker.to_string(),
                field,
                value: raw.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const HEADER: &str = "ticker,threshold,direction,price_below,price_above,alert_frequency\n";

    #[test]
    fn test_default_threshold_constant() {
        assert_eq!(DEFAULT_THRESHOLD_PERCENT, dec!(0.5));
    }

    #[test]
    fn test_full_row() {
        let parse = parse_csv(&format!("{HEADER}AAPL,1.5,drop,150,210.5,weekly\n"));
        assert!(parse.warnings.is_empty());

        let entry = parse.watchlist.get("AAPL").unwrap();
        assert_eq!(entry.threshold_percent, dec!(1.5));
        assert_eq!(entry.direction, Direction::Drop);
        assert_eq!(entry.price_below, Some(Price::new(dec!(150))));
        assert_eq!(entry.price_above, Some(Price::new(dec!(210.5))));
        assert_eq!(entry.alert_frequency, AlertFrequency::Weekly);
    }

    #[test]
    fn test_ticker_only_row_uses_defaults() {
        let parse = parse_csv(&format!("{HEADER}MSFT\n"));
        assert!(parse.warnings.is_empty());
        assert_eq!(parse.watchlist.get("MSFT"), Some(&WatchlistEntry::new("MSFT")));
    }

    #[test]
    fn test_blank_fields_use_defaults() {
        let parse = parse_csv(&format!("{HEADER}NVDA,,,,,\n"));
        assert!(parse.warnings.is_empty());
        let entry = parse.watchlist.get("NVDA").unwrap();
        assert_eq!(entry.threshold_percent, dec!(0.5));
        assert_eq!(entry.direction, Direction::Both);
        assert_eq!(entry.alert_frequency, AlertFrequency::Daily);
    }

    #[test]
    fn test_malformed_threshold_degrades_to_default() {
        let parse = parse_csv(&format!("{HEADER}AAPL,abc,gain\n"));
        let entry = parse.watchlist.get("AAPL").unwrap();
        assert_eq!(entry.threshold_percent, DEFAULT_THRESHOLD_PERCENT);
        assert_eq!(entry.direction, Direction::Gain);
        assert!(matches!(
            parse.warnings.as_slice(),
            [WatchlistWarning::InvalidNumber { field: "threshold", .. }]
        ));
    }

    #[test]
    fn test_non_positive_threshold_degrades_to_default() {
        let parse = parse_csv(&format!("{HEADER}AAPL,-2\n"));
        assert_eq!(
            parse.watchlist.get("AAPL").unwrap().threshold_percent,
            DEFAULT_THRESHOLD_PERCENT
        );
        assert!(matches!(
            parse.warnings.as_slice(),
            [WatchlistWarning::NotPositive { .. }]
        ));
    }

    #[test]
    fn test_invalid_enums_normalize() {
        let parse = parse_csv(&format!("{HEADER}TSLA,1,sideways,,,hourly\n"));
        let entry = parse.watchlist.get("TSLA").unwrap();
        assert_eq!(entry.direction, Direction::Both);
        assert_eq!(entry.alert_frequency, AlertFrequency::Daily);
        assert_eq!(parse.warnings.len(), 2);
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        let parse = parse_csv(&format!("{HEADER}TSLA,1,DROP,,,Monthly\n"));
        let entry = parse.watchlist.get("TSLA").unwrap();
        assert_eq!(entry.direction, Direction::Drop);
        assert_eq!(entry.alert_frequency, AlertFrequency::Monthly);
    }

    #[test]
    fn test_malformed_target_is_unset() {
        let parse = parse_csv(&format!("{HEADER}AMD,1,both,cheap,0\n"));
        let entry = parse.watchlist.get("AMD").unwrap();
        assert_eq!(entry.price_below, None);
        assert_eq!(entry.price_above, None);
        assert_eq!(parse.warnings.len(), 2);
    }

    #[test]
    fn test_empty_ticker_skipped() {
        let parse = parse_csv(&format!("{HEADER},1.0,both\nAAPL\n"));
        assert_eq!(parse.watchlist.len(), 1);
        assert_eq!(parse.warnings, vec![WatchlistWarning::EmptyTicker { row: 1 }]);
    }

    #[test]
    fn test_duplicate_ticker_last_wins_first_position_kept() {
        let parse = parse_csv(&format!("{HEADER}AAPL,1\nMSFT,2\nAAPL,3\n"));
        let tickers: Vec<_> = parse.watchlist.tickers().collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(parse.watchlist.get("AAPL").unwrap().threshold_percent, dec!(3));
        assert!(matches!(
            parse.warnings.as_slice(),
            [WatchlistWarning::DuplicateTicker { row: 3, .. }]
        ));
    }

    #[test]
    fn test_blank_lines_ignored_and_order_kept() {
        let parse = parse_csv(&format!("{HEADER}\nSPY\n\nQQQ\nIWM\n"));
        let tickers: Vec<_> = parse.watchlist.tickers().collect();
        assert_eq!(tickers, vec!["SPY", "QQQ", "IWM"]);
    }

    #[test]
    fn test_header_only_is_empty() {
        let parse = parse_csv(HEADER);
        assert!(parse.watchlist.is_empty());
        assert!(parse.warnings.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let parse = load(dir.path().join("watchlist.txt"));
        assert!(parse.watchlist.is_empty());
        assert!(matches!(
            parse.warnings.as_slice(),
            [WatchlistWarning::Source(_)]
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}AAPL,1.0,both,,,once").unwrap();

        let parse = load(file.path());
        let entry = parse.watchlist.get("AAPL").unwrap();
        assert_eq!(entry.alert_frequency, AlertFrequency::Once);
    }

    #[test]
    fn test_parse_rows_direct() {
        let rows = vec![
            WatchlistRow::from_fields(["BTC-USD", "2.5", "gain"]),
            WatchlistRow {
                ticker: "  ".to_string(),
                ..Default::default()
            },
        ];
        let parse = parse_rows(rows);
        assert_eq!(parse.watchlist.len(), 1);
        assert_eq!(
            parse.watchlist.get("BTC-USD").unwrap().threshold_percent,
            dec!(2.5)
        );
        assert_eq!(parse.warnings.len(), 1);
    }
}
