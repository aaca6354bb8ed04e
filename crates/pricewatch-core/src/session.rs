//! Trading session utilities.
//!
//! Classifies an instant in the exchange's local time zone into a trading-day
//! phase. Used for:
//! - Deciding whether a polling cycle evaluates anything at all
//! - Tagging cycle logs and metrics with the active session
//!
//! All intervals are half-open: `[start, end)`.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Trading session classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketSession {
    /// Pre-market start until the opening bell.
    PreMarket,
    /// Regular trading hours.
    Regular,
    /// Closing bell until the end of extended hours.
    PostMarket,
    /// Outside every trading window.
    Closed,
}

impl MarketSession {
    /// Whether a polling cycle should evaluate prices in this session.
    #[must_use]
    pub fn allows_polling(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreMarket => "pre-market",
            Self::Regular => "regular",
            Self::PostMarket => "post-market",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for MarketSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four fixed boundaries of a trading day, in exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBoundaries {
    pub pre_market_start: NaiveTime,
    pub market_open: NaiveTime,
    pub market_close: NaiveTime,
    pub post_market_end: NaiveTime,
}

impl SessionBoundaries {
    /// Build boundaries, requiring them to be strictly ascending.
    pub fn new(
        pre_market_start: NaiveTime,
        market_open: NaiveTime,
        market_close: NaiveTime,
        post_market_end: NaiveTime,
    ) -> Result<Self> {
        if !(pre_market_start < market_open
            && market_open < market_close
            && market_close < post_market_end)
        {
            return Err(CoreError::InvalidSession(format!(
                "expected pre_market_start < market_open < market_close < post_market_end, got {pre_market_start} / {market_open} / {market_close} / {post_market_end}"
            )));
        }
        Ok(Self {
            pre_market_start,
            market_open,
            market_close,
            post_market_end,
        })
    }

    /// Parse boundaries from `HH:MM` strings.
    pub fn parse(pre: &str, open: &str, close: &str, post: &str) -> Result<Self> {
        Self::new(
            parse_hhmm(pre)?,
            parse_hhmm(open)?,
            parse_hhmm(close)?,
            parse_hhmm(post)?,
        )
    }

    /// Classify a local wall-clock time.
    #[must_use]
    pub fn classify(&self, time: NaiveTime) -> MarketSession {
        if time >= self.pre_market_start && time < self.market_open {
            MarketSession::PreMarket
        } else if time >= self.market_open && time < self.market_close {
            MarketSession::Regular
        } else if time >= self.market_close && time < self.post_market_end {
            MarketSession::PostMarket
        } else {
            MarketSession::Closed
        }
    }
}

impl Default for SessionBoundaries {
    /// US equities: 04:00 / 09:30 / 16:00 / 20:00 exchange time.
    fn default() -> Self {
        Self {
            pre_market_start: NaiveTime::from_hms_opt(4, 0, 0).unwrap_or_default(),
            market_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            market_close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            post_market_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
        }
    }
}

fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| CoreError::InvalidSession(format!("'{value}' is not HH:MM: {e}")))
}

/// Session boundaries bound to an exchange time zone.
#[derive(Debug, Clone, Copy)]
pub struct SessionCalendar {
    boundaries: SessionBoundaries,
    timezone: Tz,
    weekends_closed: bool,
}

impl SessionCalendar {
    pub fn new(boundaries: SessionBoundaries, timezone: Tz, weekends_closed: bool) -> Self {
        Self {
            boundaries,
            timezone,
            weekends_closed,
        }
    }

    /// Parse an IANA time zone name such as `America/New_York`.
    pub fn parse_timezone(name: &str) -> Result<Tz> {
        name.trim()
            .parse::<Tz>()
            .map_err(|e| CoreError::UnknownTimeZone(format!("{name}: {e}")))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn boundaries(&self) -> &SessionBoundaries {
        &self.boundaries
    }

    /// Convert an instant into exchange-local time.
    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        self.timezone.from_utc_datetime(&instant.naive_utc())
    }

    /// Get the trading session at a given instant.
    #[must_use]
    pub fn session_at(&self, instant: DateTime<Utc>) -> MarketSession {
        let local = self.local(instant);
        if self.weekends_closed && matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return MarketSession::Closed;
        }
        self.boundaries.classify(local.time())
    }
}
