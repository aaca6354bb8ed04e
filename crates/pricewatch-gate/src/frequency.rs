//! Frequency gate implementation.
//!
//! The gate is a pure decision over the ticker's [`HistoryEntry`] and the
//! current instant. The time zone of `now` defines calendar boundaries; the
//! stored record is converted into that zone before comparing.

use chrono::{DateTime, Datelike, Duration, TimeZone};
use pricewatch_core::{AlertFrequency, HistoryEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How re-alert periods are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateSemantics {
    /// Calendar identity: a new day / ISO week / month re-opens the gate.
    #[default]
    Calendar,
    /// Elapsed time: 24 hours / 7 days / 30 days since the last alert.
    Rolling,
}

/// Outcome of a gate check, with the reason for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// No record exists for the ticker.
    FirstAlert,
    /// The stored record is unreadable; fail open.
    CorruptedRecord,
    /// `once` policy and an alert was already sent.
    OnceAlreadySent,
    /// The configured period has rolled over since the last alert.
    NewPeriod,
    /// Still inside the period of the last alert.
    SamePeriod,
}

impl GateDecision {
    /// Whether the event may be notified.
    #[must_use]
    pub fn allows(&self) -> bool {
        matches!(
            self,
            Self::FirstAlert | Self::CorruptedRecord | Self::NewPeriod
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstAlert => "first_alert",
            Self::CorruptedRecord => "corrupted_record",
            Self::OnceAlreadySent => "once_already_sent",
            Self::NewPeriod => "new_period",
            Self::SamePeriod => "same_period",
        }
    }
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert frequency gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyGate {
    semantics: GateSemantics,
}

impl FrequencyGate {
    pub fn new(semantics: GateSemantics) -> Self {
        Self { semantics }
    }

    pub fn semantics(&self) -> GateSemantics {
        self.semantics
    }

    /// Decide whether `ticker` may be notified at `now`.
    pub fn decide<Tz: TimeZone>(
        &self,
        ticker: &str,
        frequency: AlertFrequency,
        history: &HistoryEntry,
        now: &DateTime<Tz>,
    ) -> GateDecision {
        let record = match history {
            HistoryEntry::Absent => return GateDecision::FirstAlert,
            HistoryEntry::Corrupted(reason) => {
                warn!(ticker, reason = %reason, "Alert history record unreadable, allowing alert");
                return GateDecision::CorruptedRecord;
            }
            HistoryEntry::Present(record) => record,
        };

        if frequency == AlertFrequency::Once {
            return GateDecision::OnceAlreadySent;
        }

        let last = record.last_sent_at.with_timezone(&now.timezone());
        let rolled_over = match self.semantics {
            GateSemantics::Calendar => calendar_rolled_over(frequency, &last, now),
            GateSemantics::Rolling => rolling_elapsed(frequency, &last, now),
        };

        let decision = if rolled_over {
            GateDecision::NewPeriod
        } else {
            GateDecision::SamePeriod
        };
        debug!(
            ticker,
            %frequency,
            semantics = ?self.semantics,
            last_sent_at = %record.last_sent_at,
            %decision,
            "Frequency gate decision"
        );
        decision
    }

    /// Convenience wrapper: `decide(..).allows()`.
    pub fn may_notify<Tz: TimeZone>(
        &self,
        ticker: &str,
        frequency: AlertFrequency,
        history: &HistoryEntry,
        now: &DateTime<Tz>,
    ) -> bool {
        self.decide(ticker, frequency, history, now).allows()
    }
}

fn calendar_rolled_over<Tz: TimeZone>(
    frequency: AlertFrequency,
    last: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> bool {
    match frequency {
        AlertFrequency::Once => false,
        AlertFrequency::Daily => now.date_naive() > last.date_naive(),
        AlertFrequency::Weekly => now.iso_week() != last.iso_week(),
        AlertFrequency::Monthly => (now.year(), now.month()) != (last.year(), last.month()),
    }
}

fn rolling_elapsed<Tz: TimeZone>(
    frequency: AlertFrequency,
    last: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> bool {
    let window = match frequency {
        AlertFrequency::Once => return false,
        AlertFrequency::Daily => Duration::hours(24),
        AlertFrequency::Weekly => Duration::days(7),
        AlertFrequency::Monthly => Duration::days(30),
    };
    now.clone().signed_duration_since(last.clone()) >= window
}
