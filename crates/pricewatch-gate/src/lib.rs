//! Alert frequency gate for pricewatch.
//!
//! Decides whether a fired rule may notify now, given the ticker's alert
//! history and its configured cadence:
//! - No record: always allowed (first alert is never suppressed)
//! - Corrupted record: allowed (fail-open)
//! - `once`: one lifetime alert per ticker
//! - `daily` / `weekly` / `monthly`: one alert per period
//!
//! Periods are calendar-based by default (`GateSemantics::Calendar`);
//! rolling elapsed-time windows are available as `GateSemantics::Rolling`.

pub mod frequency;

pub use frequency::{FrequencyGate, GateDecision, GateSemantics};
