//! Price change evaluator.
//!
//! Rules, all evaluated independently:
//! - Percent change: `pc = (current - previous) / previous * 100`
//!   - `both`: `|pc| > threshold`
//!   - `gain`: `pc > threshold`
//!   - `drop`: `pc < -threshold`
//! - `price_below`: `current < price_below`
//! - `price_above`: `current > price_above`
//!
//! Comparisons are strict. A single evaluation yields at most three events,
//! in the order above. Evaluation is pure: no I/O, no clock, no logging.

use crate::error::{DetectorError, DetectorResult};
use crate::signal::AlertEvent;
use pricewatch_core::{Direction, Price, WatchlistEntry};
use rust_decimal::Decimal;

/// Percent change from `previous` to `current`.
///
/// Fails with [`DetectorError::DivisionByZero`] when `previous` is zero; the
/// caller skips the ticker for this cycle.
pub fn percent_change(previous: Price, current: Price) -> DetectorResult<Decimal> {
    current
        .pct_from(previous)
        .ok_or(DetectorError::DivisionByZero)
}

/// Whether a percent change trips the threshold rule for a direction.
fn exceeds_threshold(pc: Decimal, threshold: Decimal, direction: Direction) -> bool {
    match direction {
        Direction::Both => pc.abs() > threshold,
        Direction::Gain => pc > threshold,
        Direction::Drop => pc < -threshold,
    }
}

/// Evaluate every rule of `entry` against a previous/current price pair.
pub fn evaluate(
    entry: &WatchlistEntry,
    previous: Price,
    current: Price,
) -> DetectorResult<Vec<AlertEvent>> {
    let pc = percent_change(previous, current)?;
    let mut events = Vec::new();

    if exceeds_threshold(pc, entry.threshold_percent, entry.direction) {
        events.push(AlertEvent::percent_change(
            &entry.ticker,
            pc,
            entry.threshold_percent,
            entry.direction,
            current,
        ));
    }

    if let Some(target) = entry.price_below {
        if current < target {
            events.push(AlertEvent::price_below(&entry.ticker, target, current));
        }
    }

    if let Some(target) = entry.price_above {
        if current > target {
            events.push(AlertEvent::price_above(&entry.ticker, target, current));
        }
    }

    Ok(events)
}
