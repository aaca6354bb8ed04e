//! Threshold back-analysis.
//!
//! Replays a historical price series and counts how many bar-to-bar moves
//! would have tripped the percent-change rule (direction `both`) at each
//! candidate threshold. Helps pick per-ticker thresholds.

use crate::detector::percent_change;
use pricewatch_core::Price;
use rust_decimal::Decimal;
use serde::Serialize;

/// Thresholds reported when none are given: 0.1, 0.5, 1, 2, 3, 4, 5 percent.
pub const DEFAULT_ANALYSIS_THRESHOLDS: [Decimal; 7] = [
    Decimal::from_parts(1, 0, 0, false, 1),
    Decimal::from_parts(5, 0, 0, false, 1),
    Decimal::ONE,
    Decimal::TWO,
    Decimal::from_parts(3, 0, 0, false, 0),
    Decimal::from_parts(4, 0, 0, false, 0),
    Decimal::from_parts(5, 0, 0, false, 0),
];

/// Number of alerts a threshold would have produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdCount {
    pub threshold: Decimal,
    pub alerts: usize,
}

/// Count consecutive-pair moves whose magnitude strictly exceeds each threshold.
///
/// Pairs whose earlier price is zero are skipped.
pub fn count_threshold_crossings(prices: &[Price], thresholds: &[Decimal]) -> Vec<ThresholdCount> {
    let moves: Vec<Decimal> = prices
        .windows(2)
        .filter_map(|w| percent_change(w[0], w[1]).ok())
        .map(|pc| pc.abs())
        .collect();

    thresholds
        .iter()
        .map(|&threshold| ThresholdCount {
            threshold,
            alerts: moves.iter().filter(|&&m| m > threshold).count(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(values: &[Decimal]) -> Vec<Price> {
        values.iter().copied().map(Price::new).collect()
    }

    #[test]
    fn test_default_thresholds() {
        assert_eq!(
            DEFAULT_ANALYSIS_THRESHOLDS,
            [dec!(0.1), dec!(0.5), dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]
        );
    }

    #[test]
    fn test_counts_per_threshold() {
        // moves: +1%, -2%, +0.2%, -0.2% (approximately)
        let prices = series(&[dec!(100), dec!(101), dec!(98.98), dec!(99.17796), dec!(98.979604)]);
        let counts = count_threshold_crossings(&prices, &[dec!(0.1), dec!(1), dec!(1.5), dec!(3)]);

        assert_eq!(counts[0].alerts, 4);
        // exactly 1% does not count
        assert_eq!(counts[1].alerts, 1);
        assert_eq!(counts[2].alerts, 1);
        assert_eq!(counts[3].alerts, 0);
    }

    #[test]
    fn test_zero_price_pairs_skipped() {
        let prices = series(&[dec!(0), dec!(10), dec!(20)]);
        let counts = count_threshold_crossings(&prices, &[dec!(50)]);
        assert_eq!(counts, vec![ThresholdCount { threshold: dec!(50), alerts: 1 }]);
    }

    #[test]
    fn test_short_series_counts_nothing() {
        let counts = count_threshold_crossings(&series(&[dec!(10)]), &DEFAULT_ANALYSIS_THRESHOLDS);
        assert_eq!(counts.len(), 7);
        assert!(counts.iter().all(|c| c.alerts == 0));
    }
}
