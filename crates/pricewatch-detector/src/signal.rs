//! Alert event types.

use pricewatch_core::{Direction, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which rule produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Relative move beyond the threshold.
    PercentChange,
    /// Current price under the lower target.
    PriceBelow,
    /// Current price over the upper target.
    PriceAbove,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PercentChange => "percent_change",
            Self::PriceBelow => "price_below",
            Self::PriceAbove => "price_above",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired rule, ready to be gated and dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub ticker: String,
    pub rule_kind: RuleKind,
    /// Human-readable notification text.
    pub message: String,
    /// Percent change between the two observations, when the percent rule fired.
    pub percent_change: Option<Decimal>,
    pub current_price: Price,
}

impl AlertEvent {
    pub fn percent_change(
        ticker: &str,
        percent_change: Decimal,
        threshold: Decimal,
        direction: Direction,
        current_price: Price,
    ) -> Self {
        let message = format!(
            "Unusual price change detected for {ticker}: {}% (Threshold: {}%, Direction: {direction})",
            signed_2dp(percent_change),
            threshold.normalize()
        );
        Self {
            ticker: ticker.to_string(),
            rule_kind: RuleKind::PercentChange,
            message,
            percent_change: Some(percent_change),
            current_price,
        }
    }

    pub fn price_below(ticker: &str, target: Price, current_price: Price) -> Self {
        let message = format!(
            "{ticker} has dropped below your target of {}. Current price: {}",
            target.fmt_2dp(),
            current_price.fmt_2dp()
        );
        Self {
            ticker: ticker.to_string(),
            rule_kind: RuleKind::PriceBelow,
            message,
            percent_change: None,
            current_price,
        }
    }

    pub fn price_above(ticker: &str, target: Price, current_price: Price) -> Self {
        let message = format!(
            "{ticker} has gone above your target of {}. Current price: {}",
            target.fmt_2dp(),
            current_price.fmt_2dp()
        );
        Self {
            ticker: ticker.to_string(),
            rule_kind: RuleKind::PriceAbove,
            message,
            percent_change: None,
            current_price,
        }
    }
}

/// Two-decimal rendering with an explicit `+` on positive values.
fn signed_2dp(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded > Decimal::ZERO {
        format!("+{rounded:.2}")
    } else {
        format!("{rounded:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signed_2dp() {
        assert_eq!(signed_2dp(dec!(1.5)), "+1.50");
        assert_eq!(signed_2dp(dec!(-2.345)), "-2.34");
        assert_eq!(signed_2dp(dec!(0.004)), "0.00");
        assert_eq!(signed_2dp(dec!(12)), "+12.00");
    }

    #[test]
    fn test_percent_change_message() {
        let event = AlertEvent::percent_change(
            "AAPL",
            dec!(-1.2345),
            dec!(1.0),
            Direction::Drop,
            Price::new(dec!(98.7655)),
        );
        assert_eq!(
            event.message,
            "Unusual price change detected for AAPL: -1.23% (Threshold: 1%, Direction: drop)"
        );
        assert_eq!(event.rule_kind, RuleKind::PercentChange);
    }

    #[test]
    fn test_target_messages() {
        let below = AlertEvent::price_below("AMD", Price::new(dec!(50)), Price::new(dec!(49.99)));
        assert_eq!(
            below.message,
            "AMD has dropped below your target of 50.00. Current price: 49.99"
        );

        let above = AlertEvent::price_above("AMD", Price::new(dec!(200.5)), Price::new(dec!(201)));
        assert_eq!(
            above.message,
            "AMD has gone above your target of 200.50. Current price: 201.00"
        );
        assert!(above.percent_change.is_none());
    }

    #[test]
    fn test_rule_kind_display() {
        assert_eq!(RuleKind::PercentChange.to_string(), "percent_change");
        assert_eq!(RuleKind::PriceBelow.to_string(), "price_below");
        assert_eq!(RuleKind::PriceAbove.to_string(), "price_above");
    }
}
