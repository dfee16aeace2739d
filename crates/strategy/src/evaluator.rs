use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{OrderSide, OrderType, Result, TradeDecision};
use risk::RiskCalculator;

use crate::indicators::IndicatorSnapshot;

/// RSI thresholds (`[signal]` in the strategy file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalRules {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for SignalRules {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// Turns one indicator snapshot into a decision. Holds no state between calls;
/// the balance it sizes against is whatever the driver passes in.
#[derive(Debug, Clone, Default)]
pub struct SignalEvaluator {
    rules: SignalRules,
    risk: RiskCalculator,
}

impl SignalEvaluator {
    pub fn new(rules: SignalRules, risk: RiskCalculator) -> Self {
        Self { rules, risk }
    }

    pub fn risk(&self) -> &RiskCalculator {
        &self.risk
    }

    /// Buy on an uptrend that is oversold with rising momentum, sell on the
    /// mirror image. Buy is checked first; anything else holds.
    pub fn classify(&self, s: &IndicatorSnapshot) -> Action {
        if s.ma_fast > s.ma_slow && s.rsi < self.rules.oversold && s.macd > s.signal {
            Action::Buy
        } else if s.ma_fast < s.ma_slow && s.rsi > self.rules.overbought && s.macd < s.signal {
            Action::Sell
        } else {
            Action::Hold
        }
    }

    /// Classify and, on Buy/Sell, size the entry at `entry_price`.
    ///
    /// Sizing failures (`DivisionUndefined`) are returned to the driver, which
    /// must treat the candle as Hold.
    pub fn evaluate(
        &self,
        snapshot: &IndicatorSnapshot,
        entry_price: f64,
        atr: f64,
        balance: f64,
    ) -> Result<TradeDecision> {
        let action = match self.classify(snapshot) {
            Action::Buy => OrderSide::Buy,
            Action::Sell => OrderSide::Sell,
            Action::Hold => return Ok(TradeDecision::Hold),
        };
        debug!(side = %action, rsi = snapshot.rsi, entry_price, "Signal generated");

        let plan = self.risk.plan(balance, entry_price, atr)?;
        Ok(TradeDecision::Trade {
            action,
            order_type: OrderType::Market,
            entry_price,
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Error;

    fn snapshot(ma_fast: f64, ma_slow: f64, rsi: f64, macd: f64, signal: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ma_fast,
            ma_slow,
            rsi,
            macd,
            signal,
        }
    }

    #[test]
    fn buy_requires_all_three_conditions() {
        let eval = SignalEvaluator::default();
        assert_eq!(eval.classify(&snapshot(110.0, 100.0, 25.0, 1.0, 0.5)), Action::Buy);
        assert_eq!(eval.classify(&snapshot(90.0, 100.0, 25.0, 1.0, 0.5)), Action::Hold);
        assert_eq!(eval.classify(&snapshot(110.0, 100.0, 35.0, 1.0, 0.5)), Action::Hold);
        assert_eq!(eval.classify(&snapshot(110.0, 100.0, 25.0, 0.5, 1.0)), Action::Hold);
    }

    #[test]
    fn sell_requires_all_three_conditions() {
        let eval = SignalEvaluator::default();
        assert_eq!(eval.classify(&snapshot(90.0, 100.0, 75.0, 0.5, 1.0)), Action::Sell);
        assert_eq!(eval.classify(&snapshot(110.0, 100.0, 75.0, 0.5, 1.0)), Action::Hold);
        assert_eq!(eval.classify(&snapshot(90.0, 100.0, 65.0, 0.5, 1.0)), Action::Hold);
        assert_eq!(eval.classify(&snapshot(90.0, 100.0, 75.0, 1.0, 0.5)), Action::Hold);
    }

    #[test]
    fn equal_averages_hold() {
        let eval = SignalEvaluator::default();
        assert_eq!(eval.classify(&snapshot(100.0, 100.0, 10.0, 1.0, 0.5)), Action::Hold);
        assert_eq!(eval.classify(&snapshot(100.0, 100.0, 90.0, 0.5, 1.0)), Action::Hold);
    }

    #[test]
    fn thresholds_are_strict() {
        let eval = SignalEvaluator::default();
        assert_eq!(eval.classify(&snapshot(110.0, 100.0, 30.0, 1.0, 0.5)), Action::Hold);
        assert_eq!(eval.classify(&snapshot(90.0, 100.0, 70.0, 0.5, 1.0)), Action::Hold);
    }

    #[test]
    fn buy_decision_is_sized_from_balance() {
        let eval = SignalEvaluator::default();
        let decision = eval
            .evaluate(&snapshot(110.0, 100.0, 25.0, 1.0, 0.5), 100.0, 2.0, 10_000.0)
            .unwrap();
        match decision {
            TradeDecision::Trade {
                action,
                order_type,
                entry_price,
                plan,
            } => {
                assert_eq!(action, OrderSide::Buy);
                assert_eq!(order_type, OrderType::Market);
                assert_eq!(entry_price, 100.0);
                assert_eq!(plan.stop_loss, 97.0);
                assert_eq!(plan.take_profit, 104.0);
                assert!((plan.position_size - 100.0 / 3.0).abs() < 1e-9);
            }
            TradeDecision::Hold => panic!("expected a trade"),
        }
    }

    #[test]
    fn hold_skips_sizing_even_with_zero_atr() {
        let eval = SignalEvaluator::default();
        let decision = eval
            .evaluate(&snapshot(100.0, 100.0, 50.0, 0.0, 0.0), 100.0, 0.0, 10_000.0)
            .unwrap();
        assert_eq!(decision, TradeDecision::Hold);
    }

    #[test]
    fn zero_atr_on_signal_is_division_undefined() {
        let eval = SignalEvaluator::default();
        let err = eval
            .evaluate(&snapshot(90.0, 100.0, 80.0, 0.5, 1.0), 100.0, 0.0, 10_000.0)
            .unwrap_err();
        assert!(matches!(err, Error::DivisionUndefined(_)));
    }

    #[test]
    fn custom_thresholds() {
        let eval = SignalEvaluator::new(
            SignalRules {
                oversold: 40.0,
                overbought: 60.0,
            },
            RiskCalculator::default(),
        );
        assert_eq!(eval.classify(&snapshot(110.0, 100.0, 35.0, 1.0, 0.5)), Action::Buy);
        assert_eq!(eval.classify(&snapshot(90.0, 100.0, 65.0, 0.5, 1.0)), Action::Sell);
    }
}
