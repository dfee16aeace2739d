use tracing::info;

use common::{Candle, Error, OrderSide, OrderType, Result, TradeDecision};
use risk::RiskCalculator;

use crate::config::{LivePolicy, StrategyFileConfig};
use crate::evaluator::SignalEvaluator;
use crate::indicators::{IndicatorConfig, IndicatorSeries};
use crate::Strategy;

/// Market state handed to a live strategy on one tick.
#[derive(Debug, Clone, Copy)]
pub struct MarketTick<'a> {
    /// Candle history, oldest first, already validated.
    pub candles: &'a [Candle],
    /// Latest traded price; the entry price for anything decided now.
    pub price: f64,
    /// ATR on the final candle of `candles`.
    pub atr: f64,
    pub balance: f64,
}

/// Build the live strategy selected by `[live] policy`.
pub fn build_strategy(cfg: &StrategyFileConfig) -> Box<dyn Strategy> {
    let risk = RiskCalculator::new(cfg.risk.clone());
    let strategy: Box<dyn Strategy> = match cfg.live.policy {
        LivePolicy::AlwaysBuy => Box::new(AlwaysBuyStrategy {
            name: format!("{} [always buy]", cfg.name),
            risk,
        }),
        LivePolicy::Evaluator => Box::new(SignalStrategy {
            name: format!("{} [evaluator]", cfg.name),
            indicators: cfg.indicators.clone(),
            evaluator: SignalEvaluator::new(cfg.signal.clone(), risk),
        }),
    };
    info!(name = %strategy.name(), symbol = %cfg.symbol, "Live strategy selected");
    strategy
}

// ─── Concrete strategy types ──────────────────────────────────────────────────

/// Commits to a sized buy on every tick. Capacity is the driver's concern.
struct AlwaysBuyStrategy {
    name: String,
    risk: RiskCalculator,
}

impl Strategy for AlwaysBuyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, tick: &MarketTick<'_>) -> Result<TradeDecision> {
        let plan = self.risk.plan(tick.balance, tick.price, tick.atr)?;
        Ok(TradeDecision::Trade {
            action: OrderSide::Buy,
            order_type: OrderType::Market,
            entry_price: tick.price,
            plan,
        })
    }
}

/// Applies the backtest's signal rules to the newest candle.
struct SignalStrategy {
    name: String,
    indicators: IndicatorConfig,
    evaluator: SignalEvaluator,
}

impl Strategy for SignalStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, tick: &MarketTick<'_>) -> Result<TradeDecision> {
        let last = tick
            .candles
            .len()
            .checked_sub(1)
            .ok_or_else(|| Error::InvalidCandles("empty candle series".into()))?;
        let series = IndicatorSeries::compute(tick.candles, &self.indicators);
        let snapshot = series.snapshot_at(last)?;
        self.evaluator
            .evaluate(&snapshot, tick.price, tick.atr, tick.balance)
    }
}
