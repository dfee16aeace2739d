pub mod config;
pub mod evaluator;
pub mod indicators;
pub mod policy;

pub use config::{LiveConfig, LivePolicy, StrategyFileConfig};
pub use evaluator::{Action, SignalEvaluator, SignalRules};
pub use indicators::{IndicatorConfig, IndicatorSeries, IndicatorSnapshot};
pub use policy::{build_strategy, MarketTick};

use common::{Result, TradeDecision};

/// A live entry policy, selected by `[live] policy`.
pub trait Strategy: Send + Sync {
    /// Human-readable name of this strategy instance.
    fn name(&self) -> &str;

    /// Decide what to do on the newest tick.
    ///
    /// `DataUnavailable` (indicator windows not filled) and `DivisionUndefined`
    /// (entry price equals stop-loss) both mean the tick must be treated as Hold.
    fn decide(&self, tick: &MarketTick<'_>) -> Result<TradeDecision>;
}
