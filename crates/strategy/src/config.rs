use std::time::Duration;

use serde::{Deserialize, Serialize};

use common::{Error, Result};
use risk::RiskConfig;

use crate::evaluator::SignalRules;
use crate::indicators::IndicatorConfig;

/// Top-level strategy config file (TOML). Every field has a default.
///
/// Example `config/strategy.toml`:
/// ```toml
/// symbol = "BTCZAR"
/// initial_balance = 10000.0
///
/// [risk]
/// risk_fraction = 0.01
/// max_open_positions = 3
///
/// [live]
/// policy = "always_buy"
/// poll_interval_secs = 60
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyFileConfig {
    /// Human-readable name shown in logs.
    pub name: String,
    /// Trading pair, e.g. "BTCZAR".
    pub symbol: String,
    /// Starting balance for the backtest and the live loop's bookkeeping.
    pub initial_balance: f64,
    pub indicators: IndicatorConfig,
    pub signal: SignalRules,
    pub risk: RiskConfig,
    pub live: LiveConfig,
}

impl Default for StrategyFileConfig {
    fn default() -> Self {
        Self {
            name: "MA/RSI/MACD trend".to_string(),
            symbol: "BTCZAR".to_string(),
            initial_balance: 10_000.0,
            indicators: IndicatorConfig::default(),
            signal: SignalRules::default(),
            risk: RiskConfig::default(),
            live: LiveConfig::default(),
        }
    }
}

/// How the live loop turns a tick into an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LivePolicy {
    /// Buy on every tick with spare position capacity.
    #[default]
    AlwaysBuy,
    /// Run the same signal evaluator as the backtest on the latest candle.
    Evaluator,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveConfig {
    pub policy: LivePolicy,
    pub poll_interval_secs: u64,
    /// Submit orders to the exchange. When false, trades are only recorded.
    pub place_orders: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            policy: LivePolicy::AlwaysBuy,
            poll_interval_secs: 60,
            place_orders: false,
        }
    }
}

impl LiveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl StrategyFileConfig {
    /// Load and validate a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read strategy config at '{path}': {e}"))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("strategy config at '{path}': {e}")))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.indicators.validate()?;
        if !self.initial_balance.is_finite() {
            return Err(Error::Config("initial_balance must be finite".into()));
        }
        let risk = &self.risk;
        if !(risk.risk_fraction.is_finite() && risk.risk_fraction >= 0.0) {
            return Err(Error::Config("risk_fraction must be a non-negative number".into()));
        }
        if !(risk.stop_loss_factor.is_finite() && risk.take_profit_factor.is_finite()) {
            return Err(Error::Config("ATR multipliers must be finite".into()));
        }
        if self.live.poll_interval_secs == 0 {
            return Err(Error::Config("poll_interval_secs must be >= 1".into()));
        }
        Ok(())
    }
}
