use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Error, RejectionReason, Result, RiskPlan};

/// Default cap on simultaneous open positions in the live loop.
pub const MAX_OPEN_POSITIONS: usize = 3;
/// Fraction of the account balance put at risk on one trade.
pub const RISK_PER_TRADE: f64 = 0.01;
/// Stop-loss distance in ATR multiples below entry.
pub const STOP_LOSS_FACTOR: f64 = 1.5;
/// Take-profit distance in ATR multiples above entry.
pub const TAKE_PROFIT_FACTOR: f64 = 2.0;

/// User-configurable risk parameters (`[risk]` in the strategy file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Share of the balance risked per trade (e.g. 0.01 = 1%).
    pub risk_fraction: f64,
    pub stop_loss_factor: f64,
    pub take_profit_factor: f64,
    pub max_open_positions: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_fraction: RISK_PER_TRADE,
            stop_loss_factor: STOP_LOSS_FACTOR,
            take_profit_factor: TAKE_PROFIT_FACTOR,
            max_open_positions: MAX_OPEN_POSITIONS,
        }
    }
}

/// `balance * risk_fraction / (entry_price - stop_loss)`.
///
/// Fails with `DivisionUndefined` when entry equals stop, or when the
/// quotient is otherwise not a finite number.
pub fn position_size(
    balance: f64,
    risk_fraction: f64,
    entry_price: f64,
    stop_loss: f64,
) -> Result<f64> {
    let distance = entry_price - stop_loss;
    if distance == 0.0 {
        return Err(Error::DivisionUndefined(format!(
            "entry price {entry_price} equals stop-loss {stop_loss}"
        )));
    }
    let size = balance * risk_fraction / distance;
    if !size.is_finite() {
        return Err(Error::DivisionUndefined(format!(
            "position size is {size} for balance {balance}, entry {entry_price}, stop {stop_loss}"
        )));
    }
    Ok(size)
}

pub fn stop_loss(entry_price: f64, atr: f64, factor: f64) -> f64 {
    entry_price - atr * factor
}

pub fn take_profit(entry_price: f64, atr: f64, factor: f64) -> f64 {
    entry_price + atr * factor
}

/// Pure sizing of entries from a balance, an entry price and an ATR value.
#[derive(Debug, Clone, Default)]
pub struct RiskCalculator {
    config: RiskConfig,
}

impl RiskCalculator {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn plan(&self, balance: f64, entry_price: f64, atr: f64) -> Result<RiskPlan> {
        let stop = stop_loss(entry_price, atr, self.config.stop_loss_factor);
        let target = take_profit(entry_price, atr, self.config.take_profit_factor);
        let size = position_size(balance, self.config.risk_fraction, entry_price, stop)?;
        debug!(
            balance,
            entry_price,
            atr,
            position_size = size,
            stop_loss = stop,
            take_profit = target,
            "Risk plan computed"
        );
        Ok(RiskPlan {
            position_size: size,
            stop_loss: stop,
            take_profit: target,
        })
    }

    /// Refuse a new entry once `open` positions already fill the cap.
    pub fn check_capacity(&self, open: usize) -> std::result::Result<(), RejectionReason> {
        let max = self.config.max_open_positions;
        if open >= max {
            return Err(RejectionReason::MaxOpenPositions { open, max });
        }
        Ok(())
    }
}
