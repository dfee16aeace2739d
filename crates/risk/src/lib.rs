pub mod calculator;

pub use calculator::{
    position_size, stop_loss, take_profit, RiskCalculator, RiskConfig, MAX_OPEN_POSITIONS,
    RISK_PER_TRADE, STOP_LOSS_FACTOR, TAKE_PROFIT_FACTOR,
};
