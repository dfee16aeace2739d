use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One OHLC price bar. Series are ordered oldest first and never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    fn is_well_formed(&self) -> bool {
        [self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Reject empty series and candles whose high, low or close is negative or
/// non-finite.
pub fn validate_candles(candles: &[Candle]) -> Result<()> {
    if candles.is_empty() {
        return Err(Error::InvalidCandles("empty candle series".into()));
    }
    if let Some(index) = candles.iter().position(|c| !c.is_well_formed()) {
        return Err(Error::InvalidCandles(format!(
            "candle {index} has a negative or non-finite price"
        )));
    }
    Ok(())
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Market,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
        }
    }
}

/// An order to be submitted to the exchange, carrying its protective levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub pair: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Order {
    pub fn market(
        pair: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pair: pair.into(),
            side,
            quantity,
            stop_loss,
            take_profit,
        }
    }
}

/// Exchange acknowledgement of a submitted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub pair: String,
    pub side: OrderSide,
    /// `None` when the exchange only acknowledges the order without a price.
    pub fill_price: Option<f64>,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
}

/// Position size and protective levels for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPlan {
    pub position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// What the strategy wants done on one candle or tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeDecision {
    Hold,
    Trade {
        action: OrderSide,
        order_type: OrderType,
        entry_price: f64,
        plan: RiskPlan,
    },
}

impl TradeDecision {
    /// Stamp an actionable decision into a ledger record. `Hold` yields `None`.
    pub fn into_record(self, timestamp: DateTime<Utc>) -> Option<TradeRecord> {
        match self {
            TradeDecision::Hold => None,
            TradeDecision::Trade {
                action,
                order_type,
                entry_price,
                plan,
            } => Some(TradeRecord {
                timestamp,
                action,
                order_type,
                amount: plan.position_size,
                entry_price,
                stop_loss: plan.stop_loss,
                take_profit: plan.take_profit,
            }),
        }
    }
}

/// One executed or simulated trade. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub action: OrderSide,
    pub order_type: OrderType,
    pub amount: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl TradeRecord {
    pub fn notional(&self) -> f64 {
        self.amount * self.entry_price
    }
}

/// Balance and position bookkeeping owned by a driver for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyState {
    pub initial_balance: f64,
    pub account_balance: f64,
    pub open_position_count: usize,
}

impl StrategyState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            account_balance: initial_balance,
            open_position_count: 0,
        }
    }

    /// Debit a buy's notional or credit a sell's. The balance may go negative
    /// but must stay finite; on error the state is left untouched.
    pub fn apply_trade(&mut self, record: &TradeRecord) -> Result<()> {
        let next = match record.action {
            OrderSide::Buy => self.account_balance - record.notional(),
            OrderSide::Sell => self.account_balance + record.notional(),
        };
        if !next.is_finite() {
            return Err(Error::Other(format!(
                "account balance would become {next} after {} of {} @ {}",
                record.action, record.amount, record.entry_price
            )));
        }
        self.account_balance = next;
        Ok(())
    }

    pub fn summary(&self) -> BalanceSummary {
        BalanceSummary {
            initial_balance: self.initial_balance,
            current_balance: self.account_balance,
            profit_loss: self.account_balance - self.initial_balance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub initial_balance: f64,
    pub current_balance: f64,
    pub profit_loss: f64,
}

/// Read-only view of a driver's progress, published for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub trades: Vec<TradeRecord>,
    pub summary: BalanceSummary,
    pub open_positions: usize,
}

impl StatusReport {
    pub fn new(state: &StrategyState, trades: Vec<TradeRecord>) -> Self {
        Self {
            trades,
            summary: state.summary(),
            open_positions: state.open_position_count,
        }
    }
}

/// Whether the bot is running against the real exchange or simulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Live,
    Paper,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Live => write!(f, "live"),
            TradingMode::Paper => write!(f, "paper"),
        }
    }
}

/// Reason an entry was refused before reaching the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    MaxOpenPositions { open: usize, max: usize },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::MaxOpenPositions { open, max } => {
                write!(f, "maximum open positions reached ({open}/{max})")
            }
        }
    }
}
