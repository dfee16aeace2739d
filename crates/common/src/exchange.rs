use async_trait::async_trait;

use crate::{Candle, Fill, Order, Result};

/// Abstraction over the exchange connection.
///
/// `ValrClient` implements this for live trading.
/// `PaperClient` implements this for simulation.
///
/// Drivers never speak the wire protocol directly; every failure surfaces as
/// an `Err` the caller checks explicitly.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Get the latest traded price for a pair.
    async fn current_price(&self, pair: &str) -> Result<f64>;

    /// Fetch the candle history for a pair, oldest first.
    async fn candle_history(&self, pair: &str) -> Result<Vec<Candle>>;

    /// Submit an order and return the fill confirmation.
    async fn submit_order(&self, order: &Order) -> Result<Fill>;
}
