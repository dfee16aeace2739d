use std::sync::Arc;

use tracing::{debug, error, info};

use common::{ExchangeClient, Fill, Order, Result};

/// Sends approved orders to the exchange when order placement is enabled.
///
/// This is the ONLY component that calls `ExchangeClient::submit_order`.
pub struct OrderExecutor {
    client: Arc<dyn ExchangeClient>,
    place_orders: bool,
}

impl OrderExecutor {
    pub fn new(client: Arc<dyn ExchangeClient>, place_orders: bool) -> Self {
        Self {
            client,
            place_orders,
        }
    }

    pub fn places_orders(&self) -> bool {
        self.place_orders
    }

    /// Submit `order`, or do nothing when placement is disabled.
    /// A submission failure is returned so the caller can abandon the trade.
    pub async fn execute(&self, order: &Order) -> Result<Option<Fill>> {
        if !self.place_orders {
            debug!(pair = %order.pair, side = %order.side, "Order placement disabled; recording only");
            return Ok(None);
        }

        info!(pair = %order.pair, side = %order.side, qty = order.quantity, "Executing order");
        match self.client.submit_order(order).await {
            Ok(fill) => {
                info!(
                    order_id = %fill.order_id,
                    pair = %fill.pair,
                    price = ?fill.fill_price,
                    qty = fill.quantity,
                    "Order accepted"
                );
                Ok(Some(fill))
            }
            Err(e) => {
                error!(pair = %order.pair, error = %e, "Order submission failed");
                Err(e)
            }
        }
    }
}
