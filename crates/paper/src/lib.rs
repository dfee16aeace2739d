use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{validate_candles, Candle, Error, ExchangeClient, Fill, Order, OrderSide, Result};

/// Simulated exchange client for paper trading.
///
/// Replays a recorded candle series: the first history request sees the
/// warm-up window and every later one sees one more candle, until the
/// recording runs out. Fills are simulated at the latest quoted price with
/// configurable slippage. No real orders are ever sent to VALR.
pub struct PaperClient {
    pair: String,
    candles: Vec<Candle>,
    replay: Arc<RwLock<Replay>>,
    /// Slippage in basis points applied to all fills.
    slippage_bps: f64,
}

#[derive(Debug)]
struct Replay {
    /// Number of candles visible to the next history request.
    revealed: usize,
    /// Price handed out by the most recent `current_price`.
    last_quote: Option<f64>,
}

impl PaperClient {
    pub fn new(
        pair: impl Into<String>,
        candles: Vec<Candle>,
        warmup: usize,
        slippage_bps: f64,
    ) -> Result<Self> {
        validate_candles(&candles)?;
        let revealed = warmup.clamp(1, candles.len());
        let pair = pair.into();
        info!(
            pair = %pair,
            recorded = candles.len(),
            warmup = revealed,
            slippage_bps,
            "PaperClient initialized"
        );
        Ok(Self {
            pair,
            candles,
            replay: Arc::new(RwLock::new(Replay {
                revealed,
                last_quote: None,
            })),
            slippage_bps,
        })
    }

    /// Load a recording saved as a JSON array of candles.
    pub fn load(
        path: impl AsRef<Path>,
        pair: impl Into<String>,
        warmup: usize,
        slippage_bps: f64,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read candles at '{}': {e}", path.display()))
        })?;
        let candles: Vec<Candle> = serde_json::from_str(&content)?;
        Self::new(pair, candles, warmup, slippage_bps)
    }

    /// The whole recording, regardless of replay progress.
    pub fn recorded(&self) -> &[Candle] {
        &self.candles
    }

    fn check_pair(&self, pair: &str) -> Result<()> {
        if pair != self.pair {
            return Err(Error::Exchange(format!(
                "PaperClient has no recorded candles for pair '{pair}'"
            )));
        }
        Ok(())
    }

    fn slipped(&self, mid_price: f64, side: OrderSide) -> f64 {
        // Buys pay more, sells receive less
        match side {
            OrderSide::Buy => mid_price * (1.0 + self.slippage_bps / 10_000.0),
            OrderSide::Sell => mid_price * (1.0 - self.slippage_bps / 10_000.0),
        }
    }
}

#[async_trait]
impl ExchangeClient for PaperClient {
    async fn current_price(&self, pair: &str) -> Result<f64> {
        self.check_pair(pair)?;
        let mut replay = self.replay.write().await;
        let price = self.candles[replay.revealed - 1].close;
        replay.last_quote = Some(price);
        Ok(price)
    }

    async fn candle_history(&self, pair: &str) -> Result<Vec<Candle>> {
        self.check_pair(pair)?;
        let mut replay = self.replay.write().await;
        let visible = self.candles[..replay.revealed].to_vec();
        if replay.revealed < self.candles.len() {
            replay.revealed += 1;
        } else {
            debug!(pair, "Paper replay exhausted; repeating final candle");
        }
        Ok(visible)
    }

    async fn submit_order(&self, order: &Order) -> Result<Fill> {
        self.check_pair(&order.pair)?;
        let mid_price = self.replay.read().await.last_quote.ok_or_else(|| {
            Error::Exchange(format!(
                "PaperClient has no price for pair '{}'. Request a quote first.",
                order.pair
            ))
        })?;
        let fill_price = self.slipped(mid_price, order.side);

        debug!(
            pair = %order.pair,
            side = %order.side,
            mid = mid_price,
            fill = fill_price,
            qty = order.quantity,
            "Paper fill simulated"
        );

        Ok(Fill {
            order_id: order.id.clone(),
            pair: order.pair.clone(),
            side: order.side,
            fill_price: Some(fill_price),
            quantity: order.quantity,
            timestamp: Utc::now(),
        })
    }
}
