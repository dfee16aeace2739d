use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use common::{
    validate_candles, Clock, Error, ExchangeClient, Order, OrderSide, RejectionReason, Result,
    StatusReport, StrategyState, TradeJournal, TradeLedger, TradeRecord,
};
use risk::RiskCalculator;
use strategy::indicators::AtrIndicator;
use strategy::{build_strategy, MarketTick, Strategy, StrategyFileConfig};

use crate::executor::OrderExecutor;

/// What one polling cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Traded(TradeRecord),
    Held,
    /// An indicator window (ATR, or the evaluator's) has not filled yet.
    IndicatorsUnavailable,
    /// Position size had no finite value; treated as Hold.
    SizingUndefined,
    CapacityReached(RejectionReason),
}

/// Polling driver: one sequential task that fetches the market, asks the
/// strategy for a decision and records it.
///
/// The loop owns all mutable state. Observers read the `StatusReport`
/// published after every tick.
pub struct LiveLoop {
    symbol: String,
    client: Arc<dyn ExchangeClient>,
    strategy: Box<dyn Strategy>,
    risk: RiskCalculator,
    atr: AtrIndicator,
    executor: OrderExecutor,
    interval: Duration,
    clock: Arc<dyn Clock>,
    state: StrategyState,
    ledger: TradeLedger,
    journal: Box<dyn TradeJournal>,
    report_tx: watch::Sender<StatusReport>,
}

impl LiveLoop {
    /// Build the loop and the receiver half of its status channel.
    pub fn new(
        cfg: &StrategyFileConfig,
        client: Arc<dyn ExchangeClient>,
        journal: Box<dyn TradeJournal>,
        clock: Arc<dyn Clock>,
    ) -> (Self, watch::Receiver<StatusReport>) {
        let state = StrategyState::new(cfg.initial_balance);
        let (report_tx, report_rx) = watch::channel(StatusReport::new(&state, Vec::new()));

        let live = LiveLoop {
            symbol: cfg.symbol.clone(),
            executor: OrderExecutor::new(client.clone(), cfg.live.place_orders),
            client,
            strategy: build_strategy(cfg),
            risk: RiskCalculator::new(cfg.risk.clone()),
            atr: cfg.indicators.atr(),
            interval: cfg.live.poll_interval(),
            clock,
            state,
            ledger: TradeLedger::new(),
            journal,
            report_tx,
        };
        (live, report_rx)
    }

    pub fn state(&self) -> &StrategyState {
        &self.state
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn report(&self) -> StatusReport {
        StatusReport::new(&self.state, self.ledger.snapshot())
    }

    /// One polling cycle. Transport errors and invalid market data are
    /// returned; nothing is recorded for a tick that fails.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let price = self.client.current_price(&self.symbol).await?;
        if !(price.is_finite() && price > 0.0) {
            return Err(Error::Exchange(format!("invalid price {price} for {}", self.symbol)));
        }
        let candles = self.client.candle_history(&self.symbol).await?;
        validate_candles(&candles)?;

        let Some(atr) = self.atr.compute(&candles) else {
            info!(candles = candles.len(), "ATR not yet available; holding");
            return Ok(TickOutcome::IndicatorsUnavailable);
        };

        let tick = MarketTick {
            candles: &candles,
            price,
            atr,
            balance: self.state.account_balance,
        };
        let decision = match self.strategy.decide(&tick) {
            Ok(decision) => decision,
            Err(Error::DataUnavailable { indicator, index }) => {
                info!(indicator, index, "Indicator not yet available; holding");
                return Ok(TickOutcome::IndicatorsUnavailable);
            }
            Err(Error::DivisionUndefined(reason)) => {
                warn!(%reason, "Position size undefined; holding");
                return Ok(TickOutcome::SizingUndefined);
            }
            Err(e) => return Err(e),
        };

        let Some(record) = decision.into_record(self.clock.now()) else {
            debug!(price, "No signal");
            return Ok(TickOutcome::Held);
        };

        if record.action == OrderSide::Buy {
            if let Err(reason) = self.risk.check_capacity(self.state.open_position_count) {
                info!(%reason, "Maximum open positions reached. Order not placed.");
                return Ok(TickOutcome::CapacityReached(reason));
            }
        }

        let mut next = self.state.clone();
        next.apply_trade(&record)?;
        next.open_position_count = match record.action {
            OrderSide::Buy => next.open_position_count + 1,
            OrderSide::Sell => next.open_position_count.saturating_sub(1),
        };

        let order = Order::market(
            &self.symbol,
            record.action,
            record.amount,
            record.stop_loss,
            record.take_profit,
        );
        self.executor.execute(&order).await?;

        self.state = next;
        self.ledger.append(record.clone());
        info!(
            side = %record.action,
            amount = record.amount,
            price = record.entry_price,
            stop_loss = record.stop_loss,
            take_profit = record.take_profit,
            balance = self.state.account_balance,
            open_positions = self.state.open_position_count,
            "Trade logged"
        );
        self.report_tx.send_replace(self.report());
        Ok(TickOutcome::Traded(record))
    }

    /// Poll until `shutdown` resolves, then flush the ledger to the journal.
    ///
    /// A failing tick is logged and the loop carries on after the normal
    /// interval. Shutdown is observed between ticks, never mid-tick.
    /// `shutdown` is polled once before every tick, so a signal listener
    /// behind it is installed before the first tick starts.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<StatusReport> {
        tokio::pin!(shutdown);
        info!(
            symbol = %self.symbol,
            strategy = %self.strategy.name(),
            interval_secs = self.interval.as_secs(),
            place_orders = self.executor.places_orders(),
            "Live loop started"
        );

        loop {
            if stop_requested(&mut shutdown).await {
                break;
            }

            match self.tick().await {
                Ok(outcome) => debug!(?outcome, "Tick complete"),
                Err(e) if e.is_transport() => warn!(error = %e, "Network error"),
                Err(e) => error!(error = %e, "Unexpected error in live loop"),
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!("Bot stopped by user.");

        let written = self.ledger.flush(self.journal.as_mut())?;
        info!(written, total = self.ledger.len(), "Trade ledger saved");
        Ok(self.report())
    }
}

/// Poll `shutdown` exactly once without waiting.
async fn stop_requested<F: Future<Output = ()> + Unpin>(shutdown: &mut F) -> bool {
    tokio::select! {
        biased;
        _ = shutdown => true,
        _ = std::future::ready(()) => false,
    }
}

/// Resolves on Ctrl-C. The signal handler is installed on first poll.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received."),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
