use serde::Serialize;
use tracing::{debug, info, warn};

use common::{validate_candles, Candle, Error, Result, StrategyState, TradeLedger, TradeRecord};
use risk::RiskCalculator;
use strategy::{IndicatorConfig, IndicatorSeries, SignalEvaluator, StrategyFileConfig};

/// Outcome of one historical replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub trades: Vec<TradeRecord>,
    pub initial_balance: f64,
    pub final_balance: f64,
}

impl BacktestReport {
    pub fn profit_loss(&self) -> f64 {
        self.final_balance - self.initial_balance
    }
}

/// Replays a candle series through the signal evaluator, one index at a time.
///
/// ATR is taken once from the final candle and used to size every entry.
/// Trades are stamped with their candle's timestamp, so the same input always
/// yields the same report.
#[derive(Debug, Clone)]
pub struct Backtester {
    indicators: IndicatorConfig,
    evaluator: SignalEvaluator,
    initial_balance: f64,
}

impl Backtester {
    pub fn new(cfg: &StrategyFileConfig) -> Self {
        Self {
            indicators: cfg.indicators.clone(),
            evaluator: SignalEvaluator::new(
                cfg.signal.clone(),
                RiskCalculator::new(cfg.risk.clone()),
            ),
            initial_balance: cfg.initial_balance,
        }
    }

    pub fn run(&self, candles: &[Candle]) -> Result<BacktestReport> {
        validate_candles(candles)?;

        let series = IndicatorSeries::compute(candles, &self.indicators);
        let mut state = StrategyState::new(self.initial_balance);
        let mut ledger = TradeLedger::new();

        let Some(atr) = series.last_atr() else {
            warn!(
                candles = candles.len(),
                period = self.indicators.atr_period,
                "ATR unavailable on the final candle; backtest produces no trades"
            );
            return Ok(self.report(&state, ledger));
        };
        info!(candles = candles.len(), atr, "Backtest started");

        for (index, candle) in candles.iter().enumerate() {
            let Some(snapshot) = series.snapshot(index) else {
                continue;
            };

            let decision = match self.evaluator.evaluate(
                &snapshot,
                candle.close,
                atr,
                state.account_balance,
            ) {
                Ok(decision) => decision,
                Err(Error::DivisionUndefined(reason)) => {
                    warn!(index, %reason, "Position size undefined; holding");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(record) = decision.into_record(candle.timestamp) else {
                continue;
            };
            state.apply_trade(&record)?;
            info!(
                index,
                side = %record.action,
                amount = record.amount,
                price = record.entry_price,
                stop_loss = record.stop_loss,
                take_profit = record.take_profit,
                balance = state.account_balance,
                "Backtest signal"
            );
            ledger.append(record);
        }

        debug!(trades = ledger.len(), "Backtest replay finished");
        let report = self.report(&state, ledger);
        info!(
            initial_balance = report.initial_balance,
            final_balance = report.final_balance,
            profit_loss = report.profit_loss(),
            trades = report.trades.len(),
            "Backtest complete"
        );
        Ok(report)
    }

    fn report(&self, state: &StrategyState, ledger: TradeLedger) -> BacktestReport {
        BacktestReport {
            trades: ledger.into_records(),
            initial_balance: state.initial_balance,
            final_balance: state.account_balance,
        }
    }
}
