use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{Candle, Config, ExchangeClient, SystemClock, TradingMode};
use engine::{shutdown_signal, Backtester, JsonLinesJournal, LiveLoop, ValrClient};
use paper::PaperClient;
use strategy::StrategyFileConfig;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let strategy_file = StrategyFileConfig::load(&cfg.strategy_config_path)
        .unwrap_or_else(|e| panic!("Failed to load strategy config: {e}"));
    info!(
        mode = %cfg.trading_mode,
        symbol = %strategy_file.symbol,
        policy = ?strategy_file.live.policy,
        "TrendBot starting"
    );

    // ── Exchange client (injected based on TRADING_MODE) ──────────────────────
    // Paper mode backtests the whole recording; live mode backtests whatever
    // history the exchange returns.
    let (exchange_client, recording): (Arc<dyn ExchangeClient>, Option<Vec<Candle>>) =
        match cfg.trading_mode {
            TradingMode::Live => {
                info!("Live trading mode — using ValrClient");
                let key = cfg.valr_api_key.clone().unwrap_or_default();
                let secret = cfg.valr_secret.clone().unwrap_or_default();
                let client = ValrClient::new(key, secret)
                    .unwrap_or_else(|e| panic!("Failed to build VALR client: {e}"));
                (Arc::new(client), None)
            }
            TradingMode::Paper => {
                info!(
                    path = %cfg.paper_candles_path,
                    slippage_bps = cfg.paper_slippage_bps,
                    "Paper trading mode — using PaperClient"
                );
                let client = PaperClient::load(
                    &cfg.paper_candles_path,
                    strategy_file.symbol.clone(),
                    cfg.paper_warmup_candles,
                    cfg.paper_slippage_bps,
                )
                .unwrap_or_else(|e| panic!("Failed to load paper candles: {e}"));
                let recording = client.recorded().to_vec();
                (Arc::new(client), Some(recording))
            }
        };

    // ── Backtest ──────────────────────────────────────────────────────────────
    info!("Starting backtest...");
    let history = match recording {
        Some(candles) => Ok(candles),
        None => exchange_client.candle_history(&strategy_file.symbol).await,
    };
    match history.and_then(|candles| Backtester::new(&strategy_file).run(&candles)) {
        Ok(report) => info!(
            initial_balance = report.initial_balance,
            final_balance = report.final_balance,
            trades = report.trades.len(),
            "Backtest finished"
        ),
        Err(e) => warn!(error = %e, "Backtest skipped"),
    }

    // ── Live loop ─────────────────────────────────────────────────────────────
    let journal = JsonLinesJournal::new(&cfg.journal_path);
    let (live, reports) = LiveLoop::new(
        &strategy_file,
        exchange_client,
        Box::new(journal),
        Arc::new(SystemClock),
    );

    // ── Dashboard API ─────────────────────────────────────────────────────────
    let api_state = api::AppState {
        reports,
        trading_mode: cfg.trading_mode,
        dashboard_token: cfg.dashboard_token.clone(),
    };
    let port = cfg.dashboard_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "Dashboard API stopped");
        }
    });

    info!("All subsystems started. Press Ctrl-C to stop.");
    match live.run(shutdown_signal()).await {
        Ok(report) => info!(
            trades = report.trades.len(),
            balance = report.summary.current_balance,
            journal = %cfg.journal_path,
            "TrendBot stopped"
        ),
        Err(e) => error!(error = %e, "Failed to save trade ledger"),
    }
}
