pub mod backtest;
pub mod executor;
pub mod journal;
pub mod live;
pub mod valr;

pub use backtest::{BacktestReport, Backtester};
pub use executor::OrderExecutor;
pub use journal::JsonLinesJournal;
pub use live::{shutdown_signal, LiveLoop, TickOutcome};
pub use valr::ValrClient;
