use crate::TradingMode;

/// All process configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Exchange credentials, required in live mode only
    pub valr_api_key: Option<String>,
    pub valr_secret: Option<String>,

    // Dashboard
    pub dashboard_token: Option<String>,
    pub dashboard_port: u16,

    // Trading
    pub trading_mode: TradingMode,
    pub paper_candles_path: String,
    pub paper_slippage_bps: f64,
    pub paper_warmup_candles: usize,

    // Trade journal file
    pub journal_path: String,

    // Strategy config file path
    pub strategy_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let trading_mode = match optional_env("TRADING_MODE")
            .unwrap_or_else(|| "paper".to_string())
            .to_lowercase()
            .as_str()
        {
            "paper" => TradingMode::Paper,
            "live" => TradingMode::Live,
            other => panic!("ERROR: TRADING_MODE must be 'paper' or 'live', got: '{other}'"),
        };

        let (valr_api_key, valr_secret) = match trading_mode {
            TradingMode::Live => (
                Some(required_env("VALR_API_KEY")),
                Some(required_env("VALR_SECRET_KEY")),
            ),
            TradingMode::Paper => (optional_env("VALR_API_KEY"), optional_env("VALR_SECRET_KEY")),
        };

        Config {
            valr_api_key,
            valr_secret,
            dashboard_token: optional_env("DASHBOARD_TOKEN").filter(|t| !t.is_empty()),
            dashboard_port: optional_env("DASHBOARD_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            trading_mode,
            paper_candles_path: optional_env("PAPER_CANDLES_PATH")
                .unwrap_or_else(|| "data/candles.json".to_string()),
            paper_slippage_bps: optional_env("PAPER_SLIPPAGE_BPS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10.0),
            paper_warmup_candles: optional_env("PAPER_WARMUP_CANDLES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            journal_path: optional_env("JOURNAL_PATH")
                .unwrap_or_else(|| "historical_actions.jsonl".to_string()),
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategy.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
