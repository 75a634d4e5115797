// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use dotenv::dotenv;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::path::PathBuf;

/// Run mode. DEV never touches the external quote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Dev,
    Prod,
}

impl Mode {
    pub fn from_str(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Mode::Dev),
            "prod" => Ok(Mode::Prod),
            other => Err(AppError::Config(format!("unknown mode: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Dev => "dev",
            Mode::Prod => "prod",
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mode: Mode,

    /// Quote fetching and caching
    pub market_data: MarketDataConfig,

    /// Initial cash allocations
    pub trading: TradingConfig,

    /// Trade persistence
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// How long a cached quote stays valid
    pub cache_max_age_seconds: u64,

    /// Maximum simultaneous quote fetches during a batch lookup
    pub fetch_concurrency: usize,

    /// Timeout for a single quote API request
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// The shared fund view starts flat
    pub fund_init_usd: Decimal,

    /// Each individual trader's starting allocation
    pub trader_init_usd: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the trade and settings files
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mode = Mode::from_str(&env::var("MODE").unwrap_or_else(|_| "dev".to_string()))?;

        let market_data = MarketDataConfig {
            cache_max_age_seconds: env::var("QUOTE_CACHE_MAX_AGE_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            fetch_concurrency: env::var("QUOTE_FETCH_CONCURRENCY")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            request_timeout_seconds: env::var("QUOTE_REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        };

        let trading = TradingConfig {
            fund_init_usd: env::var("FUND_INIT_USD")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(Decimal::ZERO),
            trader_init_usd: env::var("TRADER_INIT_USD")
                .unwrap_or_else(|_| "1000000".to_string())
                .parse()
                .unwrap_or(Decimal::new(1_000_000, 0)),
        };

        let data_dir = match env::var("DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir(mode),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            to_file: env::var("LOG_TO_FILE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            file_path: env::var("LOG_FILE_PATH").ok(),
        };

        Ok(Config {
            mode,
            market_data,
            trading,
            store: StoreConfig { data_dir },
            logging,
        })
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);

        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path).map_err(|e| {
                    AppError::Config(format!("Failed to create log file: {}", e))
                })?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        builder.init();

        Ok(())
    }
}

/// Per-mode data directory so a dev session never writes into the prod book.
fn default_data_dir(mode: Mode) -> PathBuf {
    let home = env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));
    home.join(".paper-trade").join(mode.as_str())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Dev,
            market_data: MarketDataConfig {
                cache_max_age_seconds: 300,
                fetch_concurrency: 30,
                request_timeout_seconds: 10,
            },
            trading: TradingConfig {
                fund_init_usd: Decimal::ZERO,
                trader_init_usd: Decimal::new(1_000_000, 0),
            },
            store: StoreConfig {
                data_dir: default_data_dir(Mode::Dev),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                to_file: false,
                file_path: None,
            },
        }
    }
}
