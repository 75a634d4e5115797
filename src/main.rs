// src/main.rs
// Line-command surface over the trading engine. Everything below the
// parsing layer lives in the library; this binary only maps text commands
// onto engine operations and prints the results.

mod config;
mod domain;
mod market_data;
mod store;
mod trading;

use crate::config::{Config, Mode};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::models::{Dir, GuildId, Quantity, Symbol, Trader};
use crate::market_data::source::{FixedQuoteSource, QuoteSource, YahooQuoteClient};
use crate::market_data::MarketData;
use crate::store::JsonFileStore;
use crate::trading::{SizingMode, TradeRequest, TradingEngine};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Symbols the LUCKY command picks from.
const LUCKY_SYMBOLS: &[&str] = &[
    "AAPL", "AMZN", "GME", "GOOG", "MSFT", "NVDA", "SPY", "TSLA", "ZVZZT",
];

/// Parse a requested quantity: plain numbers are shares, a `$` prefix
/// means dollars, commas are ignored. Rejected here, before the engine
/// ever sees the request.
fn parse_quantity(raw: &str) -> Result<Quantity, String> {
    let cleaned = raw.replace(',', "");

    if cleaned.is_empty() {
        return Err(format!("Invalid quantity \"{}\".", raw));
    }

    let (text, notional) = match cleaned.strip_prefix('$') {
        Some(rest) => (rest, true),
        None => (cleaned.as_str(), false),
    };

    let amount: Decimal = text
        .parse()
        .map_err(|_| format!("Invalid quantity \"{}\". Do you have the arguments in the correct order?", raw))?;

    Ok(if notional {
        Quantity::Notional(amount)
    } else {
        Quantity::Shares(amount)
    })
}

struct Session {
    engine: TradingEngine,
    trader: Trader,
    guild_id: GuildId,
}

impl Session {
    async fn trade(&self, symbol: &str, qty: &str, dir: Dir, mode: SizingMode) -> String {
        let qty = match parse_quantity(qty) {
            Ok(qty) => qty,
            Err(message) => return message,
        };

        let result = self
            .engine
            .submit(TradeRequest {
                symbol: Symbol::new(symbol),
                qty,
                dir,
                trader: self.trader.clone(),
                guild_id: self.guild_id,
                mode,
            })
            .await;

        match result {
            Ok(trade) => format!(
                "{} {} {} @ ${} (${:.2})",
                if trade.dir == Dir::Buy { "BOUGHT" } else { "SOLD" },
                trade.qty,
                trade.symbol,
                trade.price,
                trade.qty * trade.price,
            ),
            Err(e) => e.to_string(),
        }
    }

    async fn close(&self, symbol: &str) -> String {
        match self
            .engine
            .close_position(self.trader.clone(), self.guild_id, Symbol::new(symbol))
            .await
        {
            Ok(trade) => format!("Closed {}: {} {} @ ${}", trade.symbol, trade.dir, trade.qty, trade.price),
            Err(e) => e.to_string(),
        }
    }

    async fn lucky(&self) -> String {
        let (symbol, qty, dir) = {
            let mut rng = rand::thread_rng();
            let symbol = LUCKY_SYMBOLS.choose(&mut rng).unwrap_or(&"ZVZZT").to_string();
            let qty = rng.gen_range(1..=10_000);
            let dir = if rng.gen_bool(0.5) { Dir::Buy } else { Dir::Sell };
            (symbol, qty, dir)
        };
        self.trade(&symbol, &qty.to_string(), dir, SizingMode::Clamp).await
    }

    async fn portfolio(&self) -> String {
        match self.engine.trader_portfolio(self.guild_id, &self.trader).await {
            Ok(Some(report)) => format!("{}\n{}", self.trader, report),
            Ok(None) => "No positions -- get busy!".to_string(),
            Err(e) => e.to_string(),
        }
    }

    async fn all_portfolios(&self) -> String {
        match self.engine.all_portfolios(self.guild_id).await {
            Ok(portfolios) if portfolios.is_empty() => "No positions -- get busy!".to_string(),
            Ok(portfolios) => {
                let mut names: Vec<&String> = portfolios.keys().collect();
                names.sort();
                names
                    .iter()
                    .map(|name| format!("{}\n{}", name, portfolios[*name]))
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
            Err(e) => e.to_string(),
        }
    }

    async fn trades(&self) -> String {
        let trades = self.engine.trades(self.guild_id).await;
        if trades.is_empty() {
            return "No trades yet.".to_string();
        }
        trades
            .iter()
            .map(|t| {
                format!(
                    "{} {} {} {} @ ${} ({})",
                    t.time.format("%Y-%m-%d %H:%M:%S"),
                    t.trader,
                    t.dir,
                    t.qty,
                    t.price,
                    t.symbol,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn settings(&self) -> String {
        let settings = self.engine.settings(self.guild_id).await;
        if settings.is_empty() {
            return "No settings.".to_string();
        }
        let mut lines: Vec<String> = settings.iter().map(|(k, v)| format!("{} = {}", k, v)).collect();
        lines.sort();
        lines.join("\n")
    }

    async fn set_setting(&self, key: &str, value: &str) -> String {
        match self.engine.set_setting(self.guild_id, key, value).await {
            Ok(()) => format!("Updated settings: {} = {}", key, value),
            Err(e) => e.to_string(),
        }
    }

    async fn dispatch(&self, line: &str) -> Option<String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let response = match parts.as_slice() {
            [] => return None,
            ["BUY", symbol, qty] => self.trade(symbol, qty, Dir::Buy, SizingMode::Strict).await,
            ["SELL", symbol, qty] => self.trade(symbol, qty, Dir::Sell, SizingMode::Strict).await,
            ["CLOSE", symbol] => self.close(symbol).await,
            ["LUCKY"] => self.lucky().await,
            ["PF"] => self.portfolio().await,
            ["ALL"] => self.all_portfolios().await,
            ["TRADES"] => self.trades().await,
            ["SETTINGS"] => self.settings().await,
            ["SET", key, value] => self.set_setting(key, value).await,
            ["HELP"] => help(),
            ["QUIT"] | ["EXIT"] => return None,
            _ => format!("Unrecognized command: {}. Try HELP.", line.trim()),
        };
        Some(response)
    }
}

fn help() -> String {
    [
        "BUY <symbol> <qty>    buy shares (prefix qty with $ for dollars)",
        "SELL <symbol> <qty>   sell shares",
        "CLOSE <symbol>        flatten your position",
        "LUCKY                 random trade, clamped to valid size",
        "PF                    your portfolio",
        "ALL                   every portfolio plus the fund",
        "TRADES                list trades",
        "SET <key> <value>     set a guild setting",
        "SETTINGS              show guild settings",
        "QUIT                  exit",
    ]
    .join("\n")
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = Config::from_env()?;
    config.init_logging()?;

    log::info!("starting paper_trade v{} in {} mode", env!("CARGO_PKG_VERSION"), config.mode.as_str());

    let source: Arc<dyn QuoteSource> = match config.mode {
        Mode::Dev => Arc::new(FixedQuoteSource::dev()),
        Mode::Prod => Arc::new(YahooQuoteClient::new(Duration::from_secs(
            config.market_data.request_timeout_seconds,
        ))),
    };

    let market_data = Arc::new(MarketData::new(
        source,
        Duration::from_secs(config.market_data.cache_max_age_seconds),
        config.market_data.fetch_concurrency,
    ));

    let store = Arc::new(JsonFileStore::open(&config.store.data_dir).await.map_err(AppError::Store)?);

    let trader = std::env::args().nth(1).unwrap_or_else(|| "trader".to_string());
    let guild_id = std::env::var("GUILD_ID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);

    let session = Session {
        engine: TradingEngine::new(market_data, store, config.trading.clone()).await?,
        trader,
        guild_id,
    };

    println!("~if you ain't talkin money i ain't talkin~");
    println!("{}", help());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match session.dispatch(&line).await {
            Some(response) => println!("{}", response),
            None if line.trim().is_empty() => continue,
            None => break,
        }
    }

    log::info!("goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn plain_numbers_are_shares() {
        assert_eq!(parse_quantity("250").unwrap(), Quantity::Shares(dec!(250)));
        assert_eq!(parse_quantity("1,000").unwrap(), Quantity::Shares(dec!(1000)));
    }

    #[test]
    fn dollar_prefix_is_notional() {
        assert_eq!(parse_quantity("$5000").unwrap(), Quantity::Notional(dec!(5000)));
        assert_eq!(parse_quantity("$1,000,000").unwrap(), Quantity::Notional(dec!(1000000)));
    }

    #[test]
    fn garbage_is_rejected_at_the_boundary() {
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("$").is_err());
        assert!(parse_quantity("ZVZZT").is_err());
        assert!(parse_quantity("ten").is_err());
    }
}
