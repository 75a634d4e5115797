// src/trading/mod.rs
// The trading engine: one admission entry point over an owned ledger.

pub mod ledger;
pub mod order;
pub mod portfolio;

use crate::config::TradingConfig;
use crate::domain::errors::{AppResult, TradeError, TradeResult};
use crate::domain::models::{Dir, GuildId, Quantity, Settings, Symbol, Trade, Trader};
use crate::market_data::MarketData;
use crate::store::TradeStore;
use chrono::Utc;
use ledger::Ledger;
use portfolio::Report;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub use order::SizingMode;

/// Key under which the fund view appears in `all_portfolios`.
pub const FUND: &str = "fund";

/// A requested trade, with the quantity already resolved at the boundary.
#[derive(Debug, Clone)]
pub struct TradeRequest {
    pub symbol: Symbol,
    pub qty: Quantity,
    pub dir: Dir,
    pub trader: Trader,
    pub guild_id: GuildId,
    pub mode: SizingMode,
}

/// Owns the ledger and serializes every mutation through `admit`.
///
/// Reads take a point-in-time snapshot and run concurrently; admission
/// holds an exclusive lock across the cash check, the durable append and
/// the in-memory append so two concurrent trades can never both pass the
/// negative-cash check against a stale balance.
pub struct TradingEngine {
    market_data: Arc<MarketData>,
    store: Arc<dyn TradeStore>,
    ledger: Mutex<Ledger>,
    settings: RwLock<Settings>,
    trading: TradingConfig,
}

impl TradingEngine {
    /// Load the persisted book and settings and stand the engine up.
    pub async fn new(
        market_data: Arc<MarketData>,
        store: Arc<dyn TradeStore>,
        trading: TradingConfig,
    ) -> AppResult<Self> {
        let trades = store.load_trades().await?;
        let settings = store.load_settings().await?;
        log::info!("loaded {} trades from the store", trades.len());

        Ok(Self {
            market_data,
            store,
            ledger: Mutex::new(Ledger::from_trades(trades)),
            settings: RwLock::new(settings),
            trading,
        })
    }

    /// Price, validate and admit a trade.
    pub async fn submit(&self, request: TradeRequest) -> AppResult<Trade> {
        // Execution prices off a fresh quote, so the cache is bypassed here
        let quote = self.market_data.quote(&request.symbol, false).await?;

        let trade = order::size_and_price(
            request.symbol,
            request.qty,
            request.dir,
            &quote,
            request.trader,
            request.guild_id,
            Utc::now(),
            request.mode,
        )?;

        self.admit(trade).await
    }

    /// Flatten the trader's position in `symbol` with a single
    /// opposite-direction trade.
    pub async fn close_position(
        &self,
        trader: Trader,
        guild_id: GuildId,
        symbol: Symbol,
    ) -> AppResult<Trade> {
        let current = {
            let ledger = self.ledger.lock().await;
            ledger.for_guild(guild_id).position(&trader, &symbol)
        };

        if current.is_zero() {
            return Err(TradeError::NoPosition(symbol).into());
        }

        let dir = if current < Decimal::ZERO { Dir::Buy } else { Dir::Sell };
        self.submit(TradeRequest {
            symbol,
            qty: Quantity::Shares(current.abs()),
            dir,
            trader,
            guild_id,
            mode: SizingMode::Strict,
        })
        .await
    }

    /// The admission critical section: check, persist, enact.
    ///
    /// Persisting happens before the in-memory append and a store failure
    /// aborts the whole admission, so a rejected or failed trade is never
    /// visible anywhere.
    async fn admit(&self, trade: Trade) -> AppResult<Trade> {
        let mut ledger = self.ledger.lock().await;

        let current = ledger
            .for_guild(trade.guild_id)
            .cash(&trade.trader, self.trading.trader_init_usd);
        let resulting = current + trade.signed_dollars();
        if resulting < Decimal::ZERO {
            return Err(TradeError::InsufficientFunds { resulting }.into());
        }

        self.store.append_trade(&trade).await?;
        ledger.append(trade.clone());

        log::info!(
            "{} {} {} @ ${} for {} (${:.2})",
            if trade.dir == Dir::Buy { "BOUGHT" } else { "SOLD" },
            trade.qty,
            trade.symbol,
            trade.price,
            trade.trader,
            trade.qty * trade.price,
        );

        Ok(trade)
    }

    /// Net shares held by a trader in a symbol, within one guild.
    pub async fn position(&self, guild_id: GuildId, trader: &str, symbol: &Symbol) -> Decimal {
        self.ledger.lock().await.for_guild(guild_id).position(trader, symbol)
    }

    /// A trader's cash within one guild.
    pub async fn cash(&self, guild_id: GuildId, trader: &str) -> Decimal {
        self.ledger
            .lock()
            .await
            .for_guild(guild_id)
            .cash(trader, self.trading.trader_init_usd)
    }

    /// All trades in one guild, in insertion order.
    pub async fn trades(&self, guild_id: GuildId) -> Vec<Trade> {
        self.ledger.lock().await.for_guild(guild_id).trades().to_vec()
    }

    /// One trader's portfolio, or `None` if they have no trades in the guild.
    pub async fn trader_portfolio(
        &self,
        guild_id: GuildId,
        trader: &str,
    ) -> AppResult<Option<Report>> {
        let slice = {
            let ledger = self.ledger.lock().await;
            ledger.for_guild(guild_id).for_trader(trader)
        };

        if slice.is_empty() {
            return Ok(None);
        }

        let prices = self.mid_prices(&slice.open_symbols()).await?;
        Ok(Some(portfolio::value(
            slice.trades(),
            &prices,
            self.trading.trader_init_usd,
        )))
    }

    /// The fund portfolio plus one portfolio per trader, all valued against
    /// the same prices. Empty when the guild has no trades.
    pub async fn all_portfolios(&self, guild_id: GuildId) -> AppResult<HashMap<String, Report>> {
        let guild = {
            let ledger = self.ledger.lock().await;
            ledger.for_guild(guild_id)
        };

        if guild.is_empty() {
            return Ok(HashMap::new());
        }

        let prices = self.mid_prices(&guild.open_symbols()).await?;

        let mut portfolios = HashMap::new();
        portfolios.insert(
            FUND.to_string(),
            portfolio::value(guild.trades(), &prices, self.trading.fund_init_usd),
        );
        for trader in guild.traders() {
            let slice = guild.for_trader(&trader);
            portfolios.insert(
                trader,
                portfolio::value(slice.trades(), &prices, self.trading.trader_init_usd),
            );
        }

        Ok(portfolios)
    }

    async fn mid_prices(&self, symbols: &[Symbol]) -> TradeResult<HashMap<Symbol, Decimal>> {
        let quotes = self.market_data.quotes(symbols, true).await.require_all()?;
        Ok(quotes.into_iter().map(|(symbol, quote)| (symbol, quote.mid())).collect())
    }

    /// Read one setting for a guild.
    pub async fn setting(&self, guild_id: GuildId, key: &str) -> Option<String> {
        self.settings
            .read()
            .await
            .get(&guild_id)
            .and_then(|guild| guild.get(key))
            .cloned()
    }

    /// All settings for a guild.
    pub async fn settings(&self, guild_id: GuildId) -> HashMap<String, String> {
        self.settings.read().await.get(&guild_id).cloned().unwrap_or_default()
    }

    /// Persist and apply a setting, last-write-wins.
    pub async fn set_setting(&self, guild_id: GuildId, key: &str, value: &str) -> AppResult<()> {
        self.store.set_setting(guild_id, key, value).await?;
        self.settings
            .write()
            .await
            .entry(guild_id)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
