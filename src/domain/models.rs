// src/domain/models.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An uppercased ticker symbol. Construction normalizes case so that
/// "aapl" and "AAPL" are the same key everywhere (cache, ledger, reports).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(ticker: &str) -> Self {
        Self(ticker.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The cash pseudo-symbol. $1 always trades for $1 and is never sent
    /// to the external quote API.
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn is_usd(&self) -> bool {
        self.0 == "USD"
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir {
    Buy,
    Sell,
}

impl Dir {
    /// Sign applied to share quantities: +1 for BUY, -1 for SELL.
    pub fn mult(&self) -> Decimal {
        match self {
            Dir::Buy => Decimal::ONE,
            Dir::Sell => -Decimal::ONE,
        }
    }

    pub fn opposite(&self) -> Dir {
        match self {
            Dir::Buy => Dir::Sell,
            Dir::Sell => Dir::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dir::Buy => "BUY",
            Dir::Sell => "SELL",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A requested trade size, resolved once at the command boundary.
/// `Shares` is a share count; `Notional` is a dollar amount that the order
/// sizer converts to whole shares at the execution price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    Shares(Decimal),
    Notional(Decimal),
}

pub type Trader = String;
pub type GuildId = u64;

/// Per-guild string key/value settings, last-write-wins.
pub type Settings = HashMap<GuildId, HashMap<String, String>>;

/// A symbol's current market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Decimal,
    pub ask: Decimal,
    pub volume: Decimal,
    pub currency: String,
}

impl Quote {
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// An executed trade. Append-only fact: once created it is never mutated
/// or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    pub dir: Dir,
    /// Shares, always positive; the direction carries the sign.
    pub qty: Decimal,
    /// Execution time.
    pub time: DateTime<Utc>,
    /// Price of `symbol` at `time`, in USD.
    pub price: Decimal,
    /// The trader who did the trade.
    pub trader: Trader,
    pub guild_id: GuildId,
}

impl Trade {
    /// Signed share count: +qty for BUY, -qty for SELL.
    pub fn signed_shares(&self) -> Decimal {
        self.qty * self.dir.mult()
    }

    /// Signed cash flow: you get negative dollars when you go long and
    /// positive dollars when you sell short.
    pub fn signed_dollars(&self) -> Decimal {
        self.qty * self.price * -self.dir.mult()
    }
}
