// src/trading/ledger.rs
// The append-only collection of executed trades.

use crate::domain::models::{GuildId, Symbol, Trade, Trader};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// An ordered sequence of trades. The ledger is the single source of truth:
/// positions and cash are always derived by replaying it, never stored.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    trades: Vec<Trade>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_trades(trades: Vec<Trade>) -> Self {
        Self { trades }
    }

    pub fn append(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// The slice of this ledger belonging to one guild.
    pub fn for_guild(&self, guild_id: GuildId) -> Ledger {
        Ledger {
            trades: self
                .trades
                .iter()
                .filter(|t| t.guild_id == guild_id)
                .cloned()
                .collect(),
        }
    }

    /// The slice of this ledger belonging to one trader.
    pub fn for_trader(&self, trader: &str) -> Ledger {
        Ledger {
            trades: self
                .trades
                .iter()
                .filter(|t| t.trader == trader)
                .cloned()
                .collect(),
        }
    }

    /// Net shares held by `trader` in `symbol`: the signed sum of quantities
    /// across all their trades. Positive is long, negative is short; the
    /// sum is commutative, so insertion order never matters.
    pub fn position(&self, trader: &str, symbol: &Symbol) -> Decimal {
        self.trades
            .iter()
            .filter(|t| t.trader == trader && &t.symbol == symbol)
            .map(Trade::signed_shares)
            .sum()
    }

    /// A trader's cash: their initial allocation plus the signed dollar
    /// flow of every trade they did.
    pub fn cash(&self, trader: &str, initial: Decimal) -> Decimal {
        initial
            + self
                .trades
                .iter()
                .filter(|t| t.trader == trader)
                .map(Trade::signed_dollars)
                .sum::<Decimal>()
    }

    /// Every symbol in which some trader still has a non-zero position.
    /// These are the only symbols a valuation needs prices for.
    pub fn open_symbols(&self) -> Vec<Symbol> {
        let mut by_trader_symbol: HashMap<(&str, &Symbol), Decimal> = HashMap::new();
        for trade in &self.trades {
            *by_trader_symbol
                .entry((trade.trader.as_str(), &trade.symbol))
                .or_insert(Decimal::ZERO) += trade.signed_shares();
        }

        let mut symbols: Vec<Symbol> = by_trader_symbol
            .into_iter()
            .filter(|(_, shares)| !shares.is_zero())
            .map(|((_, symbol), _)| symbol.clone())
            .collect();
        symbols.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        symbols.dedup();
        symbols
    }

    /// Traders that appear in this ledger, in first-trade order.
    pub fn traders(&self) -> Vec<Trader> {
        let mut traders = Vec::new();
        for trade in &self.trades {
            if !traders.contains(&trade.trader) {
                traders.push(trade.trader.clone());
            }
        }
        traders
    }
}
