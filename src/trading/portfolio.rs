// src/trading/portfolio.rs
// Portfolio valuation engine: ledger slice + current prices -> report.

use crate::domain::models::{Symbol, Trade};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
        }
    }
}

/// One open position marked to market.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub symbol: Symbol,
    /// Net shares; positive is long, negative is short.
    pub shares: Decimal,
    pub side: PositionSide,
    /// Market value: shares x current price.
    pub value: Decimal,
    /// Average cost per share, positive for both long and short positions.
    pub avg_cost: Decimal,
    pub current_price: Decimal,
    /// Unrealized P&L: (current price - avg cost) x shares.
    pub mark_pnl: Decimal,
    /// Return %, sign-corrected so a short that fell shows positive.
    /// `None` when the average cost is zero and the return is undefined.
    pub return_pct: Option<Decimal>,
}

/// A portfolio valued as of current prices. Recomputed fresh from the
/// ledger on every request, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub positions: Vec<PositionRow>,
    /// Uninvested cash (the synthetic "USD" row).
    pub usd: Decimal,
    /// Total portfolio value (the synthetic "Portfolio" row).
    pub value: Decimal,
}

/// Value a ledger slice against current mid prices.
///
/// `usd_init` parameterizes the fund view (zero) versus an individual
/// trader's view (their starting allocation); the arithmetic is otherwise
/// identical. Symbols whose net position is exactly zero are dropped.
pub fn value(trades: &[Trade], prices: &HashMap<Symbol, Decimal>, usd_init: Decimal) -> Report {
    // Group by symbol: net shares and net signed dollar flow
    let mut by_symbol: HashMap<&Symbol, (Decimal, Decimal)> = HashMap::new();
    for trade in trades {
        let entry = by_symbol.entry(&trade.symbol).or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += trade.signed_shares();
        entry.1 += trade.signed_dollars();
    }

    let mut uninvested = usd_init;
    let mut total = usd_init;
    let mut positions = Vec::new();

    for (symbol, (shares, dollars)) in by_symbol {
        uninvested += dollars;

        if shares.is_zero() {
            // Fully closed: its dollars still count toward cash, but there
            // is no position row and no price was queried for it
            total += dollars;
            continue;
        }

        // The sign convention makes this a positive per-share cost for
        // longs and shorts alike
        let avg_cost = -dollars / shares;
        let current_price = prices.get(symbol).copied().unwrap_or(Decimal::ZERO);
        let market_value = shares * current_price;
        let mark_pnl = (current_price - avg_cost) * shares;

        let side = if shares >= Decimal::ZERO {
            PositionSide::Long
        } else {
            PositionSide::Short
        };
        let side_mult = match side {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => -Decimal::ONE,
        };

        // Guard the division: a non-zero position normally implies dollars
        // moved, but a zero average cost must not crash the report
        let return_pct = if avg_cost.is_zero() {
            None
        } else {
            Some((current_price - avg_cost) / avg_cost * side_mult * Decimal::ONE_HUNDRED)
        };

        total += dollars + market_value;

        positions.push(PositionRow {
            symbol: symbol.clone(),
            shares,
            side,
            value: market_value,
            avg_cost,
            current_price,
            mark_pnl,
            return_pct,
        });
    }

    positions.sort_by(|a, b| a.symbol.as_str().cmp(b.symbol.as_str()));

    Report {
        positions,
        usd: uninvested,
        value: total,
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in &self.positions {
            let return_pct = match row.return_pct {
                Some(pct) => format!("{:.2}%", pct),
                None => String::new(),
            };
            writeln!(
                f,
                "{:<10} {:>12} {:<5} value ${:.2}  avg cost ${:.2}  price ${:.2}  pnl ${:.2}  {}",
                row.symbol,
                row.shares,
                row.side.as_str(),
                row.value,
                row.avg_cost,
                row.current_price,
                row.mark_pnl,
                return_pct,
            )?;
        }
        writeln!(f, "{:<10} value ${:.2}", "USD", self.usd)?;
        write!(f, "{:<10} value ${:.2}", "Portfolio", self.value)
    }
}
