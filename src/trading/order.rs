// src/trading/order.rs
// Trade validator & order sizer: turns a requested trade into an
// executable Trade at a quoted price.

use crate::domain::errors::{TradeError, TradeResult};
use crate::domain::models::{Dir, GuildId, Quantity, Quote, Symbol, Trade, Trader};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// What to do with a quantity outside the 1..=volume/2 bounds.
///
/// `Strict` rejects the trade; `Clamp` silently moves the quantity to the
/// nearest bound (the random-trade command uses this).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMode {
    Strict,
    Clamp,
}

/// Price and validate a requested trade against a fresh quote.
///
/// The caller is responsible for fetching `quote` with the cache bypassed:
/// execution must price off a fresh-enough quote, not a valuation read.
pub fn size_and_price(
    symbol: Symbol,
    qty: Quantity,
    dir: Dir,
    quote: &Quote,
    trader: Trader,
    guild_id: GuildId,
    time: DateTime<Utc>,
    mode: SizingMode,
) -> TradeResult<Trade> {
    // We're not market-making so we just cross the spread and take
    let price = match dir {
        Dir::Buy => quote.ask,
        Dir::Sell => quote.bid,
    };

    // Convert dollars to whole shares
    let mut shares = match qty {
        Quantity::Shares(shares) => shares,
        Quantity::Notional(dollars) => (dollars / price).floor(),
    };

    if quote.currency != "USD" {
        return Err(TradeError::UnsupportedCurrency {
            symbol,
            currency: quote.currency.clone(),
        });
    }

    let max_shares = quote.volume / Decimal::TWO;
    if shares < Decimal::ONE || shares > max_shares {
        match mode {
            SizingMode::Strict => {
                return Err(TradeError::InvalidQuantity {
                    qty: shares,
                    volume: quote.volume,
                })
            }
            SizingMode::Clamp => {
                shares = if shares > max_shares {
                    max_shares.floor()
                } else {
                    Decimal::ONE
                };
            }
        }
    }

    Ok(Trade {
        symbol,
        dir,
        qty: shares,
        time,
        price,
        trader,
        guild_id,
    })
}
