// src/domain/errors.rs
use crate::domain::models::Symbol;
use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level application error.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Trade(#[from] TradeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a trade request was rejected. Every variant is local, recoverable
/// and surfaced to the requester as text; none is fatal to the process.
#[derive(Error, Debug)]
pub enum TradeError {
    #[error(
        "Could not fetch market data for {}. Are you sure that's a real ticker? Is the market open?",
        format_symbols(.0)
    )]
    QuoteUnavailable(Vec<Symbol>),

    #[error("Market data API returned a bad price for {0}. I cannot execute this trade right now.")]
    InvalidQuote(Symbol),

    #[error("Sorry you cannot trade {symbol}. It trades in {currency}. We only trade in USD.")]
    UnsupportedCurrency { symbol: Symbol, currency: String },

    #[error(
        "You cannot trade less than 1 share or more than half the volume of this symbol. \
         The volume of this symbol is {volume}."
    )]
    InvalidQuantity { qty: Decimal, volume: Decimal },

    #[error("This trade would result in you having ${resulting:.2}. You can not be short USD.")]
    InsufficientFunds { resulting: Decimal },

    #[error("You do not have a position in {0}")]
    NoPosition(Symbol),
}

fn format_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Persistence failures. These are not user-facing trade rejections; an
/// admission that hits one aborts with the ledger untouched.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
pub type TradeResult<T> = Result<T, TradeError>;
pub type StoreResult<T> = Result<T, StoreError>;
