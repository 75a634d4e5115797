// src/domain/mod.rs
pub mod errors;
pub mod models;

pub use errors::{AppError, AppResult, StoreError, StoreResult, TradeError, TradeResult};
pub use models::{Dir, GuildId, Quantity, Quote, Settings, Symbol, Trade, Trader};
