// src/market_data/mod.rs
// Quote lookup service: cache-aside over a QuoteSource with bounded fan-out.

pub mod cache;
pub mod source;

use crate::domain::errors::{TradeError, TradeResult};
use crate::domain::models::{Quote, Symbol};
use cache::TimedCache;
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use source::QuoteSource;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// The fixed 1:1 quote for the cash pseudo-symbol. Resolved locally,
/// never sent to the external lookup.
fn usd_quote() -> Quote {
    Quote {
        bid: Decimal::ONE,
        ask: Decimal::ONE,
        volume: Decimal::new(9_999_999_999_999, 0),
        currency: "USD".to_string(),
    }
}

/// Result of a batch lookup. Symbols resolve independently: one bad ticker
/// does not block quotes for its siblings.
#[derive(Debug)]
pub struct QuoteBatch {
    pub quotes: HashMap<Symbol, Quote>,
    pub failed: Vec<Symbol>,
}

impl QuoteBatch {
    /// Collapse into a full mapping, or one `QuoteUnavailable` naming every
    /// symbol that did not resolve.
    pub fn require_all(self) -> TradeResult<HashMap<Symbol, Quote>> {
        if self.failed.is_empty() {
            Ok(self.quotes)
        } else {
            let mut failed = self.failed;
            failed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            Err(TradeError::QuoteUnavailable(failed))
        }
    }
}

/// Caching front to a `QuoteSource`.
///
/// The valuation path reads through the cache (`use_cache = true`); the
/// execution path bypasses it so a trade always prices off a fresh quote.
/// Either way a successful fetch refreshes the cache.
pub struct MarketData {
    source: Arc<dyn QuoteSource>,
    cache: TimedCache,
    fetch_concurrency: usize,
}

impl MarketData {
    pub fn new(source: Arc<dyn QuoteSource>, cache_max_age: Duration, fetch_concurrency: usize) -> Self {
        Self {
            source,
            cache: TimedCache::new(cache_max_age),
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    /// Look up one symbol.
    pub async fn quote(&self, symbol: &Symbol, use_cache: bool) -> TradeResult<Quote> {
        if symbol.is_usd() {
            return Ok(usd_quote());
        }

        if use_cache {
            if let Some(quote) = self.cache.get(symbol) {
                log::debug!("found {} in cache", symbol);
                return Ok(quote);
            }
        }

        let quote = self.source.fetch(symbol).await?;
        self.cache.put(symbol.clone(), quote.clone());
        Ok(quote)
    }

    /// Look up a set of symbols with per-symbol partial success. Duplicates
    /// are fetched once; at most `fetch_concurrency` lookups run at a time.
    pub async fn quotes(&self, symbols: &[Symbol], use_cache: bool) -> QuoteBatch {
        let mut seen = HashSet::new();
        let deduped: Vec<Symbol> = symbols
            .iter()
            .filter(|s| seen.insert((*s).clone()))
            .cloned()
            .collect();

        let results: Vec<(Symbol, TradeResult<Quote>)> = stream::iter(
            deduped.into_iter().map(|symbol| async move {
                let result = self.quote(&symbol, use_cache).await;
                (symbol, result)
            }),
        )
        .buffer_unordered(self.fetch_concurrency)
        .collect()
        .await;

        let mut quotes = HashMap::new();
        let mut failed = Vec::new();
        for (symbol, result) in results {
            match result {
                Ok(quote) => {
                    quotes.insert(symbol, quote);
                }
                Err(e) => {
                    log::warn!("quote lookup failed for {}: {}", symbol, e);
                    failed.push(symbol);
                }
            }
        }

        QuoteBatch { quotes, failed }
    }
}
