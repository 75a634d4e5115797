// src/market_data/cache.rs
use crate::domain::models::{Quote, Symbol};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A quote cache that invalidates entries after `max_age`.
///
/// Expired entries are purged lazily on read, never proactively. Failed
/// lookups are never stored, so there is no negative caching. Concurrent
/// put races on the same symbol are last-write-wins.
pub struct TimedCache {
    max_age: Duration,
    entries: Mutex<HashMap<Symbol, (Quote, Instant)>>,
}

impl TimedCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<Quote> {
        self.get_at(symbol, Instant::now())
    }

    pub fn put(&self, symbol: Symbol, quote: Quote) {
        self.put_at(symbol, quote, Instant::now())
    }

    fn get_at(&self, symbol: &Symbol, now: Instant) -> Option<Quote> {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, (_, inserted)| now.duration_since(*inserted) < self.max_age);
        entries.get(symbol).map(|(quote, _)| quote.clone())
    }

    fn put_at(&self, symbol: Symbol, quote: Quote, now: Instant) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(symbol, (quote, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(bid: rust_decimal::Decimal) -> Quote {
        Quote {
            bid,
            ask: bid + dec!(1),
            volume: dec!(1000000),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn entry_is_returned_until_max_age() {
        let cache = TimedCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        let symbol = Symbol::new("AAPL");

        cache.put_at(symbol.clone(), quote(dec!(100)), t0);

        assert_eq!(cache.get_at(&symbol, t0), Some(quote(dec!(100))));
        assert_eq!(
            cache.get_at(&symbol, t0 + Duration::from_secs(299)),
            Some(quote(dec!(100)))
        );
        // At exactly max_age the entry has expired
        assert_eq!(cache.get_at(&symbol, t0 + Duration::from_secs(300)), None);
        assert_eq!(cache.get_at(&symbol, t0 + Duration::from_secs(301)), None);
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let cache = TimedCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        let old = Symbol::new("OLD");
        let fresh = Symbol::new("FRESH");

        cache.put_at(old.clone(), quote(dec!(1)), t0);
        cache.put_at(fresh.clone(), quote(dec!(2)), t0 + Duration::from_secs(200));

        let later = t0 + Duration::from_secs(350);
        assert_eq!(cache.get_at(&old, later), None);
        assert_eq!(cache.get_at(&fresh, later), Some(quote(dec!(2))));
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let cache = TimedCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        let symbol = Symbol::new("AAPL");

        cache.put_at(symbol.clone(), quote(dec!(100)), t0);
        cache.put_at(symbol.clone(), quote(dec!(101)), t0 + Duration::from_secs(1));

        assert_eq!(cache.get_at(&symbol, t0 + Duration::from_secs(2)), Some(quote(dec!(101))));
    }

    #[test]
    fn miss_on_unknown_symbol() {
        let cache = TimedCache::new(Duration::from_secs(300));
        assert_eq!(cache.get(&Symbol::new("NOPE")), None);
    }
}
