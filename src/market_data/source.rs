// src/market_data/source.rs
use crate::domain::errors::{TradeError, TradeResult};
use crate::domain::models::{Quote, Symbol};
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Client, Uri};
use hyper_tls::HttpsConnector;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// A source of current quotes for a single symbol.
///
/// Implementations must validate what they return: a quote that reaches the
/// engine always has non-zero bid/ask and a currency. Failures are reported
/// per symbol so batch callers can resolve the rest of their symbols.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, symbol: &Symbol) -> TradeResult<Quote>;
}

/// Upstream quote fields before validation. Anything can be missing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuote {
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    #[serde(rename = "regularMarketPrice")]
    pub price: Option<Decimal>,
    #[serde(rename = "regularMarketVolume")]
    pub volume: Option<Decimal>,
    pub currency: Option<String>,
}

/// Reject quotes that would corrupt valuation math: null fields are never
/// defaulted and a zero bid or ask is never accepted.
pub fn validate_quote(symbol: &Symbol, raw: RawQuote) -> TradeResult<Quote> {
    // Prefer real bid/ask; fall back to the last trade price for both sides
    let bid = raw.bid.or(raw.price);
    let ask = raw.ask.or(raw.price);

    let (bid, ask, volume, currency) = match (bid, ask, raw.volume, raw.currency) {
        (Some(bid), Some(ask), Some(volume), Some(currency)) => (bid, ask, volume, currency),
        _ => return Err(TradeError::InvalidQuote(symbol.clone())),
    };

    if bid.is_zero() || ask.is_zero() {
        return Err(TradeError::InvalidQuote(symbol.clone()));
    }

    Ok(Quote {
        bid,
        ask,
        volume,
        currency,
    })
}

#[derive(Debug, Deserialize)]
struct YahooResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooResult,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    result: Vec<RawQuote>,
}

/// Quote client for the Yahoo Finance v7 quote endpoint.
pub struct YahooQuoteClient {
    client: Client<HttpsConnector<HttpConnector>>,
    timeout: Duration,
}

impl YahooQuoteClient {
    pub fn new(timeout: Duration) -> Self {
        let https = HttpsConnector::new();
        let client = Client::builder().build::<_, hyper::Body>(https);
        Self { client, timeout }
    }

    fn quote_uri(symbol: &Symbol) -> TradeResult<Uri> {
        format!(
            "https://query1.finance.yahoo.com/v7/finance/quote?symbols={}&region=US&corsDomain=finance.yahoo.com",
            symbol
        )
        .parse()
        .map_err(|_| unavailable(symbol))
    }
}

fn unavailable(symbol: &Symbol) -> TradeError {
    TradeError::QuoteUnavailable(vec![symbol.clone()])
}

#[async_trait]
impl QuoteSource for YahooQuoteClient {
    async fn fetch(&self, symbol: &Symbol) -> TradeResult<Quote> {
        let uri = Self::quote_uri(symbol)?;

        let response = tokio::time::timeout(self.timeout, self.client.get(uri))
            .await
            .map_err(|_| {
                log::warn!("quote request for {} timed out", symbol);
                unavailable(symbol)
            })?
            .map_err(|e| {
                log::warn!("quote request for {} failed: {}", symbol, e);
                unavailable(symbol)
            })?;

        if !response.status().is_success() {
            log::warn!("quote API returned {} for {}", response.status(), symbol);
            return Err(unavailable(symbol));
        }

        let body = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| {
                log::warn!("failed to read quote body for {}: {}", symbol, e);
                unavailable(symbol)
            })?;

        if body.is_empty() {
            return Err(unavailable(symbol));
        }

        let parsed: YahooResponse =
            serde_json::from_slice(&body).map_err(|_| unavailable(symbol))?;

        let raw = parsed
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| unavailable(symbol))?;

        validate_quote(symbol, raw)
    }
}

/// A source that answers every symbol with one fixed quote. Dev mode and
/// tests use this instead of hitting the market data API.
pub struct FixedQuoteSource {
    quote: Quote,
}

impl FixedQuoteSource {
    pub fn new(quote: Quote) -> Self {
        Self { quote }
    }

    /// The standing dev-mode quote: bid 99, ask 100, plenty of volume.
    pub fn dev() -> Self {
        Self::new(Quote {
            bid: Decimal::new(99, 0),
            ask: Decimal::new(100, 0),
            volume: Decimal::new(1_000_000, 0),
            currency: "USD".to_string(),
        })
    }
}

#[async_trait]
impl QuoteSource for FixedQuoteSource {
    async fn fetch(&self, _symbol: &Symbol) -> TradeResult<Quote> {
        Ok(self.quote.clone())
    }
}
