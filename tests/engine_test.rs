// tests/engine_test.rs
// End-to-end engine scenarios against a file-backed store.

use paper_trade::config::TradingConfig;
use paper_trade::domain::models::{Dir, Quantity, Quote, Symbol};
use paper_trade::market_data::source::FixedQuoteSource;
use paper_trade::market_data::MarketData;
use paper_trade::store::{JsonFileStore, TradeStore};
use paper_trade::trading::{SizingMode, TradeRequest, TradingEngine, FUND};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const INIT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

fn quote(price: Decimal) -> Quote {
    Quote {
        bid: price,
        ask: price,
        volume: dec!(1000000),
        currency: "USD".to_string(),
    }
}

async fn engine_at(data_dir: &Path, current_price: Decimal) -> TradingEngine {
    let store = Arc::new(JsonFileStore::open(data_dir).await.unwrap());
    let market_data = Arc::new(MarketData::new(
        Arc::new(FixedQuoteSource::new(quote(current_price))),
        Duration::from_secs(300),
        30,
    ));
    TradingEngine::new(
        market_data,
        store,
        TradingConfig {
            fund_init_usd: Decimal::ZERO,
            trader_init_usd: INIT,
        },
    )
    .await
    .unwrap()
}

fn request(trader: &str, dir: Dir, qty: Decimal) -> TradeRequest {
    TradeRequest {
        symbol: Symbol::new("ZVZZT"),
        qty: Quantity::Shares(qty),
        dir,
        trader: trader.to_string(),
        guild_id: 100,
        mode: SizingMode::Strict,
    }
}

/// Replay a book through one engine, then value it with a second engine
/// reading the same data dir at a different current price.
async fn total_value_at(
    data_dir: &Path,
    book: &[(Dir, Decimal, Decimal)],
    current_price: Decimal,
) -> Decimal {
    for (dir, qty, trade_price) in book {
        let engine = engine_at(data_dir, *trade_price).await;
        engine.submit(request("kelvin", *dir, *qty)).await.unwrap();
    }

    let engine = engine_at(data_dir, current_price).await;
    let report = engine
        .trader_portfolio(100, "kelvin")
        .await
        .unwrap()
        .expect("kelvin should have a portfolio");
    report.value
}

#[tokio::test]
async fn single_buy_total_value_tracks_the_price() {
    let book = [(Dir::Buy, dec!(100), dec!(100))];

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(100)).await, INIT);

    // If price goes down $1, you lose $100
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(99)).await, INIT - dec!(100));

    // If price goes up $1, you make $100
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(101)).await, INIT + dec!(100));
}

#[tokio::test]
async fn averaged_buys_total_value_tracks_the_price() {
    let book = [
        (Dir::Buy, dec!(100), dec!(100)),
        (Dir::Buy, dec!(100), dec!(101)),
    ];

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(101)).await, INIT + dec!(100));

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(100)).await, INIT - dec!(100));

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(99)).await, INIT - dec!(300));

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(102)).await, INIT + dec!(300));
}

#[tokio::test]
async fn buys_and_sells_total_value_tracks_the_price() {
    let book = [
        (Dir::Buy, dec!(100), dec!(100)),
        (Dir::Sell, dec!(100), dec!(101)),
        (Dir::Buy, dec!(100), dec!(102)),
    ];

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(100)).await, INIT - dec!(100));

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(total_value_at(dir.path(), &book, dec!(101)).await, INIT);
}

#[tokio::test]
async fn admitted_trades_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let engine = engine_at(dir.path(), dec!(100)).await;
        engine.submit(request("kelvin", Dir::Buy, dec!(100))).await.unwrap();
    }

    // A fresh engine over the same store sees the same book
    let engine = engine_at(dir.path(), dec!(100)).await;
    assert_eq!(engine.position(100, "kelvin", &Symbol::new("ZVZZT")).await, dec!(100));
    assert_eq!(engine.cash(100, "kelvin").await, INIT - dec!(10000));

    let trades = engine.trades(100).await;
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].symbol, Symbol::new("ZVZZT"));
    assert_eq!(trades[0].qty, dec!(100));
    assert_eq!(trades[0].price, dec!(100));
}

#[tokio::test]
async fn rejected_trade_changes_neither_ledger_nor_store() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_at(dir.path(), dec!(100)).await;

    engine.submit(request("kelvin", Dir::Buy, dec!(9999))).await.unwrap();
    let position_before = engine.position(100, "kelvin", &Symbol::new("ZVZZT")).await;
    let cash_before = engine.cash(100, "kelvin").await;

    // Another 100 shares would cost $10,000 against $100 of cash
    let result = engine.submit(request("kelvin", Dir::Buy, dec!(100))).await;
    assert!(result.is_err());

    assert_eq!(engine.position(100, "kelvin", &Symbol::new("ZVZZT")).await, position_before);
    assert_eq!(engine.cash(100, "kelvin").await, cash_before);

    let store = JsonFileStore::open(dir.path()).await.unwrap();
    assert_eq!(store.load_trades().await.unwrap().len(), 1);
}

#[tokio::test]
async fn fund_portfolio_aggregates_traders_from_zero() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_at(dir.path(), dec!(100)).await;

    engine.submit(request("kelvin", Dir::Buy, dec!(100))).await.unwrap();
    engine.submit(request("someone", Dir::Sell, dec!(40))).await.unwrap();

    let portfolios = engine.all_portfolios(100).await.unwrap();
    let fund = &portfolios[FUND];

    assert_eq!(fund.positions.len(), 1);
    assert_eq!(fund.positions[0].shares, dec!(60));
    // kelvin spent $10,000; someone took in $4,000; 60 shares marked at $100
    assert_eq!(fund.usd, dec!(-6000));
    assert_eq!(fund.value, dec!(0));

    assert_eq!(portfolios["kelvin"].value, INIT);
    assert_eq!(portfolios["someone"].value, INIT);
}
