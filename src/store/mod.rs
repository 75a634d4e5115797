// src/store/mod.rs
// Trade and settings persistence behind a load/append interface.

use crate::domain::errors::StoreResult;
use crate::domain::models::{GuildId, Settings, Trade};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Durable storage for the engine's state.
///
/// Trades are append-only and reload in insertion order; settings are
/// last-write-wins per (guild, key). Appends must be durable before they
/// return so the engine can enact the trade afterwards.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn append_trade(&self, trade: &Trade) -> StoreResult<()>;
    async fn load_trades(&self) -> StoreResult<Vec<Trade>>;
    async fn set_setting(&self, guild_id: GuildId, key: &str, value: &str) -> StoreResult<()>;
    async fn load_settings(&self) -> StoreResult<Settings>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingRecord {
    guild_id: GuildId,
    key: String,
    value: String,
}

/// JSON-lines store: one file of trades, one of setting writes, both
/// append-only. Reloading replays the files top to bottom.
pub struct JsonFileStore {
    trades_path: PathBuf,
    settings_path: PathBuf,
}

impl JsonFileStore {
    pub async fn open(data_dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(data_dir).await?;
        log::info!("using data directory: {}", data_dir.display());
        Ok(Self {
            trades_path: data_dir.join("trades.jsonl"),
            settings_path: data_dir.join("settings.jsonl"),
        })
    }

    async fn append_line(path: &Path, line: String) -> StoreResult<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn read_lines(path: &Path) -> StoreResult<Vec<String>> {
        match fs::read_to_string(path).await {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TradeStore for JsonFileStore {
    async fn append_trade(&self, trade: &Trade) -> StoreResult<()> {
        Self::append_line(&self.trades_path, serde_json::to_string(trade)?).await
    }

    async fn load_trades(&self) -> StoreResult<Vec<Trade>> {
        Self::read_lines(&self.trades_path)
            .await?
            .iter()
            .map(|line| Ok(serde_json::from_str(line)?))
            .collect()
    }

    async fn set_setting(&self, guild_id: GuildId, key: &str, value: &str) -> StoreResult<()> {
        let record = SettingRecord {
            guild_id,
            key: key.to_string(),
            value: value.to_string(),
        };
        Self::append_line(&self.settings_path, serde_json::to_string(&record)?).await
    }

    async fn load_settings(&self) -> StoreResult<Settings> {
        let mut settings = Settings::new();
        for line in Self::read_lines(&self.settings_path).await? {
            let record: SettingRecord = serde_json::from_str(&line)?;
            settings
                .entry(record.guild_id)
                .or_default()
                .insert(record.key, record.value);
        }
        Ok(settings)
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    trades: std::sync::Mutex<Vec<Trade>>,
    settings: std::sync::Mutex<Vec<SettingRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn append_trade(&self, trade: &Trade) -> StoreResult<()> {
        self.trades.lock().unwrap().push(trade.clone());
        Ok(())
    }

    async fn load_trades(&self) -> StoreResult<Vec<Trade>> {
        Ok(self.trades.lock().unwrap().clone())
    }

    async fn set_setting(&self, guild_id: GuildId, key: &str, value: &str) -> StoreResult<()> {
        self.settings.lock().unwrap().push(SettingRecord {
            guild_id,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn load_settings(&self) -> StoreResult<Settings> {
        let mut settings = Settings::new();
        for record in self.settings.lock().unwrap().iter() {
            settings
                .entry(record.guild_id)
                .or_default()
                .insert(record.key.clone(), record.value.clone());
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Dir, Symbol};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn trade(symbol: &str) -> Trade {
        Trade {
            symbol: Symbol::new(symbol),
            dir: Dir::Buy,
            qty: dec!(100),
            time: Utc::now(),
            price: dec!(187.31),
            trader: "kelvin".to_string(),
            guild_id: 100,
        }
    }

    #[tokio::test]
    async fn trades_round_trip_with_all_fields_intact() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        let first = trade("ZVZZT");
        let second = Trade {
            dir: Dir::Sell,
            ..trade("AAPL")
        };
        store.append_trade(&first).await.unwrap();
        store.append_trade(&second).await.unwrap();

        let loaded = store.load_trades().await.unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[tokio::test]
    async fn loading_an_empty_store_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        assert!(store.load_trades().await.unwrap().is_empty());
        assert!(store.load_settings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn settings_reload_newest_value_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        store.set_setting(100, "channel", "general").await.unwrap();
        store.set_setting(100, "channel", "trading").await.unwrap();
        store.set_setting(100, "money_message", "false").await.unwrap();
        store.set_setting(200, "channel", "other").await.unwrap();

        let settings = store.load_settings().await.unwrap();
        assert_eq!(settings[&100]["channel"], "trading");
        assert_eq!(settings[&100]["money_message"], "false");
        assert_eq!(settings[&200]["channel"], "other");
    }

    #[tokio::test]
    async fn reopening_the_store_sees_earlier_appends() {
        let dir = tempfile::tempdir().unwrap();
        let first = trade("ZVZZT");
        {
            let store = JsonFileStore::open(dir.path()).await.unwrap();
            store.append_trade(&first).await.unwrap();
        }

        let store = JsonFileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.load_trades().await.unwrap(), vec![first]);
    }
}
