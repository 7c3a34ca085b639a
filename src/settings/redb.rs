//! Redb-backed settings storage.
//!
//! One table keyed by `channel\0key`, channel case-folded.

use super::{SettingsError, SettingsStore, settings_key};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

const SETTINGS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("settings");

/// File name created under `data_dir`.
pub const SETTINGS_FILE: &str = "settings.redb";

pub struct RedbSettings {
    db: Arc<Database>,
}

impl RedbSettings {
    /// Open (or create) `<data_dir>/settings.redb`, creating `data_dir` too.
    pub fn open(data_dir: &Path) -> Result<Self, SettingsError> {
        std::fs::create_dir_all(data_dir)?;
        let db = Database::create(data_dir.join(SETTINGS_FILE))
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        // Make sure the table exists so readers never see TableDoesNotExist.
        let write_txn = db
            .begin_write()
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        write_txn
            .open_table(SETTINGS_TABLE)
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        write_txn
            .commit()
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        let table = read_txn
            .open_table(SETTINGS_TABLE)
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        let value = table
            .get(key)
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        Ok(value.map(|v| v.value().to_owned()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SETTINGS_TABLE)
                .map_err(|e| SettingsError::Database(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| SettingsError::Database(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for RedbSettings {
    async fn get(&self, channel: &str, key: &str) -> String {
        match self.read(&settings_key(channel, key)) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(channel, key, error = %e, "Failed to read setting");
                String::new()
            }
        }
    }

    async fn set(&self, channel: &str, key: &str, value: &str) -> Result<(), SettingsError> {
        self.write(&settings_key(channel, key), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = RedbSettings::open(dir.path()).unwrap();
            assert_eq!(store.get("#rust", "oboobs").await, "");
            store.set("#Rust", "oboobs", "1").await.unwrap();
            assert_eq!(store.get("#rust", "oboobs").await, "1");
        }
        let store = RedbSettings::open(dir.path()).unwrap();
        assert_eq!(store.get("#RUST", "oboobs").await, "1");
    }

    #[tokio::test]
    async fn test_creates_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = RedbSettings::open(&nested).unwrap();
        store.set("#c", "obutts", "0").await.unwrap();
        assert!(nested.join(SETTINGS_FILE).exists());
    }
}
