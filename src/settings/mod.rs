//! Per-channel feature toggles.
//!
//! Values are plain strings; an empty string means unset.

use async_trait::async_trait;
use parking_lot::Mutex;
use slirc_wire::irc_to_lower;
use std::collections::HashMap;
use thiserror::Error;

pub mod redb;

pub use self::redb::RedbSettings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
}

/// Storage for per-channel settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current value, or `""` when unset or unreadable.
    async fn get(&self, channel: &str, key: &str) -> String;

    /// Persist a value.
    async fn set(&self, channel: &str, key: &str, value: &str) -> Result<(), SettingsError>;
}

fn settings_key(channel: &str, key: &str) -> String {
    format!("{}\0{}", irc_to_lower(channel), key)
}

/// In-memory store, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, channel: &str, key: &str) -> String {
        self.values
            .lock()
            .get(&settings_key(channel, key))
            .cloned()
            .unwrap_or_default()
    }

    async fn set(&self, channel: &str, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values
            .lock()
            .insert(settings_key(channel, key), value.to_owned());
        Ok(())
    }
}
