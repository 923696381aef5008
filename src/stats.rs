//! Persisted meta statistics
//!
//! Best survival time, furthest day and run count, stored as one JSON blob
//! under a fixed key. The storage backend is a small key-value trait so the
//! browser build can use LocalStorage and native/test builds keep it in
//! memory.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence error wrapper
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable")]
    Unavailable,
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("malformed stored data: {0}")]
    Format(#[from] serde_json::Error),
}

/// Minimal string key-value store
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store (native builds, tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StoreError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }
}

/// Read a JSON value, falling back to `T::default()` on any failure
pub(crate) fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
    S: KeyValueStore + ?Sized,
{
    let parsed = store.read(key).and_then(|raw| {
        raw.map(|json| serde_json::from_str::<T>(&json))
            .transpose()
            .map_err(StoreError::from)
    });
    match parsed {
        Ok(Some(value)) => {
            log::info!("Loaded {key}");
            value
        }
        Ok(None) => {
            log::info!("No {key} found, starting fresh");
            T::default()
        }
        Err(e) => {
            log::warn!("Failed to load {key}: {e}");
            T::default()
        }
    }
}

/// Cross-run statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaStats {
    /// Longest run (ms of play time)
    pub best_time_ms: f64,
    pub max_day: u32,
    pub total_runs: u32,
}

impl MetaStats {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "snake_forest_stats";

    /// Fold a finished run into the totals.
    /// Returns true if it set a new best time or day.
    pub fn record_run(&mut self, time_ms: f64, day: u32) -> bool {
        self.total_runs += 1;
        let record = time_ms > self.best_time_ms || day > self.max_day;
        self.best_time_ms = self.best_time_ms.max(time_ms);
        self.max_day = self.max_day.max(day);
        record
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        load_or_default(store, Self::STORAGE_KEY)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.write(Self::STORAGE_KEY, &json)?;
        log::info!("Stats saved ({} runs)", self.total_runs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_run() {
        let mut stats = MetaStats::default();
        assert!(stats.record_run(90_000.0, 2));
        assert!(!stats.record_run(30_000.0, 1));
        assert!(stats.record_run(40_000.0, 3));
        assert_eq!(stats.total_runs, 3);
        assert_eq!(stats.best_time_ms, 90_000.0);
        assert_eq!(stats.max_day, 3);
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        assert_eq!(MetaStats::load(&store), MetaStats::default());

        let mut stats = MetaStats::default();
        stats.record_run(12_345.0, 4);
        stats.save(&mut store).unwrap();
        assert_eq!(MetaStats::load(&store), stats);
    }

    #[test]
    fn test_corrupt_blob_falls_back() {
        let mut store = MemoryStore::new();
        store.write(MetaStats::STORAGE_KEY, "{not json").unwrap();
        assert_eq!(MetaStats::load(&store), MetaStats::default());
    }
}
