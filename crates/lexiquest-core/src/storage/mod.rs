//! Snapshot persistence.
//!
//! Each tracker persists its state as one opaque JSON snapshot under its
//! own key. The engine treats storage as fire-and-forget: the latest save
//! before the next load wins, and a failed write leaves the in-memory
//! state usable for the rest of the session.

pub mod config;
pub mod database;

pub use config::EngineConfig;
pub use database::{AwardRecord, Database, XpStats};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

/// Key-value snapshot storage, one key per tracker.
pub trait SnapshotStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and restart simulation.
///
/// Clones share the same map, so two engine instances built over clones
/// model a process restart over the same persisted data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns `~/.config/lexiquest[-dev]/` based on LEXIQUEST_ENV.
///
/// Set LEXIQUEST_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LEXIQUEST_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("lexiquest-dev")
    } else {
        base_dir.join("lexiquest")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}
