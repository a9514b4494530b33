mod config;
pub mod database;
mod memory;

pub use config::{Config, FeedbackConfig, TimerConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// String key-value storage backing the settings store.
pub trait KvStore {
    /// Get a value, `Ok(None)` when the key was never written.
    fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite a value.
    fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).kv_get(key)
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).kv_set(key, value)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `BOXBREATH_DATA_DIR` wins when set. Otherwise `~/.config/boxbreath/`, or
/// `~/.config/boxbreath-dev/` when `BOXBREATH_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("BOXBREATH_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("BOXBREATH_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("boxbreath-dev")
            } else {
                base_dir.join("boxbreath")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
