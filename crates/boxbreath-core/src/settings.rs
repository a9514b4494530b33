//! Persisted breathing preferences.
//!
//! Duration and cycle count live under two independent keys, each holding a
//! decimal integer. Anything missing, malformed or out of range on load falls
//! back to the default. Storage failures are logged and otherwise ignored.

use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::{Database, KvStore};
use crate::timer::{
    clamp_cycles, clamp_duration, BreathingConfig, DEFAULT_CYCLES, DEFAULT_DURATION_SECS,
    MAX_CYCLES, MAX_DURATION_SECS, MIN_CYCLES, MIN_DURATION_SECS,
};

pub const STORAGE_KEY_DURATION: &str = "boxed-breathing-duration";
pub const STORAGE_KEY_CYCLES: &str = "boxed-breathing-cycles";

/// Settings store over any [`KvStore`].
pub struct BreathingSettings<S: KvStore> {
    store: S,
    config: BreathingConfig,
}

impl<S: KvStore> BreathingSettings<S> {
    /// Read stored values, keeping defaults for anything unusable.
    pub fn load(store: S) -> Self {
        let duration = read_value(
            &store,
            STORAGE_KEY_DURATION,
            MIN_DURATION_SECS..=MAX_DURATION_SECS,
        )
        .unwrap_or(DEFAULT_DURATION_SECS);
        let cycles = read_value(&store, STORAGE_KEY_CYCLES, MIN_CYCLES..=MAX_CYCLES)
            .unwrap_or(DEFAULT_CYCLES);
        Self {
            store,
            config: BreathingConfig::new(i64::from(duration), i64::from(cycles)),
        }
    }

    pub fn duration(&self) -> u32 {
        self.config.duration()
    }

    pub fn cycles(&self) -> u32 {
        self.config.cycles()
    }

    pub fn config(&self) -> BreathingConfig {
        self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Set seconds per phase, clamped to 1-60. Returns the stored value.
    pub fn update_duration(&mut self, duration: i64) -> u32 {
        let clamped = clamp_duration(duration);
        if clamped != self.config.duration() {
            self.config =
                BreathingConfig::new(i64::from(clamped), i64::from(self.config.cycles()));
            write_value(&self.store, STORAGE_KEY_DURATION, clamped);
        }
        clamped
    }

    /// Set the cycle count, clamped to 1-20. Returns the stored value.
    pub fn update_cycles(&mut self, cycles: i64) -> u32 {
        let clamped = clamp_cycles(cycles);
        if clamped != self.config.cycles() {
            self.config =
                BreathingConfig::new(i64::from(self.config.duration()), i64::from(clamped));
            write_value(&self.store, STORAGE_KEY_CYCLES, clamped);
        }
        clamped
    }

    /// Restore `duration=4, cycles=4`.
    pub fn reset(&mut self) {
        self.update_duration(i64::from(DEFAULT_DURATION_SECS));
        self.update_cycles(i64::from(DEFAULT_CYCLES));
    }
}

/// Settings backed by the database in the data directory.
///
/// # Errors
/// Returns an error if the data directory or the database cannot be opened.
pub fn open_settings() -> Result<BreathingSettings<Database>> {
    Ok(BreathingSettings::load(Database::open()?))
}

fn read_value<S: KvStore>(
    store: &S,
    key: &str,
    range: std::ops::RangeInclusive<u32>,
) -> Option<u32> {
    let raw = match store.kv_get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(key, "failed to load breathing setting: {e}");
            return None;
        }
    };
    // Whole-string integers only: "7.5" and "7abc" are rejected, not truncated.
    match raw.trim().parse::<u32>() {
        Ok(value) if range.contains(&value) => Some(value),
        _ => {
            debug!(key, raw = raw.as_str(), "ignoring stored breathing setting");
            None
        }
    }
}

fn write_value<S: KvStore>(store: &S, key: &str, value: u32) {
    if let Err(e) = store.kv_set(key, &value.to_string()) {
        warn!(key, "failed to save breathing setting: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;

    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn kv_get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Locked)
        }

        fn kv_set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    #[test]
    fn defaults_when_store_is_empty() {
        let settings = BreathingSettings::load(MemoryStore::new());
        assert_eq!(settings.config(), BreathingConfig::default());
    }

    #[test]
    fn updates_clamp_into_range() {
        let mut settings = BreathingSettings::load(MemoryStore::new());
        assert_eq!(settings.update_duration(100), 60);
        assert_eq!(settings.update_duration(0), 1);
        assert_eq!(settings.update_cycles(21), 20);
        assert_eq!(settings.update_cycles(-4), 1);
        assert_eq!(settings.config(), BreathingConfig::new(1, 1));
    }

    #[test]
    fn updates_persist_as_decimal_strings() {
        let store = MemoryStore::new();
        let mut settings = BreathingSettings::load(&store);
        settings.update_duration(7);
        settings.update_cycles(12);
        assert_eq!(store.kv_get(STORAGE_KEY_DURATION).unwrap().as_deref(), Some("7"));
        assert_eq!(store.kv_get(STORAGE_KEY_CYCLES).unwrap().as_deref(), Some("12"));

        let reloaded = BreathingSettings::load(&store);
        assert_eq!(reloaded.duration(), 7);
        assert_eq!(reloaded.cycles(), 12);
    }

    #[test]
    fn malformed_and_out_of_range_values_are_ignored() {
        let store = MemoryStore::new();
        store.kv_set(STORAGE_KEY_DURATION, "four").unwrap();
        store.kv_set(STORAGE_KEY_CYCLES, "21").unwrap();
        let settings = BreathingSettings::load(&store);
        assert_eq!(settings.duration(), DEFAULT_DURATION_SECS);
        assert_eq!(settings.cycles(), DEFAULT_CYCLES);

        store.kv_set(STORAGE_KEY_DURATION, "7.5").unwrap();
        store.kv_set(STORAGE_KEY_CYCLES, "7abc").unwrap();
        let settings = BreathingSettings::load(&store);
        assert_eq!(settings.config(), BreathingConfig::default());

        store.kv_set(STORAGE_KEY_DURATION, "0").unwrap();
        store.kv_set(STORAGE_KEY_CYCLES, " 9 ").unwrap();
        let settings = BreathingSettings::load(&store);
        assert_eq!(settings.duration(), DEFAULT_DURATION_SECS);
        assert_eq!(settings.cycles(), 9);
    }

    #[test]
    fn reset_restores_defaults() {
        let store = MemoryStore::new();
        let mut settings = BreathingSettings::load(&store);
        settings.update_duration(30);
        settings.update_cycles(2);
        settings.reset();
        assert_eq!(settings.config(), BreathingConfig::default());
        assert_eq!(store.kv_get(STORAGE_KEY_DURATION).unwrap().as_deref(), Some("4"));
        assert_eq!(store.kv_get(STORAGE_KEY_CYCLES).unwrap().as_deref(), Some("4"));
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let mut settings = BreathingSettings::load(BrokenStore);
        assert_eq!(settings.config(), BreathingConfig::default());
        assert_eq!(settings.update_duration(12), 12);
        assert_eq!(settings.duration(), 12);
    }
}
