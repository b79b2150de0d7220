//! In-memory preference store
//!
//! Used by tests and by `--dry-run`, where nothing may touch the disk.

use std::collections::BTreeMap;

use crate::config::{parser, ConfigError, PreferenceStore};

/// Preference store held entirely in memory.
///
/// Applies the same key/value checks as `PreferenceFile` so behaviour does
/// not drift between the two. Counts successful writes, and can be told to
/// reject writes to simulate a full or read-only disk.
#[derive(Clone, Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: BTreeMap<String, String>,
    writes: usize,
    fail_writes: bool,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries` (not counted as writes).
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// Makes every subsequent `put` fail with `ConfigError::WriteFailed`.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        parser::validate_key(key)?;
        parser::validate_value(key, value)?;

        if self.fail_writes {
            return Err(ConfigError::WriteFailed(format!(
                "Simulated write failure for '{}'",
                key
            )));
        }

        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
