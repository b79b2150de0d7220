//! Durable preference storage with atomic writes and backup support.
//!
//! This module provides the `PreferenceStore` abstraction the gesture sync
//! core persists into, plus two implementations:
//!
//! - **`PreferenceFile`**: `key = value` file on disk. Every write goes
//!   through a `PreferenceTransaction` (timestamped backup, then atomic
//!   temp-file-then-rename). Failed writes leave the file untouched.
//! - **`MemoryPreferenceStore`**: in-memory store for tests and dry runs.
//!
//! # Example
//!
//! ```no_run
//! use touch_gesture_manager::config::{PreferenceFile, PreferenceStore};
//!
//! let mut prefs = PreferenceFile::open("/tmp/gestures.conf".into())?;
//! prefs.put("touchscreen_gesture_0", "5")?;
//! assert_eq!(prefs.get_or("touchscreen_gesture_0", "0"), "5");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

mod error;
pub mod memory;
pub mod parser;
pub mod transaction;

pub use error::ConfigError;
pub use memory::MemoryPreferenceStore;
pub use transaction::PreferenceTransaction;

/// Timestamp suffix used for backup file names
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Backups kept after each successful write
pub const DEFAULT_MAX_BACKUPS: usize = 10;

/// Durable key → string mapping.
///
/// Keys are opaque strings scoped to the caller (`touchscreen_gesture_<id>`
/// plus the global enable key). Implementations must make `put` durable
/// before returning `Ok`.
pub trait PreferenceStore {
    /// Stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Persists `value` under `key`.
    fn put(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;

    /// All stored keys.
    fn keys(&self) -> Vec<String>;

    /// Stored value for `key`, or `default` when absent.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        (**self).put(key, value)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}

/// File-backed preference store.
///
/// Reads are served from an in-memory copy loaded at `open()`. Writes
/// build the complete new file, commit it through a transaction and only
/// then update the in-memory copy, so a failed write changes nothing.
#[derive(Debug)]
pub struct PreferenceFile {
    /// Path to the preference file.
    path: PathBuf,
    backup_dir: PathBuf,
    entries: BTreeMap<String, String>,
    max_backups: usize,
}

impl PreferenceFile {
    /// Opens (or creates) the preference file at `path`.
    ///
    /// A missing file is created empty along with its parent directories,
    /// since a freshly provisioned device has no preferences yet. The
    /// backup directory is created next to the file. A symlinked file is
    /// allowed, with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::BackupDirNotWritable` if the backup directory
    /// cannot be created, or `ConfigError::ParseFailed` if an existing file
    /// is malformed.
    pub fn open(path: PathBuf) -> Result<Self, ConfigError> {
        let parent = path
            .parent()
            .ok_or_else(|| {
                ConfigError::BackupDirNotWritable(PathBuf::from(
                    "Preference file has no parent directory",
                ))
            })?
            .to_path_buf();

        if !path.exists() {
            fs::create_dir_all(&parent)?;
            fs::write(&path, "")?;
            info!(path = %path.display(), "Created empty preference file");
        }

        if path.read_link().is_ok() {
            warn!(path = %path.display(), "Preference file is a symlink");
        }

        // e.g., ~/.config/touch-gestures/gestures.conf → ~/.config/touch-gestures/backups/
        let backup_dir = parent.join("backups");

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| ConfigError::BackupDirNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(ConfigError::BackupDirNotWritable(backup_dir));
        }

        let entries = parser::parse_preferences(&fs::read_to_string(&path)?)?;
        debug!(path = %path.display(), entries = entries.len(), "Loaded preferences");

        Ok(Self {
            path,
            backup_dir,
            entries,
            max_backups: DEFAULT_MAX_BACKUPS,
        })
    }

    /// Sets how many backups survive the cleanup after each write.
    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Reads the raw preference file content.
    pub fn read_config(&self) -> Result<String, ConfigError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Re-reads the file from disk, replacing the in-memory copy.
    ///
    /// Returns the number of entries loaded.
    pub fn reload(&mut self) -> Result<usize, ConfigError> {
        self.entries = parser::parse_preferences(&self.read_config()?)?;
        Ok(self.entries.len())
    }

    fn file_name(&self) -> Result<&str, ConfigError> {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ConfigError::BackupFailed(format!(
                    "Preference path has no UTF-8 file name: {}",
                    self.path.display()
                ))
            })
    }

    /// Copies the current file to `backups/<name>.<YYYY-MM-DD_HHMMSS>`.
    pub(crate) fn create_timestamped_backup(&self) -> Result<PathBuf, ConfigError> {
        let content = fs::read_to_string(&self.path)?;
        let timestamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT);

        let backup_filename = format!("{}.{}", self.file_name()?, timestamp);
        let backup_path = self.backup_dir.join(&backup_filename);

        fs::write(&backup_path, &content)
            .map_err(|e| ConfigError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        debug!(backup = %backup_path.display(), "Created preference backup");
        Ok(backup_path)
    }

    /// Lists backups of this file, newest first.
    ///
    /// Files whose suffix is not a valid timestamp are ignored.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, ConfigError> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}.", self.file_name()?);
        let mut backups: Vec<(NaiveDateTime, PathBuf)> = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let Some(timestamp) = name.strip_prefix(&prefix) else {
                continue;
            };

            if let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp, BACKUP_TIMESTAMP_FORMAT) {
                backups.push((parsed, path));
            }
        }

        backups.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Deletes all but the `keep` most recent backups.
    ///
    /// Returns the number of backups deleted.
    pub fn cleanup_old_backups(&self, keep: usize) -> Result<usize, ConfigError> {
        let backups = self.list_backups()?;
        let mut deleted = 0;

        for old in backups.iter().skip(keep) {
            fs::remove_file(old)?;
            deleted += 1;
        }

        if deleted > 0 {
            debug!(deleted, keep, "Removed old preference backups");
        }
        Ok(deleted)
    }

    /// Restores the preference file from `backup_path`.
    ///
    /// A safety backup of the current content is taken first, so a restore
    /// can itself be undone. The in-memory copy is reloaded afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::BackupFailed` if `backup_path` does not exist,
    /// is not a file, or does not parse as a preference file. The current
    /// file is left untouched in all of those cases.
    pub fn restore_backup(&mut self, backup_path: &Path) -> Result<(), ConfigError> {
        if !backup_path.exists() {
            return Err(ConfigError::BackupFailed(format!(
                "Backup file does not exist: {}",
                backup_path.display()
            )));
        }

        if !backup_path.is_file() {
            return Err(ConfigError::BackupFailed(format!(
                "Backup path is not a file: {}",
                backup_path.display()
            )));
        }

        let content = fs::read_to_string(backup_path)?;
        let restored = parser::parse_preferences(&content).map_err(|e| {
            ConfigError::BackupFailed(format!("Backup is not a valid preference file: {}", e))
        })?;

        let tx = PreferenceTransaction::begin(self)?;
        tx.commit(&content)?;

        self.entries = restored;
        info!(backup = %backup_path.display(), "Restored preferences from backup");
        Ok(())
    }
}

impl PreferenceStore for PreferenceFile {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        parser::validate_key(key)?;
        parser::validate_value(key, value)?;

        if self.entries.get(key).map(String::as_str) == Some(value) {
            debug!(key, value, "Preference unchanged; skipping write");
            return Ok(());
        }

        let mut updated = self.entries.clone();
        updated.insert(key.to_string(), value.to_string());
        let content = parser::render_preferences(&updated);

        PreferenceTransaction::begin(self)?.commit_or_rollback(&content)?;

        self.entries = updated;
        debug!(key, value, "Preference written");

        if let Err(e) = self.cleanup_old_backups(self.max_backups) {
            warn!(error = %e, "Failed to clean up old preference backups");
        }

        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests;
