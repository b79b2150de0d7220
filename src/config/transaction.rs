// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Preference file transactions with automatic backups
//!
//! Every write to the preference file is a whole-file replacement:
//! backup first, then an atomic temp-file-then-rename.

use atomic_write_file::AtomicWriteFile;
use std::{fs, io::Write, path::{Path, PathBuf}};
use tracing::warn;

use crate::config::{ConfigError, PreferenceFile};

/// Atomic preference file transaction with automatic backup.
///
/// # Lifecycle
///
/// 1. `begin()` - Creates timestamped backup immediately
/// 2. Caller renders the complete new content (in memory)
/// 3. `commit()` - Writes atomically, or `rollback()` - Restores the backup
///
/// # Example
///
/// ```no_run
/// use touch_gesture_manager::config::{PreferenceFile, PreferenceTransaction};
/// use std::path::PathBuf;
///
/// let prefs = PreferenceFile::open(PathBuf::from("gestures.conf"))?;
/// let tx = PreferenceTransaction::begin(&prefs)?;
///
/// match tx.commit("touchscreen_gesture_0 = 2\n") {
///     Ok(()) => println!("Preferences written"),
///     Err(e) => eprintln!("Commit failed: {}", e),
/// }
/// # Ok::<(), touch_gesture_manager::config::ConfigError>(())
/// ```
pub struct PreferenceTransaction<'a> {
    file: &'a PreferenceFile,
    backup_path: Option<PathBuf>,
}

impl<'a> PreferenceTransaction<'a> {
    /// Begins a new transaction by creating a timestamped backup.
    ///
    /// The transaction cannot outlive the `PreferenceFile` it was started
    /// on (enforced by lifetime `'a`).
    ///
    /// # Errors
    ///
    /// Returns an error if the current file cannot be read or the backup
    /// cannot be written. Nothing has been modified in that case.
    pub fn begin(file: &'a PreferenceFile) -> Result<Self, ConfigError> {
        let backup_path = file.create_timestamped_backup()?;

        Ok(Self {
            file,
            backup_path: Some(backup_path),
        })
    }

    /// Path of the backup taken by `begin()`.
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Commits the transaction by atomically replacing the file content.
    ///
    /// Consumes the transaction, preventing accidental double-commits. On
    /// error the original file is unchanged and the backup is still on disk.
    pub fn commit(self, new_content: &str) -> Result<(), ConfigError> {
        write_atomically(self.file.path(), new_content)
    }

    /// Commits, and on failure restores the backup before returning the
    /// commit error.
    pub fn commit_or_rollback(self, new_content: &str) -> Result<(), ConfigError> {
        match write_atomically(self.file.path(), new_content) {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Err(rollback_err) = self.rollback() {
                    warn!(error = %rollback_err, "Rollback after failed write also failed");
                }
                Err(e)
            }
        }
    }

    /// Rolls back to the backup created during `begin()`.
    ///
    /// Borrows `self` immutably, so it may be retried.
    pub fn rollback(&self) -> Result<(), ConfigError> {
        match &self.backup_path {
            Some(backup_path) => {
                let backup_content = fs::read_to_string(backup_path)?;
                write_atomically(self.file.path(), &backup_content)
            }
            None => Err(ConfigError::BackupFailed(
                "No backup available for rollback".to_string(),
            )),
        }
    }
}

fn write_atomically(path: &Path, content: &str) -> Result<(), ConfigError> {
    let mut file = AtomicWriteFile::options()
        .open(path)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e)))?;

    file.write_all(content.as_bytes())
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

    file.commit()
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

    Ok(())
}
