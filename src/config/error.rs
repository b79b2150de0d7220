use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during preference storage.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Backup directory cannot be created or written to.
    #[error("Backup directory not writable: {0}")]
    BackupDirNotWritable(PathBuf),
    /// Failed to create or restore a backup file.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),
    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),
    /// Preference file contains a malformed line.
    #[error("Parse error on line {line}: {message}")]
    ParseFailed { line: usize, message: String },
    /// Key contains characters the file format cannot hold.
    #[error("Invalid preference key '{0}'")]
    InvalidKey(String),
    /// Value spans multiple lines.
    #[error("Invalid value for '{key}': values must be a single line")]
    InvalidValue { key: String },
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
