//! Error types for archive operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or writing an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by the ZIP writer or one of its codecs
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal failed
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Explicit time override that cannot be turned into an archive timestamp
    #[error("invalid time specification: {0}")]
    InvalidTimeSpec(String),

    /// Match pattern that is not a valid glob
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Entry name that cannot be stored safely
    #[error("invalid entry name '{name}': {reason}")]
    InvalidEntryName { name: String, reason: &'static str },

    /// Compression selector outside the supported set
    #[error("unsupported compression method: {0} (supported: stored, deflated, bzip2, lzma)")]
    UnsupportedCompression(String),

    /// Permission policy name outside the supported set
    #[error("unsupported permission policy: {0} (supported: fixed, executable)")]
    UnsupportedPermissionPolicy(String),

    /// Entry requested from an archive does not exist
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    /// Directory build whose patterns matched nothing
    #[error("no entries matched: {0}")]
    NothingMatched(String),

    /// Build root is missing or not a directory
    #[error("root is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
