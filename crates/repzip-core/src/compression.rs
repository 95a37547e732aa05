//! Compression method selector.
//!
//! The set is closed: `stored`, `deflated`, `bzip2` and `lzma`. Each method
//! is pinned to one compression level so the same input always produces
//! the same compressed bytes for a given codec build.

use crate::ArchiveError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use zip::CompressionMethod;

/// Compression method for every file entry of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
    Bzip2,
    /// Written with the `xz` container (ZIP method 95); the ZIP library has
    /// no encoder for raw method 14.
    Lzma,
}

impl Compression {
    pub const ALL: [Compression; 4] = [
        Compression::Stored,
        Compression::Deflated,
        Compression::Bzip2,
        Compression::Lzma,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Stored => "stored",
            Compression::Deflated => "deflated",
            Compression::Bzip2 => "bzip2",
            Compression::Lzma => "lzma",
        }
    }

    /// ZIP method written to the entry headers.
    pub fn method(&self) -> CompressionMethod {
        match self {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Bzip2 => CompressionMethod::Bzip2,
            Compression::Lzma => CompressionMethod::Xz,
        }
    }

    /// Level passed to the codec.
    pub fn level(&self) -> Option<i64> {
        match self {
            Compression::Stored => None,
            Compression::Deflated => Some(6),
            Compression::Bzip2 => Some(9),
            Compression::Lzma => Some(6),
        }
    }

    /// Map a method found in an existing archive back to a selector.
    pub fn from_method(method: CompressionMethod) -> Option<Self> {
        match method {
            CompressionMethod::Stored => Some(Compression::Stored),
            CompressionMethod::Deflated => Some(Compression::Deflated),
            CompressionMethod::Bzip2 => Some(Compression::Bzip2),
            CompressionMethod::Xz | CompressionMethod::Lzma => Some(Compression::Lzma),
            _ => None,
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stored" => Ok(Compression::Stored),
            "deflated" => Ok(Compression::Deflated),
            "bzip2" => Ok(Compression::Bzip2),
            "lzma" => Ok(Compression::Lzma),
            other => Err(ArchiveError::UnsupportedCompression(other.to_string())),
        }
    }
}
