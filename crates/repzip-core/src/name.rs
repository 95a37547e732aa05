//! Canonical entry names.
//!
//! Names stored in the archive always use `/`, never start with a
//! separator, and never contain empty or `.` segments. Directory names end
//! with exactly one `/`; file names never end with one. Normalizing a
//! canonical name returns it unchanged.

use crate::{ArchiveError, Result};
use serde::Serialize;

/// Kind of archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Directory => write!(f, "directory"),
            EntryKind::File => write!(f, "file"),
        }
    }
}

/// A normalized, archive-internal entry name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryName(String);

impl EntryName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }
}

impl std::fmt::Display for EntryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize `path` into the canonical name for an entry of `kind`.
pub fn normalize(path: &str, kind: EntryKind) -> Result<EntryName> {
    let invalid = |reason| ArchiveError::InvalidEntryName {
        name: path.to_string(),
        reason,
    };

    if path.contains('\0') {
        return Err(invalid("contains a NUL byte"));
    }

    let unified = path.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(invalid("contains a '..' segment")),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(invalid("is empty after normalization"));
    }

    let mut name = segments.join("/");
    if kind == EntryKind::Directory {
        name.push('/');
    }
    Ok(EntryName(name))
}
