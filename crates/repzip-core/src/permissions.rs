//! Canonical permission attributes.
//!
//! The mode stored for an entry is chosen from a closed set of values that
//! depends only on the entry kind (and, for [`PermissionPolicy::Executable`],
//! on whether the source file is executable). Host umask and the exact
//! on-disk bits never reach the archive.

use crate::name::EntryKind;
use crate::ArchiveError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// `S_IFDIR | 0o755`
pub const DIRECTORY_MODE: u32 = 0o40755;
/// `S_IFREG | 0o644`
pub const FILE_MODE: u32 = 0o100644;
/// `S_IFREG | 0o755`
pub const EXECUTABLE_FILE_MODE: u32 = 0o100755;

/// How entry permission attributes are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionPolicy {
    /// One value per entry kind, ignoring the source entirely.
    #[default]
    Fixed,
    /// As `Fixed`, except files with any execute bit set keep a single
    /// executable mode.
    Executable,
}

impl PermissionPolicy {
    /// Canonical attribute for an entry of `kind`.
    ///
    /// `source_mode` is the on-disk mode when the entry comes from a
    /// directory walk; explicit entries pass `None`.
    pub fn normalize(&self, kind: EntryKind, source_mode: Option<u32>) -> u32 {
        match (self, kind) {
            (_, EntryKind::Directory) => DIRECTORY_MODE,
            (PermissionPolicy::Executable, EntryKind::File)
                if source_mode.is_some_and(|mode| mode & 0o111 != 0) =>
            {
                EXECUTABLE_FILE_MODE
            }
            (_, EntryKind::File) => FILE_MODE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionPolicy::Fixed => "fixed",
            PermissionPolicy::Executable => "executable",
        }
    }
}

impl std::fmt::Display for PermissionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionPolicy {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(PermissionPolicy::Fixed),
            "executable" => Ok(PermissionPolicy::Executable),
            other => Err(ArchiveError::UnsupportedPermissionPolicy(other.to_string())),
        }
    }
}
