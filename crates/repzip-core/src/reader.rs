//! Archive reader for inspecting finished archives.
//!
//! Lists entries with the metadata the session controls (name, timestamp,
//! mode, method) and reads entry contents with CRC verification.

use crate::compression::Compression;
use crate::name::EntryKind;
use crate::time::EffectiveTimestamp;
use crate::{ArchiveError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Metadata of one archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub compressed_size: u64,
    /// ZIP method name as stored in the header.
    pub method: String,
    /// `None` for methods outside the supported set.
    pub compression: Option<Compression>,
    pub timestamp: Option<EffectiveTimestamp>,
    pub unix_mode: Option<u32>,
    pub crc32: u32,
}

/// Reader for ZIP archives.
pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    entries: Vec<EntryInfo>,
}

impl ArchiveReader<BufReader<File>> {
    /// Open an archive from a file path.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl ArchiveReader<Cursor<Vec<u8>>> {
    /// Open an archive from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Create a reader from any Read + Seek source.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index(index)?;
            entries.push(EntryInfo {
                name: file.name().to_string(),
                kind: if file.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: file.size(),
                compressed_size: file.compressed_size(),
                method: file.compression().to_string(),
                compression: Compression::from_method(file.compression()),
                timestamp: file.last_modified().map(EffectiveTimestamp::from_zip),
                unix_mode: file.unix_mode(),
                crc32: file.crc32(),
            });
        }

        info!(entries = entries.len(), "Archive opened");

        Ok(Self { archive, entries })
    }

    /// Entries in archive order.
    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if an entry exists.
    pub fn has_entry(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Read an entry's content; the CRC is checked once the entry is read
    /// to the end.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| ArchiveError::EntryNotFound(name.to_string()))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        debug!(name, bytes = data.len(), "Read entry from archive");

        Ok(data)
    }

    /// Read every file entry.
    ///
    /// Returns the names of entries that failed to decode.
    pub fn verify_all(&mut self) -> Vec<String> {
        let mut failures = Vec::new();

        let names: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.name.clone())
            .collect();

        for name in names {
            if let Err(e) = self.read(&name) {
                warn!(name = %name, error = %e, "Verification failed");
                failures.push(name);
            }
        }

        if failures.is_empty() {
            info!("All entries verified");
        } else {
            warn!(failures = ?failures, "Some entries failed verification");
        }

        failures
    }

    /// Distinct timestamps carried by the entries.
    pub fn timestamps(&self) -> Vec<EffectiveTimestamp> {
        let mut stamps: Vec<_> = self.entries.iter().filter_map(|e| e.timestamp).collect();
        stamps.sort();
        stamps.dedup();
        stamps
    }
}
