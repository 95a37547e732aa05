//! Directory builds.
//!
//! A directory build walks a root in canonical order and replays every
//! matched entry through an [`ArchiveSession`], exactly as if the caller had
//! issued the `create_directory` / `create_file` calls by hand.

use crate::compression::Compression;
use crate::config::SessionOptions;
use crate::diagnostics::Diagnostic;
use crate::name::EntryKind;
use crate::permissions::PermissionPolicy;
use crate::session::{ArchiveSession, ArchiveWriter};
use crate::time::{EffectiveTimestamp, TimestampSource};
use crate::walk::{TraversalOrder, TreeWalker};
use crate::{ArchiveError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What to take from disk.
#[derive(Debug, Clone)]
pub struct DirectoryBuild {
    pub root: PathBuf,
    pub patterns: Vec<String>,
    /// Pull in the whole subtree of every matched directory.
    pub recursive: bool,
}

impl DirectoryBuild {
    pub fn new(root: impl Into<PathBuf>, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            root: root.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            recursive: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Counts gathered while replaying a traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub directories: usize,
    pub files: usize,
    /// Uncompressed bytes of all file entries.
    pub content_bytes: u64,
}

impl ReplayStats {
    pub fn entries(&self) -> usize {
        self.directories + self.files
    }
}

/// Result of a finished directory build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub output: PathBuf,
    pub entries: usize,
    pub directories: usize,
    pub files: usize,
    pub content_bytes: u64,
    pub archive_bytes: u64,
    pub timestamp: EffectiveTimestamp,
    pub timestamp_source: TimestampSource,
    pub compression: Compression,
    pub permissions: PermissionPolicy,
    /// SHA-256 of the finished archive, lowercase hex.
    pub sha256: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Replay `order` through `session`, in order.
pub fn replay<A: ArchiveWriter>(
    session: &mut ArchiveSession<A>,
    order: TraversalOrder,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();
    for entry in order {
        match entry.kind {
            EntryKind::Directory => {
                session.append(&entry.relative, EntryKind::Directory, &[], entry.mode)?;
                stats.directories += 1;
            }
            EntryKind::File => {
                let content = fs::read(&entry.path)?;
                session.append(&entry.relative, EntryKind::File, &content, entry.mode)?;
                stats.files += 1;
                stats.content_bytes += content.len() as u64;
            }
        }
    }
    Ok(stats)
}

/// Build the archive at `output` from the tree described by `build`.
///
/// The output file is only created once the tree has been walked and the
/// options validated; an existing file at `output` inside the root is
/// never archived. Nothing is written when no entry matches, and a build
/// that fails after creating the file removes it.
pub fn build_archive(
    output: &Path,
    build: &DirectoryBuild,
    options: &SessionOptions,
) -> Result<BuildSummary> {
    let root = fs::canonicalize(&build.root)
        .map_err(|_| ArchiveError::RootNotDirectory(build.root.clone()))?;

    let mut walker = TreeWalker::new(&root, &build.patterns)?.recursive(build.recursive);
    if let Some(resolved) = resolved_output(output) {
        walker = walker.exclude(resolved);
    }

    info!(
        root = %root.display(),
        output = %output.display(),
        patterns = ?build.patterns,
        recursive = build.recursive,
        "Building archive"
    );

    let order = walker.walk()?;
    if order.is_empty() {
        return Err(ArchiveError::NothingMatched(build.patterns.join(" ")));
    }

    // A bad explicit time must fail before an existing output is truncated.
    if let Some(time) = &options.time {
        time.to_timestamp()?;
    }

    let file = File::create(output)?;
    let written = write_tree(file, order, options).inspect_err(|e| {
        match fs::remove_file(output) {
            Ok(()) => warn!(output = %output.display(), error = %e, "Removed partial archive"),
            Err(remove) => warn!(
                output = %output.display(),
                error = %remove,
                "Could not remove partial archive"
            ),
        }
    })?;
    let (stats, timestamp, timestamp_source, diagnostics) = written;

    let bytes = fs::read(output)?;
    let summary = BuildSummary {
        output: output.to_path_buf(),
        entries: stats.entries(),
        directories: stats.directories,
        files: stats.files,
        content_bytes: stats.content_bytes,
        archive_bytes: bytes.len() as u64,
        timestamp,
        timestamp_source,
        compression: options.compression,
        permissions: options.permissions,
        sha256: sha256_hex(&bytes),
        diagnostics,
    };

    info!(
        output = %output.display(),
        entries = summary.entries,
        bytes = summary.archive_bytes,
        sha256 = %summary.sha256,
        "Archive built"
    );
    Ok(summary)
}

/// Write every entry of `order` into `file`; the file is closed on return.
fn write_tree(
    file: File,
    order: TraversalOrder,
    options: &SessionOptions,
) -> Result<(ReplayStats, EffectiveTimestamp, TimestampSource, Vec<Diagnostic>)> {
    let mut session = ArchiveSession::create(BufWriter::new(file), options)?;
    let stats = replay(&mut session, order)?;
    let timestamp = session.timestamp();
    let timestamp_source = session.timestamp_source();
    let diagnostics = session.diagnostics().to_vec();

    let mut sink = session.finish()?;
    sink.flush()?;
    Ok((stats, timestamp, timestamp_source, diagnostics))
}

/// SHA-256 of `data`, lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Absolute location `output` will have, for comparison with walked paths.
fn resolved_output(output: &Path) -> Option<PathBuf> {
    let file_name = output.file_name()?;
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match fs::canonicalize(parent) {
        Ok(parent) => Some(parent.join(file_name)),
        Err(e) => {
            debug!(output = %output.display(), error = %e, "Output directory not resolvable");
            None
        }
    }
}
