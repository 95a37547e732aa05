//! Archive sessions.
//!
//! An [`ArchiveSession`] owns an archive writer for its lifetime. It resolves
//! the session timestamp once, then turns every `create_directory` /
//! `create_file` call into a fully normalized [`EntrySpec`] and appends it in
//! call order. The writer is finalized exactly once: by [`ArchiveSession::finish`],
//! or from `Drop` when the session goes out of scope without it.

use crate::compression::Compression;
use crate::config::SessionOptions;
use crate::diagnostics::Diagnostic;
use crate::name::{self, EntryKind, EntryName};
use crate::permissions::PermissionPolicy;
use crate::time::{self, EffectiveTimestamp, TimestampSource};
use crate::{ArchiveError, Result};
use std::io::{Seek, Write};
use tracing::{debug, info, warn};
use zip::write::{FileOptions, ZipWriter};

/// One entry, fully normalized, handed to the archive writer.
#[derive(Debug, Clone, Copy)]
pub struct EntrySpec<'a> {
    pub name: &'a EntryName,
    pub kind: EntryKind,
    /// Empty for directories.
    pub content: &'a [u8],
    pub mode: u32,
    pub timestamp: EffectiveTimestamp,
    pub compression: Compression,
}

/// The container format behind a session.
pub trait ArchiveWriter {
    /// What finalizing hands back (usually the sink).
    type Output;

    /// Append one entry after all previously appended ones.
    fn append(&mut self, entry: &EntrySpec<'_>) -> Result<()>;

    /// Write trailing structures and release the sink.
    fn finish(self) -> Result<Self::Output>;
}

enum ZipState<W: Write + Seek> {
    /// No entry yet; the sink has not been written to.
    Idle(W),
    Writing(ZipWriter<W>),
    Closed,
}

/// [`ArchiveWriter`] producing a ZIP container on any seekable sink.
///
/// The ZIP writer is created on the first append, so a session that adds
/// no entries leaves its sink exactly as it was given.
pub struct ZipArchiveWriter<W: Write + Seek> {
    state: ZipState<W>,
}

impl<W: Write + Seek> ZipArchiveWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            state: ZipState::Idle(sink),
        }
    }

    fn zip(&mut self) -> Result<&mut ZipWriter<W>> {
        if matches!(self.state, ZipState::Idle(_)) {
            if let ZipState::Idle(sink) = std::mem::replace(&mut self.state, ZipState::Closed) {
                self.state = ZipState::Writing(ZipWriter::new(sink));
            }
        }
        match &mut self.state {
            ZipState::Writing(zip) => Ok(zip),
            _ => Err(writer_closed()),
        }
    }
}

fn writer_closed() -> ArchiveError {
    ArchiveError::Io(std::io::Error::other("archive writer is already finished"))
}

impl<W: Write + Seek> ArchiveWriter for ZipArchiveWriter<W> {
    type Output = W;

    fn append(&mut self, entry: &EntrySpec<'_>) -> Result<()> {
        let options: FileOptions<'_, ()> = FileOptions::default()
            .last_modified_time(entry.timestamp.to_zip()?)
            .unix_permissions(entry.mode);

        let zip = self.zip()?;
        match entry.kind {
            // Directories are always stored.
            EntryKind::Directory => zip.add_directory(entry.name.as_str(), options)?,
            EntryKind::File => {
                let options = options
                    .compression_method(entry.compression.method())
                    .compression_level(entry.compression.level());
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(entry.content)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<W> {
        match self.state {
            ZipState::Idle(sink) => Ok(sink),
            ZipState::Writing(zip) => Ok(zip.finish()?),
            ZipState::Closed => Err(writer_closed()),
        }
    }
}

/// A scoped archive build.
pub struct ArchiveSession<A: ArchiveWriter> {
    writer: Option<A>,
    timestamp: EffectiveTimestamp,
    timestamp_source: TimestampSource,
    compression: Compression,
    permissions: PermissionPolicy,
    diagnostics: Vec<Diagnostic>,
    entries: usize,
}

impl<W: Write + Seek> ArchiveSession<ZipArchiveWriter<W>> {
    /// Open a ZIP session on `sink`.
    ///
    /// Fails with `InvalidTimeSpec` when the explicit time override cannot be
    /// used; `sink` is dropped untouched in that case.
    pub fn create(sink: W, options: &SessionOptions) -> Result<Self> {
        Self::with_writer(ZipArchiveWriter::new(sink), options)
    }
}

impl<A: ArchiveWriter> ArchiveSession<A> {
    /// Open a session on an arbitrary archive writer.
    pub fn with_writer(writer: A, options: &SessionOptions) -> Result<Self> {
        let resolution = time::resolve(
            options.time.as_ref(),
            options.source_date_epoch.as_deref(),
        )?;
        for diagnostic in &resolution.diagnostics {
            diagnostic.emit();
        }

        debug!(
            timestamp = %resolution.timestamp,
            source = %resolution.source,
            compression = %options.compression,
            permissions = %options.permissions,
            "Session timestamp resolved"
        );

        Ok(Self {
            writer: Some(writer),
            timestamp: resolution.timestamp,
            timestamp_source: resolution.source,
            compression: options.compression,
            permissions: options.permissions,
            diagnostics: resolution.diagnostics,
            entries: 0,
        })
    }

    /// Add a directory entry.
    pub fn create_directory(&mut self, path: &str) -> Result<()> {
        self.append(path, EntryKind::Directory, &[], None)
    }

    /// Add a file entry with `content`.
    pub fn create_file(&mut self, path: &str, content: impl AsRef<[u8]>) -> Result<()> {
        self.append(path, EntryKind::File, content.as_ref(), None)
    }

    /// Add an entry observed on disk; `source_mode` feeds the permission policy.
    pub(crate) fn append(
        &mut self,
        path: &str,
        kind: EntryKind,
        content: &[u8],
        source_mode: Option<u32>,
    ) -> Result<()> {
        let name = name::normalize(path, kind)?;
        let entry = EntrySpec {
            name: &name,
            kind,
            content,
            mode: self.permissions.normalize(kind, source_mode),
            timestamp: self.timestamp,
            compression: self.compression,
        };

        let writer = self.writer.as_mut().ok_or_else(writer_closed)?;
        writer.append(&entry)?;
        self.entries += 1;

        debug!(
            name = %name,
            kind = %kind,
            bytes = content.len(),
            mode = format_args!("{:o}", entry.mode),
            "Entry added"
        );
        Ok(())
    }

    /// Finalize the archive and return the writer's output.
    pub fn finish(mut self) -> Result<A::Output> {
        let writer = self.writer.take().ok_or_else(writer_closed)?;
        let output = writer.finish()?;
        info!(
            entries = self.entries,
            timestamp = %self.timestamp,
            compression = %self.compression,
            "Archive finalized"
        );
        Ok(output)
    }

    pub fn timestamp(&self) -> EffectiveTimestamp {
        self.timestamp
    }

    pub fn timestamp_source(&self) -> TimestampSource {
        self.timestamp_source
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn permissions(&self) -> PermissionPolicy {
        self.permissions
    }

    /// Conditions recovered from while resolving the timestamp.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Entries appended so far.
    pub fn entry_count(&self) -> usize {
        self.entries
    }
}

impl<A: ArchiveWriter> Drop for ArchiveSession<A> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            match writer.finish() {
                Ok(_) => debug!(entries = self.entries, "Archive finalized on drop"),
                Err(e) => warn!(error = %e, "Failed to finalize archive on drop"),
            }
        }
    }
}

/// Run `f` against a fresh ZIP session on `sink`, then finalize.
///
/// The archive is finalized on every path. When `f` fails, its error is
/// returned even if finalizing fails as well.
pub fn with_session<W, T, F>(sink: W, options: &SessionOptions, f: F) -> Result<(T, W)>
where
    W: Write + Seek,
    F: FnOnce(&mut ArchiveSession<ZipArchiveWriter<W>>) -> Result<T>,
{
    let mut session = ArchiveSession::create(sink, options)?;
    match f(&mut session) {
        Ok(value) => Ok((value, session.finish()?)),
        Err(e) => {
            if let Err(finish_err) = session.finish() {
                warn!(error = %finish_err, "Failed to finalize archive after error");
            }
            Err(e)
        }
    }
}
