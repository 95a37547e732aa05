//! Reproducible ZIP archives.
//!
//! Archives built with this crate are a pure function of the entries put
//! into them: the same relative paths and contents always give the same
//! bytes, whatever the build machine's clock, umask or filesystem order.
//!
//! # Determinism
//!
//! - **Timestamp**: every entry of a session carries one timestamp, taken
//!   from an explicit override, else `SOURCE_DATE_EPOCH`, else
//!   1980-01-01T00:00:00 ([`time`]).
//! - **Names**: `/`-separated, no leading separator, directories end with
//!   exactly one `/` ([`name`]).
//! - **Permissions**: one fixed mode per entry kind ([`permissions`]).
//! - **Order**: explicit entries keep call order; directory builds walk the
//!   tree in byte-wise pre-order ([`walk`]).
//!
//! # Example
//!
//! ```no_run
//! use repzip_core::{ArchiveSession, Compression, SessionOptions};
//! use std::fs::File;
//!
//! let options = SessionOptions::from_env().with_compression(Compression::Deflated);
//! let mut session = ArchiveSession::create(File::create("out.zip")?, &options)?;
//! session.create_directory("docs")?;
//! session.create_file("docs/README", "Hello world")?;
//! session.finish()?;
//! # Ok::<(), repzip_core::ArchiveError>(())
//! ```

pub mod build;
pub mod compression;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod name;
pub mod permissions;
pub mod reader;
pub mod session;
pub mod time;
pub mod walk;

pub use build::{build_archive, sha256_hex, BuildSummary, DirectoryBuild};
pub use compression::Compression;
pub use config::{ConfigSource, SessionOptions};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use error::{ArchiveError, Result};
pub use name::{EntryKind, EntryName};
pub use permissions::PermissionPolicy;
pub use reader::{ArchiveReader, EntryInfo};
pub use session::{with_session, ArchiveSession, ArchiveWriter, EntrySpec, ZipArchiveWriter};
pub use time::{EffectiveTimestamp, TimeOverride, TimestampSource};
pub use walk::{TraversalOrder, TreeWalker, WalkEntry};
