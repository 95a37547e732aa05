//! Exit codes for the `repzip` CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal and I/O errors
//!
//! Malformed command lines are rejected by clap with its own status (2).

use repzip_core::ArchiveError;

/// Exit codes for `repzip` operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Archive written or listed
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments or configuration values
    ArgsError = 10,

    /// Patterns matched nothing under the root
    NothingMatched = 11,

    /// Permission denied on the tree or the output
    PermissionError = 12,

    /// Requested archive or entry does not exist
    NotFound = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Archive codec or serialization failure
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Codes 10-19: can be resolved by user action.
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Codes 20-29.
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::NothingMatched => "ERR_NOTHING_MATCHED",
            ExitCode::PermissionError => "ERR_PERMISSION",
            ExitCode::NotFound => "ERR_NOT_FOUND",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ExitCode::PermissionError,
            std::io::ErrorKind::NotFound => ExitCode::NotFound,
            _ => ExitCode::IoError,
        }
    }
}

impl From<&ArchiveError> for ExitCode {
    fn from(err: &ArchiveError) -> Self {
        match err {
            ArchiveError::InvalidTimeSpec(_)
            | ArchiveError::InvalidPattern { .. }
            | ArchiveError::InvalidEntryName { .. }
            | ArchiveError::UnsupportedCompression(_)
            | ArchiveError::UnsupportedPermissionPolicy(_)
            | ArchiveError::RootNotDirectory(_) => ExitCode::ArgsError,
            ArchiveError::NothingMatched(_) => ExitCode::NothingMatched,
            ArchiveError::EntryNotFound(_) => ExitCode::NotFound,
            ArchiveError::Io(e) => ExitCode::from_io(e),
            ArchiveError::Walk(e) => e.io_error().map_or(ExitCode::IoError, ExitCode::from_io),
            ArchiveError::Zip(_) | ArchiveError::Json(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::ArgsError.is_user_error());
        assert!(ExitCode::NotFound.is_user_error());
        assert!(!ExitCode::IoError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::PermissionError.is_internal_error());
    }

    #[test]
    fn test_argument_errors() {
        for err in [
            ArchiveError::InvalidTimeSpec("2 eggs".into()),
            ArchiveError::UnsupportedCompression("zstd".into()),
            ArchiveError::UnsupportedPermissionPolicy("loose".into()),
            ArchiveError::RootNotDirectory(PathBuf::from("/nope")),
            ArchiveError::InvalidEntryName {
                name: "../x".into(),
                reason: "parent reference",
            },
        ] {
            assert_eq!(ExitCode::from(&err), ExitCode::ArgsError, "{err}");
        }
    }

    #[test]
    fn test_io_errors_by_kind() {
        let denied = ArchiveError::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(ExitCode::from(&denied), ExitCode::PermissionError);

        let missing = ArchiveError::Io(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(ExitCode::from(&missing), ExitCode::NotFound);

        let other = ArchiveError::Io(io::Error::other("disk full"));
        assert_eq!(ExitCode::from(&other), ExitCode::IoError);
    }

    #[test]
    fn test_outcome_errors() {
        assert_eq!(
            ExitCode::from(&ArchiveError::NothingMatched("*.rs".into())),
            ExitCode::NothingMatched
        );
        assert_eq!(
            ExitCode::from(&ArchiveError::EntryNotFound("a".into())),
            ExitCode::NotFound
        );
        let codec = repzip_core::ArchiveReader::from_bytes(b"not a zip".to_vec())
            .err()
            .expect("not an archive");
        assert_eq!(ExitCode::from(&codec), ExitCode::InternalError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::ArgsError.to_string(), "ERR_ARGS (10)");
        assert_eq!(i32::from(ExitCode::IoError), 21);
    }
}
