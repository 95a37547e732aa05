//! Session configuration.
//!
//! [`SessionOptions`] is the only input to a session. The process
//! environment is read in exactly one place, [`SessionOptions::from_env`];
//! everything downstream works on the captured snapshot.
//!
//! Settings with an environment fallback resolve in the order:
//! CLI argument → environment variable → built-in default.

use crate::compression::Compression;
use crate::permissions::PermissionPolicy;
use crate::time::{TimeOverride, SOURCE_DATE_EPOCH};
use crate::Result;
use serde::Serialize;
use std::str::FromStr;

/// Environment variable selecting the default compression method.
pub const ENV_COMPRESSION: &str = "REPZIP_COMPRESSION";

/// Environment variable selecting the default permission policy.
pub const ENV_PERMISSIONS: &str = "REPZIP_PERMISSIONS";

/// Everything a session needs to know before its first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Explicit timestamp; wins over `source_date_epoch`.
    pub time: Option<TimeOverride>,
    pub compression: Compression,
    pub permissions: PermissionPolicy,
    /// Snapshot of `SOURCE_DATE_EPOCH`, unparsed.
    pub source_date_epoch: Option<String>,
}

impl SessionOptions {
    /// Default options with the `SOURCE_DATE_EPOCH` snapshot taken from the
    /// process environment.
    pub fn from_env() -> Self {
        Self {
            source_date_epoch: std::env::var(SOURCE_DATE_EPOCH).ok(),
            ..Self::default()
        }
    }

    pub fn with_time(mut self, time: impl Into<TimeOverride>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_permissions(mut self, permissions: PermissionPolicy) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_source_date_epoch(mut self, value: impl Into<String>) -> Self {
        self.source_date_epoch = Some(value.into());
        self
    }
}

/// Where a setting came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A resolved setting and its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ConfigSource,
}

/// Resolve one setting from a CLI value and an environment snapshot.
///
/// An environment value that does not parse is an error rather than a
/// silent fallback, so a typo never changes the archive bytes unnoticed.
pub fn resolve_setting<T>(cli: Option<T>, env: Option<&str>) -> Result<Resolved<T>>
where
    T: FromStr<Err = crate::ArchiveError> + Default,
{
    if let Some(value) = cli {
        return Ok(Resolved {
            value,
            source: ConfigSource::CliArgument,
        });
    }

    if let Some(raw) = env.filter(|raw| !raw.trim().is_empty()) {
        return Ok(Resolved {
            value: raw.parse()?,
            source: ConfigSource::Environment,
        });
    }

    Ok(Resolved {
        value: T::default(),
        source: ConfigSource::BuiltinDefault,
    })
}

/// Resolve the compression method against `REPZIP_COMPRESSION`.
pub fn resolve_compression(cli: Option<Compression>) -> Result<Resolved<Compression>> {
    resolve_setting(cli, std::env::var(ENV_COMPRESSION).ok().as_deref())
}

/// Resolve the permission policy against `REPZIP_PERMISSIONS`.
pub fn resolve_permissions(cli: Option<PermissionPolicy>) -> Result<Resolved<PermissionPolicy>> {
    resolve_setting(cli, std::env::var(ENV_PERMISSIONS).ok().as_deref())
}
