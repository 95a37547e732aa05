//! Structured event definitions for logging.
//!
//! Every JSONL line is one [`LogEvent`]: timestamp, level, event name,
//! the command and archive it concerns, the stage, and free fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Stages of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Argument and environment resolution.
    Init,
    /// Filesystem traversal.
    Walk,
    /// Writing and finalizing the archive.
    Archive,
    /// Reading an existing archive.
    Inspect,
    /// Printing the command payload.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Walk => "walk",
            Stage::Archive => "archive",
            Stage::Inspect => "inspect",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Command lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FAILED: &str = "run.failed";

    // Configuration
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const TIME_RESOLVED: &str = "time.resolved";

    // Build
    pub const BUILD_STARTED: &str = "build.started";
    pub const BUILD_FINISHED: &str = "build.finished";

    // Inspection
    pub const LIST_STARTED: &str = "list.started";
    pub const LIST_FINISHED: &str = "list.finished";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event for JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,
    /// Event name (e.g. "build.finished"); the tracing target.
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(level: Level, event: impl Into<String>) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            command: None,
            archive: None,
            stage: None,
            message: None,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// What a command invocation is about; attached to every event it logs.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Subcommand name (`build`, `list`).
    pub command: String,
    /// Archive path the command writes or reads.
    pub archive: String,
}

impl LogContext {
    pub fn new(command: impl Into<String>, archive: impl std::fmt::Display) -> Self {
        LogContext {
            command: command.into(),
            archive: archive.to_string(),
        }
    }

    /// Span carrying this context to every event logged inside it,
    /// including those from `repzip_core`.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("run", command = %self.command, archive = %self.archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let mut event = LogEvent::new(Level::Info, event_names::BUILD_FINISHED)
            .with_message("Archive written");
        event.fields.insert("entries".to_string(), 9.into());
        event.command = Some("build".to_string());
        event.stage = Some(Stage::Archive.to_string());

        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"build.finished""#));
        assert!(json.contains(r#""level":"info""#));
        assert!(json.contains(r#""command":"build""#));
        assert!(json.contains(r#""stage":"archive""#));
        assert!(json.contains(r#""fields":{"entries":9}"#));
        assert!(!json.contains("archive\":null"));
    }

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new("list", std::path::Path::new("out.zip").display());
        assert_eq!(ctx.command, "list");
        assert_eq!(ctx.archive, "out.zip");
    }

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [Stage::Init, Stage::Walk, Stage::Archive, Stage::Inspect, Stage::Report] {
            assert_eq!(
                serde_json::to_string(&stage).unwrap(),
                format!("\"{}\"", stage)
            );
        }
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }
}
