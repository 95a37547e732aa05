//! Command payloads printed on stdout.

use crate::exit_codes::ExitCode;
use clap::ValueEnum;
use repzip_core::{BuildSummary, EntryInfo, EntryKind};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Supported payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned text for terminals
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a finished build.
pub fn render_summary(summary: &BuildSummary, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(summary),
        OutputFormat::Human => {
            let mut out = String::new();
            let _ = writeln!(out, "Wrote {}", summary.output.display());
            let _ = writeln!(
                out,
                "  entries:     {} ({} directories, {} files)",
                summary.entries, summary.directories, summary.files
            );
            let _ = writeln!(out, "  content:     {} bytes", summary.content_bytes);
            let _ = writeln!(out, "  archive:     {} bytes", summary.archive_bytes);
            let _ = writeln!(
                out,
                "  timestamp:   {} ({})",
                summary.timestamp, summary.timestamp_source
            );
            let _ = writeln!(out, "  compression: {}", summary.compression);
            let _ = writeln!(out, "  permissions: {}", summary.permissions);
            let _ = write!(out, "  sha256:      {}", summary.sha256);
            Ok(out)
        }
    }
}

/// Render an archive listing, one entry per line in human form.
pub fn render_listing(entries: &[EntryInfo], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(entries),
        OutputFormat::Human => {
            let mut out = String::new();
            for entry in entries {
                let kind = match entry.kind {
                    EntryKind::Directory => 'd',
                    EntryKind::File => '-',
                };
                let mode = entry
                    .unix_mode
                    .map_or_else(|| "-".to_string(), |m| format!("{:o}", m & 0o7777));
                let timestamp = entry
                    .timestamp
                    .map_or_else(|| "-".to_string(), |t| t.to_string());
                let _ = writeln!(
                    out,
                    "{kind} {mode:>4} {:>10} {:>10} {:<8} {timestamp} {}",
                    entry.size, entry.compressed_size, entry.method, entry.name
                );
            }
            let _ = write!(out, "{} entries", entries.len());
            Ok(out)
        }
    }
}

/// Render a failure.
pub fn render_error(
    message: &str,
    code: ExitCode,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "error": message,
            "code": code.code_name(),
            "exit_code": code.as_i32(),
        })),
        OutputFormat::Human => Ok(format!("error: {message}")),
    }
}
