//! Recoverable conditions reported while configuring a session.
//!
//! The time resolver does not log. It hands back a list of [`Diagnostic`]s
//! and the session decides how to surface them (see
//! [`Diagnostic::emit`]), which keeps resolution a pure function that tests
//! can assert on directly.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// How serious a recovered condition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The epoch environment value is not a base-10 integer.
    UnparseableEpoch,
    /// The epoch resolves before 1980-01-01 and was clamped.
    EpochBelowFloor,
    /// The epoch resolves after the last DOS date and was clamped.
    EpochAboveCeiling,
}

/// A single recovered condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
        }
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
        }
    }

    /// Forward this diagnostic to `tracing` at its severity.
    pub fn emit(&self) {
        match self.severity {
            Severity::Warning => warn!(kind = ?self.kind, "{}", self.message),
            Severity::Error => error!(kind = ?self.kind, "{}", self.message),
        }
    }
}

/// Count diagnostics of one severity.
pub fn count_severity(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .count()
}
