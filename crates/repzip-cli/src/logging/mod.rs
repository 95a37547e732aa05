//! Structured logging for the `repzip` binary.
//!
//! Two output modes, both on stderr:
//! - Human-readable console output for interactive use
//! - JSONL for scripts and CI logs
//!
//! stdout is reserved for command payloads (build summaries, listings).
//!
//! # Usage
//!
//! ```ignore
//! use repzip_cli::logging::{event_names, init_logging, LogConfig, LogContext, Stage};
//!
//! init_logging(&LogConfig::from_env(None, None));
//!
//! let ctx = LogContext::new("build", "out.zip");
//! log_event!(ctx, INFO, event_names::BUILD_STARTED, Stage::Walk, "Building archive");
//! ```

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs.
pub fn init_logging(config: &LogConfig) {
    // One level for every target: event names are dotted, not module paths.
    let filter = EnvFilter::default().add_directive(LevelFilter::from(config.level).into());

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_ansi(use_ansi);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .init();
        }
        LogFormat::Jsonl => {
            tracing_subscriber::registry()
                .with(filter)
                .with(JsonlLayer::stderr())
                .init();
        }
    }
}

/// Structured event logging with a [`LogContext`].
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::BUILD_FINISHED, Stage::Archive, "Archive written",
///     entries = 9, sha256 = %digest);
/// ```
#[macro_export]
macro_rules! log_event {
    (@emit $level:ident, $ctx:expr, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        tracing::$level!(
            target: $event,
            command = %$ctx.command,
            archive = %$ctx.archive,
            stage = %$stage,
            $($($fields)+ ,)?
            "{}", $msg
        )
    };
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        $crate::log_event!(@emit info, $ctx, $event, $stage, $msg $(, $($fields)+)?)
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        $crate::log_event!(@emit debug, $ctx, $event, $stage, $msg $(, $($fields)+)?)
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        $crate::log_event!(@emit warn, $ctx, $event, $stage, $msg $(, $($fields)+)?)
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $($fields:tt)+)?) => {
        $crate::log_event!(@emit error, $ctx, $event, $stage, $msg $(, $($fields)+)?)
    };
}
