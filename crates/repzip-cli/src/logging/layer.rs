//! Custom tracing layer for JSONL output.
//!
//! Produces one [`LogEvent`] per line on stderr while keeping stdout
//! clean for command payloads.

use std::io::{self, Write};
use std::sync::Mutex;

use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::{Level, LogEvent};

/// Keys lifted out of `fields` into the top level of the event.
const CONTEXT_KEYS: [&str; 3] = ["command", "archive", "stage"];

/// Context recorded on a span and inherited by events inside it.
#[derive(Debug, Clone, Default)]
struct SpanContext {
    command: Option<String>,
    archive: Option<String>,
    stage: Option<String>,
}

impl SpanContext {
    fn set(&mut self, key: &str, value: String) {
        match key {
            "command" => self.command = Some(value),
            "archive" => self.archive = Some(value),
            "stage" => self.stage = Some(value),
            _ => {}
        }
    }

    /// Fill unset keys from an outer span.
    fn inherit(&mut self, outer: &SpanContext) {
        if self.command.is_none() {
            self.command.clone_from(&outer.command);
        }
        if self.archive.is_none() {
            self.archive.clone_from(&outer.archive);
        }
        if self.stage.is_none() {
            self.stage.clone_from(&outer.stage);
        }
    }
}

/// Collects event fields as JSON values.
#[derive(Default)]
struct JsonFieldVisitor {
    fields: serde_json::Map<String, serde_json::Value>,
    message: Option<String>,
}

impl JsonFieldVisitor {
    /// Split the collected fields into the event context and the rest.
    fn take_context(&mut self) -> SpanContext {
        let mut context = SpanContext::default();
        for key in CONTEXT_KEYS {
            if let Some(serde_json::Value::String(value)) = self.fields.remove(key) {
                context.set(key, value);
            }
        }
        context
    }
}

impl tracing::field::Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{:?}", value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(
            field.name().to_string(),
            serde_json::Value::Number(value.into()),
        );
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(
            field.name().to_string(),
            serde_json::Value::Number(value.into()),
        );
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.fields
                .insert(field.name().to_string(), serde_json::Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::Bool(value));
    }
}

/// JSONL tracing layer, stderr by default.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer {
            writer: Mutex::new(io::stderr()),
        }
    }
}

impl<W: Write> JsonlLayer<W> {
    /// Layer writing to a custom writer.
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = JsonFieldVisitor::default();
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(visitor.take_context());
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        // Event fields win over the innermost span, which wins over outer ones.
        let mut context = visitor.take_context();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(outer) = span.extensions().get::<SpanContext>() {
                    context.inherit(outer);
                }
            }
        }

        let level: Level = (*event.metadata().level()).into();
        let mut record = LogEvent::new(level, event.metadata().target());
        record.command = context.command;
        record.archive = context.archive;
        record.stage = context.stage;
        record.message = visitor.message;
        record.fields = visitor.fields;

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", record.to_jsonl());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<serde_json::Value> {
        let buffer = SharedBuffer::default();
        let subscriber = tracing_subscriber::registry().with(JsonlLayer::new(buffer.clone()));
        tracing::subscriber::with_default(subscriber, f);
        buffer.lines()
    }

    #[test]
    fn test_jsonl_layer_output() {
        let lines = capture(|| {
            tracing::info!(target: "test.event", entries = 3u64, ok = true, "test message");
        });

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["level"], "info");
        assert_eq!(line["event"], "test.event");
        assert_eq!(line["message"], "test message");
        assert_eq!(line["fields"]["entries"], 3);
        assert_eq!(line["fields"]["ok"], true);
        assert!(line.get("command").is_none());
    }

    #[test]
    fn test_context_lifted_from_event_fields() {
        let lines = capture(|| {
            tracing::warn!(
                target: "build.failed",
                command = "build",
                archive = "out.zip",
                stage = %"archive",
                "Build failed"
            );
        });

        let line = &lines[0];
        assert_eq!(line["command"], "build");
        assert_eq!(line["archive"], "out.zip");
        assert_eq!(line["stage"], "archive");
        assert!(line.get("fields").is_none());
    }

    #[test]
    fn test_context_inherited_from_spans() {
        let lines = capture(|| {
            let outer = tracing::info_span!("run", command = "list", archive = "a.zip");
            let _outer = outer.enter();
            let inner = tracing::info_span!("step", stage = "inspect");
            let _inner = inner.enter();
            tracing::info!(target: "list.finished", "done");
            tracing::info!(target: "list.finished", stage = "report", "printed");
        });

        assert_eq!(lines[0]["command"], "list");
        assert_eq!(lines[0]["archive"], "a.zip");
        assert_eq!(lines[0]["stage"], "inspect");
        assert_eq!(lines[1]["stage"], "report");
    }

    #[test]
    fn test_log_context_span_covers_untagged_events() {
        let lines = capture(|| {
            let ctx = crate::logging::LogContext::new("build", "out.zip");
            let _run = ctx.span().entered();
            tracing::debug!(target: "repzip_core::session", name = "test2", "Entry added");
        });

        assert_eq!(lines[0]["event"], "repzip_core::session");
        assert_eq!(lines[0]["command"], "build");
        assert_eq!(lines[0]["archive"], "out.zip");
        assert_eq!(lines[0]["fields"]["name"], "test2");
    }
}
