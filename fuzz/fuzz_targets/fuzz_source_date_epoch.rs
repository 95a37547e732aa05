//! Fuzz target for SOURCE_DATE_EPOCH interpretation.
//!
//! Resolution never fails: every value maps to a storable timestamp, and
//! a diagnostic is reported exactly when the value was not usable as-is.

#![no_main]

use libfuzzer_sys::fuzz_target;
use repzip_core::diagnostics::DiagnosticKind;
use repzip_core::time::{resolve, resolve_epoch};
use repzip_core::{EffectiveTimestamp, TimestampSource};

fuzz_target!(|raw: &str| {
    let (ts, diagnostic) = resolve_epoch(raw);
    assert!(ts >= EffectiveTimestamp::FLOOR && ts <= EffectiveTimestamp::CEILING);
    assert!(ts.to_zip().is_ok());
    if diagnostic.is_some() {
        assert!(ts == EffectiveTimestamp::FLOOR || ts == EffectiveTimestamp::CEILING);
    }

    let resolution = resolve(None, Some(raw)).expect("environment values never fail");
    let expected_source = match &diagnostic {
        Some(d) if d.kind == DiagnosticKind::UnparseableEpoch => TimestampSource::Default,
        _ => TimestampSource::Environment,
    };
    assert_eq!(resolution.source, expected_source);
    assert_eq!(resolution.timestamp, ts);
    assert_eq!(resolution.diagnostics.len(), usize::from(diagnostic.is_some()));
});
