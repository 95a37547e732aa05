//! Fuzz target for explicit time overrides.
//!
//! Any text or field list either fails with an error or yields a timestamp
//! inside the range a ZIP header can store.

#![no_main]

use libfuzzer_sys::fuzz_target;
use repzip_core::{EffectiveTimestamp, TimeOverride};

fuzz_target!(|input: (&str, Vec<i64>)| {
    let (text, fields) = input;

    let parsed: TimeOverride = text.parse().unwrap_or_else(|never| match never {});
    for candidate in [parsed, TimeOverride::Fields(fields)] {
        if let Ok(ts) = candidate.to_timestamp() {
            assert!(ts >= EffectiveTimestamp::FLOOR);
            assert!(ts <= EffectiveTimestamp::CEILING);
            assert!(ts.to_zip().is_ok());
        }
    }
});
