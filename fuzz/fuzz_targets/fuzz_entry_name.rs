//! Fuzz target for entry-name normalization.
//!
//! Accepted names must be canonical: no leading or doubled separator, no
//! `.`/`..` segments, exactly one trailing `/` for directories, and
//! normalizing them again must be a no-op.

#![no_main]

use libfuzzer_sys::fuzz_target;
use repzip_core::name::normalize;
use repzip_core::EntryKind;

fuzz_target!(|input: (&str, bool)| {
    let (path, is_dir) = input;
    let kind = if is_dir { EntryKind::Directory } else { EntryKind::File };

    let Ok(name) = normalize(path, kind) else {
        return;
    };
    let s = name.as_str();

    assert!(!s.starts_with('/'));
    assert!(!s.contains('\\'));
    assert!(!s.contains('\0'));
    assert_eq!(s.ends_with('/'), is_dir);

    let body = s.strip_suffix('/').unwrap_or(s);
    assert!(!body.is_empty());
    for segment in body.split('/') {
        assert!(!segment.is_empty() && segment != "." && segment != "..");
    }

    let again = normalize(s, kind).expect("canonical name re-normalizes");
    assert_eq!(again, name);
});
