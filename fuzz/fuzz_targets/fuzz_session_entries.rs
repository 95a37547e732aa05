//! Fuzz target for explicit-entry sessions.
//!
//! Writes an arbitrary sequence of entries twice and checks that the two
//! archives are byte-identical and list the accepted entries in call order.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use repzip_core::name::normalize;
use repzip_core::{with_session, ArchiveReader, Compression, EntryKind, SessionOptions};
use std::io::Cursor;

#[derive(Debug, Arbitrary)]
enum Entry {
    Directory(String),
    File(String, Vec<u8>),
}

#[derive(Debug, Arbitrary)]
struct Input {
    method: u8,
    entries: Vec<Entry>,
}

fn write(input: &Input, compression: Compression) -> (Vec<u8>, Vec<String>) {
    let options = SessionOptions::default().with_compression(compression);
    let mut accepted = Vec::new();
    let (_, sink) = with_session(Cursor::new(Vec::new()), &options, |session| {
        for entry in &input.entries {
            let (path, kind) = match entry {
                Entry::Directory(path) => (path, EntryKind::Directory),
                Entry::File(path, _) => (path, EntryKind::File),
            };
            // Rejected names and duplicates are skipped.
            let Ok(name) = normalize(path, kind) else {
                continue;
            };
            if accepted.iter().any(|seen: &String| seen.as_str() == name.as_str()) {
                continue;
            }
            match entry {
                Entry::Directory(path) => session.create_directory(path)?,
                Entry::File(path, content) => session.create_file(path, content)?,
            }
            accepted.push(name.into_string());
        }
        Ok(())
    })
    .expect("in-memory session");
    (sink.into_inner(), accepted)
}

fuzz_target!(|input: Input| {
    let compression = Compression::ALL[usize::from(input.method) % Compression::ALL.len()];
    let (first, accepted) = write(&input, compression);
    let (second, _) = write(&input, compression);
    assert_eq!(first, second);

    if accepted.is_empty() {
        assert!(first.is_empty());
        return;
    }
    let reader = ArchiveReader::from_bytes(first).expect("finished archive");
    let names: Vec<_> = reader.entries().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, accepted);
});
