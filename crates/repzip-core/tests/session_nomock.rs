//! No-mock session integration tests.
//!
//! Exercises real archive sessions end to end:
//! - Explicit-entry mode keeps call order and sizes
//! - Timestamp precedence (explicit > SOURCE_DATE_EPOCH > 1980 floor)
//! - Recovered SOURCE_DATE_EPOCH problems surface as diagnostics
//! - Accepted and rejected time override forms
//! - Sinks stay untouched when no entry is added
//! - Finalization on every exit path

use chrono::{NaiveDate, NaiveDateTime};
use repzip_core::diagnostics::count_severity;
use repzip_core::{
    sha256_hex, with_session, ArchiveError, ArchiveReader, ArchiveSession, Compression, DiagnosticKind,
    EffectiveTimestamp, EntryKind, SessionOptions, Severity, TimeOverride, TimestampSource,
};
use std::fs::{self, File};
use std::io::Cursor;
use tempfile::TempDir;

const FIVE_LEAP_YEARS: i64 = 3600 * 24 * 366 * 5;
const FIFTEEN_LEAP_YEARS: i64 = 3600 * 24 * 366 * 15;

/// SHA-256 of the stored four-entry archive built at the format floor.
const SIMPLE_STORED_SHA256: &str =
    "3473a60c2dd1f4b0ee16ebf0c966a16bce66bf6e603af17c9220ae6aa0550171";

// ============================================================================
// Helpers
// ============================================================================

/// Build a one-directory archive in memory and return it with the
/// diagnostics its session recorded.
fn single_directory(options: &SessionOptions) -> (ArchiveReader<Cursor<Vec<u8>>>, Vec<repzip_core::Diagnostic>) {
    let mut session =
        ArchiveSession::create(Cursor::new(Vec::new()), options).expect("open session");
    session.create_directory("test").expect("create directory");
    let diagnostics = session.diagnostics().to_vec();
    let bytes = session.finish().expect("finish").into_inner();
    (
        ArchiveReader::from_bytes(bytes).expect("open archive"),
        diagnostics,
    )
}

fn only_timestamp(reader: &ArchiveReader<Cursor<Vec<u8>>>) -> EffectiveTimestamp {
    let stamps = reader.timestamps();
    assert_eq!(stamps.len(), 1, "entries disagree on timestamp: {stamps:?}");
    stamps[0]
}

fn resolved(time: TimeOverride) -> Result<EffectiveTimestamp, ArchiveError> {
    let options = SessionOptions::default().with_time(time);
    ArchiveSession::create(Cursor::new(Vec::new()), &options).map(|s| s.timestamp())
}

// ============================================================================
// Explicit-entry mode
// ============================================================================

#[test]
fn test_simple_in_memory_build() {
    let options = SessionOptions::default().with_compression(Compression::Stored);
    let mut session = ArchiveSession::create(Cursor::new(Vec::new()), &options).expect("open");
    session.create_directory("test1").expect("test1");
    session.create_directory("test2/").expect("test2");
    session.create_file("test3", "").expect("test3");
    session.create_file("test4", "Hello world").expect("test4");
    let bytes = session.finish().expect("finish").into_inner();
    assert_eq!(bytes.len(), 381);
    assert_eq!(sha256_hex(&bytes), SIMPLE_STORED_SHA256);

    let mut reader = ArchiveReader::from_bytes(bytes).expect("open archive");
    let entries = reader.entries().to_vec();
    assert_eq!(entries.len(), 4);

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["test1/", "test2/", "test3", "test4"]);

    let sizes: Vec<_> = entries.iter().map(|e| e.size).collect();
    assert_eq!(sizes, [0, 0, 0, 11]);

    for entry in &entries {
        assert_eq!(
            entry.timestamp.map(|t| t.as_tuple()),
            Some((1980, 1, 1, 0, 0, 0)),
            "{} not at the format floor",
            entry.name
        );
    }
    assert_eq!(entries[0].kind, EntryKind::Directory);
    assert_eq!(entries[3].kind, EntryKind::File);
    assert_eq!(reader.read("test4").expect("read"), b"Hello world");
}

#[test]
fn test_stored_directory_and_file_bytes_are_pinned() {
    let options = SessionOptions::default().with_compression(Compression::Stored);
    let (_, sink) = with_session(Cursor::new(Vec::new()), &options, |s| {
        s.create_directory("test1")?;
        s.create_file("test4", "Hello world")
    })
    .expect("session");
    let bytes = sink.into_inner();

    assert_eq!(bytes.len(), 207);
    assert_eq!(
        sha256_hex(&bytes),
        "7cb2954e5d577634c34204a2de79b55705c9a4cc8fbe66a674f613f0e850a5b2"
    );
}

#[test]
fn test_same_calls_give_same_bytes() {
    let build = |compression| {
        let options = SessionOptions::default().with_compression(compression);
        let (_, sink) = with_session(Cursor::new(Vec::new()), &options, |s| {
            s.create_directory("docs")?;
            s.create_file("docs/a.txt", "alpha")?;
            s.create_file("docs/b.txt", vec![7u8; 4096])
        })
        .expect("build");
        sink.into_inner()
    };

    for compression in Compression::ALL {
        assert_eq!(build(compression), build(compression), "{compression} drifted");
    }
}

// ============================================================================
// Timestamp precedence
// ============================================================================

#[test]
fn test_source_date_epoch_unset() {
    let (reader, diagnostics) = single_directory(&SessionOptions::default());
    assert_eq!(only_timestamp(&reader).year(), 1980);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_source_date_epoch_garbage() {
    let options = SessionOptions::default().with_source_date_epoch("azeqsdgjhaze");
    let (reader, diagnostics) = single_directory(&options);

    assert_eq!(only_timestamp(&reader), EffectiveTimestamp::FLOOR);
    assert_eq!(count_severity(&diagnostics, Severity::Error), 1);
    assert_eq!(count_severity(&diagnostics, Severity::Warning), 0);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnparseableEpoch);
}

#[test]
fn test_source_date_epoch_before_floor() {
    let options = SessionOptions::default().with_source_date_epoch(FIVE_LEAP_YEARS.to_string());
    let (reader, diagnostics) = single_directory(&options);

    assert_eq!(only_timestamp(&reader).year(), 1980);
    assert_eq!(count_severity(&diagnostics, Severity::Error), 0);
    assert_eq!(count_severity(&diagnostics, Severity::Warning), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::EpochBelowFloor);
}

#[test]
fn test_source_date_epoch_valid() {
    let options =
        SessionOptions::default().with_source_date_epoch(FIFTEEN_LEAP_YEARS.to_string());
    let (reader, diagnostics) = single_directory(&options);

    assert_eq!(only_timestamp(&reader).year(), 1985);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_explicit_time_beats_source_date_epoch() {
    let options = SessionOptions::default()
        .with_source_date_epoch(FIFTEEN_LEAP_YEARS.to_string())
        .with_time(TimeOverride::Fields(vec![2000, 1, 1, 0, 0, 0]));
    let (reader, diagnostics) = single_directory(&options);

    assert_eq!(only_timestamp(&reader).year(), 2000);
    assert!(diagnostics.is_empty());

    // A broken environment value is not even parsed.
    let options = SessionOptions::default()
        .with_source_date_epoch("azeqsdgjhaze")
        .with_time(TimeOverride::Fields(vec![2000]));
    let session = ArchiveSession::create(Cursor::new(Vec::new()), &options).expect("open");
    assert!(session.diagnostics().is_empty());
    assert_eq!(session.timestamp_source(), TimestampSource::Explicit);
}

// ============================================================================
// Time override forms
// ============================================================================

#[test]
fn test_time_formats() {
    assert!(matches!(
        resolved(TimeOverride::from("2 eggs")),
        Err(ArchiveError::InvalidTimeSpec(_))
    ));
    assert!(matches!(
        resolved(TimeOverride::from("")),
        Err(ArchiveError::InvalidTimeSpec(_))
    ));

    let ts = resolved(TimeOverride::from("1985-02-03")).expect("iso date");
    assert_eq!(ts.as_tuple(), (1985, 2, 3, 0, 0, 0));

    let ts = resolved(TimeOverride::Fields(vec![1985, 2, 3, 4, 5, 6, 7])).expect("7 fields");
    assert_eq!(ts.as_tuple(), (1985, 2, 3, 4, 5, 6));

    let ts = resolved(TimeOverride::Fields(vec![2000])).expect("1 field");
    assert_eq!(ts.as_tuple(), (2000, 1, 1, 0, 0, 0));

    let date = NaiveDate::from_ymd_opt(2005, 2, 3).expect("date");
    let ts = resolved(TimeOverride::from(date)).expect("date value");
    assert_eq!(ts.as_tuple(), (2005, 2, 3, 0, 0, 0));

    let dt: NaiveDateTime = date.and_hms_milli_opt(6, 7, 8, 900).expect("datetime");
    let ts = resolved(TimeOverride::from(dt)).expect("datetime value");
    assert_eq!(ts.as_tuple(), (2005, 2, 3, 6, 7, 8));
}

#[test]
fn test_time_override_from_str() {
    let parsed: TimeOverride = "2001, 2, 3".parse().expect("infallible");
    assert_eq!(parsed, TimeOverride::Fields(vec![2001, 2, 3]));

    let parsed: TimeOverride = "2001-02-03".parse().expect("infallible");
    assert_eq!(resolved(parsed).expect("iso").as_tuple(), (2001, 2, 3, 0, 0, 0));
}

// ============================================================================
// Sink handling
// ============================================================================

#[test]
fn test_empty_session_leaves_file_untouched() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("empty.zip");

    let session =
        ArchiveSession::create(File::create(&path).expect("create"), &SessionOptions::default())
            .expect("open");
    drop(session.finish().expect("finish"));
    assert_eq!(fs::metadata(&path).expect("metadata").len(), 0);

    {
        let _session = ArchiveSession::create(
            File::create(&path).expect("create"),
            &SessionOptions::default(),
        )
        .expect("open");
    }
    assert_eq!(fs::metadata(&path).expect("metadata").len(), 0);
}

#[test]
fn test_file_sink_finalized_on_drop() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("dropped.zip");
    {
        let mut session = ArchiveSession::create(
            File::create(&path).expect("create"),
            &SessionOptions::default(),
        )
        .expect("open");
        session.create_directory("a").expect("dir");
        session.create_file("a/b.txt", "b").expect("file");
    }

    let reader = ArchiveReader::open(&path).expect("complete archive");
    assert_eq!(reader.len(), 2);
}

#[test]
fn test_failed_setup_writes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bad.zip");
    let options = SessionOptions::default().with_time(TimeOverride::from("not a date"));

    let result = ArchiveSession::create(File::create(&path).expect("create"), &options);
    assert!(matches!(result, Err(ArchiveError::InvalidTimeSpec(_))));
    assert_eq!(fs::metadata(&path).expect("metadata").len(), 0);
}

#[test]
fn test_error_inside_scope_still_finalizes() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("partial.zip");

    let result = with_session(
        File::create(&path).expect("create"),
        &SessionOptions::default(),
        |s| {
            s.create_file("first.txt", "1")?;
            s.create_file("second/../../escape", "2")?;
            s.create_file("never.txt", "3")
        },
    );
    assert!(matches!(result, Err(ArchiveError::InvalidEntryName { .. })));

    let reader = ArchiveReader::open(&path).expect("archive finalized despite error");
    let names: Vec<_> = reader.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["first.txt"]);
}
