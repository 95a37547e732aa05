//! Fuzz target for archive reading.
//!
//! `repzip list` opens archives it did not write; arbitrary bytes must
//! produce an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use repzip_core::ArchiveReader;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut reader) = ArchiveReader::from_bytes(data.to_vec()) {
        let _ = reader.timestamps();
        let _ = reader.verify_all();
    }
});
