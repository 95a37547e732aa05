//! Archive timestamp resolution.
//!
//! Every entry of a session carries the same timestamp. It is resolved once,
//! when the session is configured, with this precedence:
//!
//! 1. an explicit [`TimeOverride`] supplied by the caller,
//! 2. the `SOURCE_DATE_EPOCH` reproducibility convention (seconds since
//!    1970-01-01T00:00:00 UTC), passed in as a snapshot of the environment,
//! 3. the format floor, 1980-01-01T00:00:00.
//!
//! An explicit override short-circuits the environment entirely: the epoch
//! value is not parsed and produces no diagnostics. Malformed or
//! out-of-range epochs are recovered from locally and reported as
//! [`Diagnostic`]s; malformed overrides are fatal to the session.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::{ArchiveError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::convert::Infallible;
use std::str::FromStr;

/// Environment variable carrying the reproducible build timestamp.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// A whole-second UTC calendar timestamp inside the DOS date range.
///
/// Field order matters: the derived ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectiveTimestamp {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl EffectiveTimestamp {
    /// Earliest value the ZIP per-entry timestamp can encode.
    pub const FLOOR: Self = Self {
        year: 1980,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Latest value the ZIP per-entry timestamp can encode (2-second resolution).
    pub const CEILING: Self = Self {
        year: 2107,
        month: 12,
        day: 31,
        hour: 23,
        minute: 59,
        second: 58,
    };

    /// Convert a calendar value, returning `None` outside `FLOOR..=CEILING`.
    ///
    /// Sub-second precision is dropped and odd seconds are rounded down,
    /// since the archive stores seconds in 2-second steps.
    pub fn from_naive(dt: NaiveDateTime) -> Option<Self> {
        let year = u16::try_from(dt.year()).ok()?;
        let ts = Self {
            year,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8 & !1,
        };
        (Self::FLOOR..=Self::CEILING).contains(&ts).then_some(ts)
    }

    /// Read back a timestamp stored in an archive entry.
    pub fn from_zip(dt: zip::DateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }

    /// Encode for the archive writer.
    pub fn to_zip(&self) -> Result<zip::DateTime> {
        zip::DateTime::from_date_and_time(
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
        .map_err(|_| ArchiveError::InvalidTimeSpec(format!("{self} is not a valid DOS timestamp")))
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// The six calendar fields, year first.
    pub fn as_tuple(&self) -> (u16, u8, u8, u8, u8, u8) {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
    }
}

impl Default for EffectiveTimestamp {
    fn default() -> Self {
        Self::FLOOR
    }
}

impl std::fmt::Display for EffectiveTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Serialize for EffectiveTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A caller-supplied timestamp for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeOverride {
    /// `(year, month, day, hour, minute, second)`; missing month/day default
    /// to 1, missing time fields to 0, fields after the sixth are ignored.
    Fields(Vec<i64>),
    /// A calendar date and time; sub-second precision is dropped.
    DateTime(NaiveDateTime),
    /// A calendar date, taken at midnight.
    Date(NaiveDate),
    /// An ISO 8601 calendar date (`YYYY-MM-DD`), taken at midnight.
    Text(String),
}

impl TimeOverride {
    /// Normalize into a timestamp, failing with `InvalidTimeSpec`.
    pub fn to_timestamp(&self) -> Result<EffectiveTimestamp> {
        let naive = match self {
            TimeOverride::Fields(fields) => naive_from_fields(fields)?,
            TimeOverride::DateTime(dt) => *dt,
            TimeOverride::Date(date) => date.and_time(NaiveTime::MIN),
            TimeOverride::Text(text) => parse_iso_date(text)?.and_time(NaiveTime::MIN),
        };

        EffectiveTimestamp::from_naive(naive).ok_or_else(|| {
            ArchiveError::InvalidTimeSpec(format!(
                "{} is outside the archive range {}..={}",
                naive.format("%Y-%m-%dT%H:%M:%S"),
                EffectiveTimestamp::FLOOR,
                EffectiveTimestamp::CEILING
            ))
        })
    }
}

impl From<Vec<i64>> for TimeOverride {
    fn from(fields: Vec<i64>) -> Self {
        TimeOverride::Fields(fields)
    }
}

impl From<&[i64]> for TimeOverride {
    fn from(fields: &[i64]) -> Self {
        TimeOverride::Fields(fields.to_vec())
    }
}

impl From<NaiveDateTime> for TimeOverride {
    fn from(dt: NaiveDateTime) -> Self {
        TimeOverride::DateTime(dt)
    }
}

impl From<NaiveDate> for TimeOverride {
    fn from(date: NaiveDate) -> Self {
        TimeOverride::Date(date)
    }
}

impl From<&str> for TimeOverride {
    fn from(text: &str) -> Self {
        TimeOverride::Text(text.to_string())
    }
}

impl From<String> for TimeOverride {
    fn from(text: String) -> Self {
        TimeOverride::Text(text)
    }
}

/// Comma-separated integers become [`TimeOverride::Fields`]; anything else
/// is kept as text and validated when the session is configured.
impl FromStr for TimeOverride {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let fields: std::result::Result<Vec<i64>, _> =
            s.split(',').map(|part| part.trim().parse::<i64>()).collect();
        Ok(match fields {
            Ok(fields) => TimeOverride::Fields(fields),
            Err(_) => TimeOverride::Text(s.to_string()),
        })
    }
}

fn naive_from_fields(fields: &[i64]) -> Result<NaiveDateTime> {
    if fields.is_empty() {
        return Err(ArchiveError::InvalidTimeSpec(
            "time field list is empty".to_string(),
        ));
    }

    let mut full = [0i64, 1, 1, 0, 0, 0];
    for (slot, value) in full.iter_mut().zip(fields.iter()) {
        *slot = *value;
    }
    let [year, month, day, hour, minute, second] = full;

    let invalid = || {
        ArchiveError::InvalidTimeSpec(format!(
            "({year}, {month}, {day}, {hour}, {minute}, {second}) is not a valid date and time"
        ))
    };

    let year = i32::try_from(year).map_err(|_| invalid())?;
    let [month, day, hour, minute, second] = [month, day, hour, minute, second]
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX));

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
    Ok(NaiveDateTime::new(date, time))
}

fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    let invalid = || ArchiveError::InvalidTimeSpec(format!("'{text}' is not an ISO date (YYYY-MM-DD)"));

    let bytes = text.as_bytes();
    let shaped = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    if !shaped {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid())
}

/// Where the session timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    Explicit,
    Environment,
    Default,
}

impl std::fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampSource::Explicit => write!(f, "explicit override"),
            TimestampSource::Environment => write!(f, "{}", SOURCE_DATE_EPOCH),
            TimestampSource::Default => write!(f, "format floor"),
        }
    }
}

/// Outcome of timestamp resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub timestamp: EffectiveTimestamp,
    pub source: TimestampSource,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve the session timestamp from an explicit override and a snapshot
/// of the epoch environment value.
pub fn resolve(explicit: Option<&TimeOverride>, epoch: Option<&str>) -> Result<Resolution> {
    if let Some(explicit) = explicit {
        return Ok(Resolution {
            timestamp: explicit.to_timestamp()?,
            source: TimestampSource::Explicit,
            diagnostics: Vec::new(),
        });
    }

    let Some(raw) = epoch else {
        return Ok(Resolution {
            timestamp: EffectiveTimestamp::FLOOR,
            source: TimestampSource::Default,
            diagnostics: Vec::new(),
        });
    };

    let (timestamp, diagnostic) = resolve_epoch(raw);
    let source = match &diagnostic {
        Some(d) if d.kind == DiagnosticKind::UnparseableEpoch => TimestampSource::Default,
        _ => TimestampSource::Environment,
    };

    Ok(Resolution {
        timestamp,
        source,
        diagnostics: diagnostic.into_iter().collect(),
    })
}

/// Interpret an epoch-seconds value, clamping into the archive range.
pub fn resolve_epoch(raw: &str) -> (EffectiveTimestamp, Option<Diagnostic>) {
    let floor = EffectiveTimestamp::FLOOR;
    let ceiling = EffectiveTimestamp::CEILING;

    let seconds = match raw.trim().parse::<i64>() {
        Ok(seconds) => seconds,
        Err(_) => {
            return (
                floor,
                Some(Diagnostic::error(
                    DiagnosticKind::UnparseableEpoch,
                    format!("{SOURCE_DATE_EPOCH}={raw:?} is not an integer; using {floor}"),
                )),
            )
        }
    };

    let below = || {
        Diagnostic::warning(
            DiagnosticKind::EpochBelowFloor,
            format!("{SOURCE_DATE_EPOCH}={seconds} is before {floor}; clamping to {floor}"),
        )
    };
    let above = || {
        Diagnostic::warning(
            DiagnosticKind::EpochAboveCeiling,
            format!("{SOURCE_DATE_EPOCH}={seconds} is after {ceiling}; clamping to {ceiling}"),
        )
    };

    match DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc()) {
        Some(candidate) if candidate.year() < i32::from(floor.year()) => (floor, Some(below())),
        Some(candidate) => match EffectiveTimestamp::from_naive(candidate) {
            Some(ts) => (ts, None),
            None => (ceiling, Some(above())),
        },
        None if seconds < 0 => (floor, Some(below())),
        None => (ceiling, Some(above())),
    }
}
