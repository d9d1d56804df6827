use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::NarrativeStep;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Fraction of the narrative span added on each side of the derived window.
const PAD_DIVISOR: i32 = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("narrative has no steps")]
    EmptyNarrative,
    #[error("step {index} has an unparseable timestamp: {value:?}")]
    InvalidTimestamp { index: usize, value: String },
    #[error("padded window around {start} .. {end} is outside the representable range")]
    OutOfRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Window applied when all filters are reset.
    pub fn default_window() -> Self {
        let at = |d: u32| {
            NaiveDate::from_ymd_opt(2014, 9, d)
                .and_then(|date| date.and_hms_opt(12, 0, 0))
                .unwrap_or_default()
        };
        Self::new(at(25), at(28))
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::default_window()
    }
}

/// Parses the timestamp formats found in event and narrative data. Offsets
/// are normalised to UTC and dropped.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(t) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Some(t);
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(t);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.naive_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Window covering every step of a narrative, padded on both sides by a
/// twentieth of the un-padded span.
pub fn narrative_range(steps: &[NarrativeStep]) -> Result<TimeRange, RangeError> {
    let mut instants = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let t = parse_timestamp(&step.timestamp).ok_or_else(|| RangeError::InvalidTimestamp {
            index,
            value: step.timestamp.clone(),
        })?;
        instants.push(t);
    }

    let min = instants.iter().min().copied().ok_or(RangeError::EmptyNarrative)?;
    let max = instants.iter().max().copied().ok_or(RangeError::EmptyNarrative)?;

    let pad = max.signed_duration_since(min) / PAD_DIVISOR;
    let out_of_range = || RangeError::OutOfRange {
        start: min,
        end: max,
    };
    let start = min.checked_sub_signed(pad).ok_or_else(out_of_range)?;
    let end = max.checked_add_signed(pad).ok_or_else(out_of_range)?;
    Ok(TimeRange::new(start, end))
}
