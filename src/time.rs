//! # CF Time Decoding
//!
//! Converts numeric time coordinates such as `"minutes since 2015-02-01 03:00:00"`
//! into calendar timestamps. Only the standard (proleptic) Gregorian calendar
//! is supported, which covers GLDAS, ERA5 and most reanalysis products.

use crate::error::{PointError, PointResult};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Time units for datetime conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Milliseconds,
    Microseconds,
}

impl TimeUnit {
    /// Convert the time unit to a multiplier for seconds
    pub fn to_seconds_multiplier(&self) -> f64 {
        match self {
            TimeUnit::Microseconds => 1e-6,
            TimeUnit::Milliseconds => 1e-3,
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "microseconds" | "microsecond" | "us" => Some(TimeUnit::Microseconds),
            "milliseconds" | "millisecond" | "ms" => Some(TimeUnit::Milliseconds),
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(TimeUnit::Hours),
            "days" | "day" | "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }
}

/// A parsed CF `units` attribute: a unit and its reference instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub reference: NaiveDateTime,
}

const REFERENCE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl CfTimeUnits {
    /// Parses `"<unit> since <reference>"`.
    ///
    /// The reference may be a date or a date-time, with an optional `T`
    /// separator and an optional trailing `Z` / `UTC`.
    pub fn parse(units: &str) -> PointResult<Self> {
        let invalid = || PointError::InvalidTimeUnits(units.to_string());

        let mut parts = units.trim().splitn(2, " since ");
        let unit_str = parts.next().ok_or_else(invalid)?;
        let reference_str = parts.next().ok_or_else(invalid)?;

        let unit = TimeUnit::parse(unit_str.trim()).ok_or_else(invalid)?;
        let reference = parse_reference(reference_str).ok_or_else(invalid)?;

        Ok(CfTimeUnits { unit, reference })
    }

    /// Converts one numeric offset into a timestamp, rounded to the millisecond.
    ///
    /// # Errors
    ///
    /// Returns [`PointError::InvalidTimeValue`] for non-finite offsets and for
    /// offsets whose timestamp falls outside the representable range, such as
    /// an unmasked fill value in the time coordinate.
    pub fn to_datetime(&self, value: f64) -> PointResult<NaiveDateTime> {
        let invalid = || PointError::InvalidTimeValue(value);

        let millis = (value * self.unit.to_seconds_multiplier() * 1000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return Err(invalid());
        }

        let offset = Duration::try_milliseconds(millis as i64).ok_or_else(invalid)?;
        self.reference
            .checked_add_signed(offset)
            .ok_or_else(invalid)
    }

    /// Decodes every offset, failing on the first one that has no timestamp.
    pub fn decode(&self, values: &[f64]) -> PointResult<Vec<NaiveDateTime>> {
        values.iter().map(|&v| self.to_datetime(v)).collect()
    }
}

fn parse_reference(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    let trimmed = trimmed
        .strip_suffix("UTC")
        .or_else(|| trimmed.strip_suffix('Z'))
        .unwrap_or(trimmed)
        .trim();

    for format in REFERENCE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    // Date-only references, e.g. "days since 2000-01-01"
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Rejects calendars that do not follow Gregorian day arithmetic.
pub fn check_calendar(calendar: Option<&str>) -> PointResult<()> {
    match calendar.map(|c| c.trim().to_lowercase()) {
        None => Ok(()),
        Some(c) if matches!(c.as_str(), "standard" | "gregorian" | "proleptic_gregorian" | "") => {
            Ok(())
        }
        Some(c) => Err(PointError::UnsupportedCalendar(c)),
    }
}
