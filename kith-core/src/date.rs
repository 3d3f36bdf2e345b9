//! Date value types.
//!
//! A `DateInfo` is a date as the user recorded it, in whichever calendar
//! they picked. A `GregorianDate` is the canonical representation used by
//! the scheduler and everything downstream. Converters map between the two.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};

/// Identifier for a supported calendar system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarType {
    Gregorian,
    Lunar,
}

impl CalendarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarType::Gregorian => "gregorian",
            CalendarType::Lunar => "lunar",
        }
    }
}

impl fmt::Display for CalendarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CalendarType {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gregorian" => Ok(CalendarType::Gregorian),
            "lunar" => Ok(CalendarType::Lunar),
            other => Err(CalendarError::InvalidDate(format!(
                "unknown calendar type '{other}'"
            ))),
        }
    }
}

/// A date expressed in some calendar system.
///
/// A negative `month` encodes a leap month (lunisolar calendars only);
/// the sign is the sole leap marker and `|month|` is the ordinary month
/// number. This signed representation is part of the wire contract, so it
/// is kept end-to-end; use [`DateInfo::abs_month`] and
/// [`DateInfo::is_leap_month`] instead of touching the sign directly.
///
/// `year == 0` means "annual recurrence without a known origin year":
/// only `(month, day)` participate in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInfo {
    pub day: i32,
    pub month: i32,
    pub year: i32,
}

impl DateInfo {
    pub fn new(day: i32, month: i32, year: i32) -> Self {
        DateInfo { day, month, year }
    }

    /// Whether this date falls in a leap (intercalary) month.
    pub fn is_leap_month(&self) -> bool {
        self.month < 0
    }

    /// The ordinary month number, ignoring the leap marker.
    pub fn abs_month(&self) -> u32 {
        self.month.unsigned_abs()
    }

    /// Range checks shared by all converters. Calendar-specific rules
    /// (month lengths, table coverage) are checked by the converter itself.
    pub fn validate(&self) -> CalendarResult<()> {
        if self.month == 0 || self.abs_month() > 12 {
            return Err(CalendarError::InvalidDate(format!(
                "month {} out of range (|month| must be 1-12)",
                self.month
            )));
        }
        if self.day < 1 || self.day > 31 {
            return Err(CalendarError::InvalidDate(format!(
                "day {} out of range (must be 1-31)",
                self.day
            )));
        }
        Ok(())
    }
}

/// A fully specified date on the proleptic Gregorian timeline.
///
/// Never uses the sign trick; this is the canonical external representation.
/// Ordered at day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GregorianDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl GregorianDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        GregorianDate { year, month, day }
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        GregorianDate {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn to_naive(self) -> CalendarResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            CalendarError::InvalidDate(format!(
                "{:04}-{:02}-{:02} is not a valid Gregorian date",
                self.year, self.month, self.day
            ))
        })
    }
}

impl fmt::Display for GregorianDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Number of days in a Gregorian month.
pub(crate) fn gregorian_month_days(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}
