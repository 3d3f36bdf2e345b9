//! Calendar converters.
//!
//! Each supported calendar system implements [`Converter`], the uniform
//! contract the registry and resolver work against. Converters are built
//! once at startup and live for the process lifetime; they hold only
//! immutable data.

pub mod gregorian;
pub mod lunar;

use chrono::NaiveDate;

use crate::date::{CalendarType, DateInfo, GregorianDate};
use crate::error::CalendarResult;

pub use gregorian::GregorianConverter;
pub use lunar::LunarConverter;

/// Conversion contract implemented by every registered calendar system.
///
/// Round-trip law: for every date in the converter's valid domain,
/// `from_gregorian(to_gregorian(d)) == d`.
pub trait Converter: Send + Sync {
    /// The calendar system this converter handles. Must be stable across
    /// calls; the registry keys on it.
    fn calendar_type(&self) -> CalendarType;

    /// Convert a date in this calendar to the Gregorian timeline.
    fn to_gregorian(&self, date: &DateInfo) -> CalendarResult<GregorianDate>;

    /// Convert a Gregorian date back into this calendar.
    fn from_gregorian(&self, date: &GregorianDate) -> CalendarResult<DateInfo>;

    /// The next Gregorian date strictly after `after` (day granular) on
    /// which the yearly recurrence of `original` falls. The event for the
    /// same calendar day as `after` counts as already past.
    fn next_occurrence(&self, original: &DateInfo, after: NaiveDate)
        -> CalendarResult<GregorianDate>;
}
