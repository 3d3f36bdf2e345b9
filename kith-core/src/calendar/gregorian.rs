//! Gregorian converter.
//!
//! Conversion is near-identity (validation only); the interesting part is
//! the yearly-recurrence step in `next_occurrence`.

use chrono::{Datelike, NaiveDate};

use crate::calendar::Converter;
use crate::date::{gregorian_month_days, CalendarType, DateInfo, GregorianDate};
use crate::error::{CalendarError, CalendarResult};

#[derive(Debug, Default)]
pub struct GregorianConverter;

impl GregorianConverter {
    pub fn new() -> Self {
        GregorianConverter
    }

    /// Candidate occurrence of `(month, day)` in `year`, clamped to the
    /// last valid day of the month. Feb 29 in a non-leap year becomes
    /// Feb 28; this is the documented policy.
    fn candidate(year: i32, month: u32, day: u32) -> GregorianDate {
        let clamped = day.min(gregorian_month_days(year, month));
        GregorianDate::new(year, month, clamped)
    }
}

impl Converter for GregorianConverter {
    fn calendar_type(&self) -> CalendarType {
        CalendarType::Gregorian
    }

    fn to_gregorian(&self, date: &DateInfo) -> CalendarResult<GregorianDate> {
        date.validate()?;
        if date.month < 0 {
            return Err(CalendarError::InvalidDate(
                "Gregorian dates have no leap months".into(),
            ));
        }
        if date.year == 0 {
            return Err(CalendarError::InvalidDate(
                "cannot convert a yearless date".into(),
            ));
        }
        let g = GregorianDate::new(date.year, date.month as u32, date.day as u32);
        g.to_naive()?; // exact conversion, no clamping
        Ok(g)
    }

    fn from_gregorian(&self, date: &GregorianDate) -> CalendarResult<DateInfo> {
        date.to_naive()?;
        Ok(DateInfo::new(date.day as i32, date.month as i32, date.year))
    }

    fn next_occurrence(
        &self,
        original: &DateInfo,
        after: NaiveDate,
    ) -> CalendarResult<GregorianDate> {
        original.validate()?;
        if original.month < 0 {
            return Err(CalendarError::InvalidDate(
                "Gregorian dates have no leap months".into(),
            ));
        }
        let (month, day) = (original.month as u32, original.day as u32);

        let this_year = Self::candidate(after.year(), month, day);
        if this_year.to_naive()? > after {
            return Ok(this_year);
        }
        Ok(Self::candidate(after.year() + 1, month, day))
    }
}
