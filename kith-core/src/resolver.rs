//! Yearly-recurrence resolution.
//!
//! The resolver is the entry point the server and background scanner use:
//! given a date as originally recorded, the calendar it was recorded in,
//! and a reference day, it returns the next Gregorian occurrence. It is a
//! pure function of its inputs and the registry contents.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::date::{CalendarType, DateInfo, GregorianDate};
use crate::error::{CalendarError, CalendarResult};
use crate::registry::CalendarRegistry;

#[derive(Clone)]
pub struct RecurrenceResolver {
    registry: Arc<CalendarRegistry>,
}

impl RecurrenceResolver {
    pub fn new(registry: Arc<CalendarRegistry>) -> Self {
        RecurrenceResolver { registry }
    }

    fn converter(&self, calendar_type: CalendarType) -> CalendarResult<&dyn crate::Converter> {
        self.registry
            .get(calendar_type)
            .ok_or(CalendarError::UnsupportedCalendar(calendar_type))
    }

    /// Next Gregorian date strictly after `after` on which the yearly
    /// recurrence of `original` falls.
    pub fn next_occurrence(
        &self,
        original: &DateInfo,
        calendar_type: CalendarType,
        after: NaiveDate,
    ) -> CalendarResult<GregorianDate> {
        original.validate()?;
        self.converter(calendar_type)?.next_occurrence(original, after)
    }

    pub fn to_gregorian(
        &self,
        date: &DateInfo,
        calendar_type: CalendarType,
    ) -> CalendarResult<GregorianDate> {
        self.converter(calendar_type)?.to_gregorian(date)
    }

    pub fn from_gregorian(
        &self,
        date: &GregorianDate,
        calendar_type: CalendarType,
    ) -> CalendarResult<DateInfo> {
        self.converter(calendar_type)?.from_gregorian(date)
    }
}

impl Default for RecurrenceResolver {
    fn default() -> Self {
        RecurrenceResolver::new(Arc::new(CalendarRegistry::default()))
    }
}
