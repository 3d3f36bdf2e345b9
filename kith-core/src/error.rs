//! Error types for the calendar engine.

use thiserror::Error;

use crate::date::CalendarType;

/// Errors that can occur during calendar conversion or recurrence resolution.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Unsupported calendar: {0}")]
    UnsupportedCalendar(CalendarType),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The recurrence scan exhausted its candidates without producing a
    /// future date. Well-formed input never hits this; treat it as a bug
    /// in the stored record or the conversion table.
    #[error("No future occurrence found")]
    NoRecurrenceFound,
}

/// Result type alias for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
