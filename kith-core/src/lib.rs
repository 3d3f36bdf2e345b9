//! Core calendar engine for the kith contacts vault.
//!
//! This crate provides the pieces shared by the server and any future
//! background scanner:
//! - `date`: value types for dates in user-facing calendars
//! - `calendar`: converters between those calendars and the Gregorian timeline
//! - `registry`: the table of supported calendar systems
//! - `resolver`: yearly-recurrence resolution for reminders and important dates

pub mod calendar;
pub mod date;
pub mod error;
pub mod registry;
pub mod resolver;

pub use calendar::Converter;
pub use date::{CalendarType, DateInfo, GregorianDate};
pub use error::{CalendarError, CalendarResult};
pub use registry::CalendarRegistry;
pub use resolver::RecurrenceResolver;
