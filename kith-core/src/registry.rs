//! Registry of supported calendar systems.

use std::collections::HashMap;

use crate::calendar::{Converter, GregorianConverter, LunarConverter};
use crate::date::CalendarType;

/// Table mapping a calendar type to its converter.
///
/// Built once during startup and effectively immutable afterwards; the
/// resolver may hold converter references for the process lifetime.
/// Registering twice under the same type overwrites deterministically
/// (last write wins) and is only expected from one-time initialization.
pub struct CalendarRegistry {
    converters: HashMap<CalendarType, Box<dyn Converter>>,
}

impl CalendarRegistry {
    /// An empty registry. Tests use this to install stub converters.
    pub fn empty() -> Self {
        CalendarRegistry {
            converters: HashMap::new(),
        }
    }

    /// Install a converter under the type it reports.
    pub fn register(&mut self, converter: Box<dyn Converter>) {
        self.converters.insert(converter.calendar_type(), converter);
    }

    pub fn get(&self, calendar_type: CalendarType) -> Option<&dyn Converter> {
        self.converters.get(&calendar_type).map(|c| c.as_ref())
    }

    pub fn is_supported(&self, calendar_type: CalendarType) -> bool {
        self.converters.contains_key(&calendar_type)
    }

    pub fn supported_types(&self) -> Vec<CalendarType> {
        self.converters.keys().copied().collect()
    }
}

impl Default for CalendarRegistry {
    /// The production table: Gregorian plus the Chinese lunisolar calendar.
    fn default() -> Self {
        let mut registry = CalendarRegistry::empty();
        registry.register(Box::new(GregorianConverter::new()));
        registry.register(Box::new(LunarConverter::new()));
        registry
    }
}
