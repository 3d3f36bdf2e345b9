//! Chinese lunisolar converter.
//!
//! Table-driven: one packed `u32` per year covering 1900..=2100. Low 4
//! bits hold the leap-month number (0 = none), bit 16 says whether that
//! leap month has 30 days, and bits 15..4 are 30-day flags for ordinary
//! months 1..12. The epoch anchors lunisolar 1900-01-01 at Gregorian
//! 1900-01-31; everything else is day-offset arithmetic from there.
//!
//! Dates outside the table range fail as `InvalidDate`; a missing-year
//! lookup must never silently produce a wrong result.

use chrono::{Duration, NaiveDate};

use crate::calendar::Converter;
use crate::date::{CalendarType, DateInfo, GregorianDate};
use crate::error::{CalendarError, CalendarResult};

const FIRST_YEAR: i32 = 1900;
const LAST_YEAR: i32 = 2100;

/// Packed month-length data for 1900..=2100.
#[rustfmt::skip]
const YEAR_INFO: [u32; 201] = [
    0x04bd8, 0x04ae0, 0x0a570, 0x054d5, 0x0d260, 0x0d950, 0x16554, 0x056a0, 0x09ad0, 0x055d2, // 1900
    0x04ae0, 0x0a5b6, 0x0a4d0, 0x0d250, 0x1d255, 0x0b540, 0x0d6a0, 0x0ada2, 0x095b0, 0x14977, // 1910
    0x04970, 0x0a4b0, 0x0b4b5, 0x06a50, 0x06d40, 0x1ab54, 0x02b60, 0x09570, 0x052f2, 0x04970, // 1920
    0x06566, 0x0d4a0, 0x0ea50, 0x06e95, 0x05ad0, 0x02b60, 0x186e3, 0x092e0, 0x1c8d7, 0x0c950, // 1930
    0x0d4a0, 0x1d8a6, 0x0b550, 0x056a0, 0x1a5b4, 0x025d0, 0x092d0, 0x0d2b2, 0x0a950, 0x0b557, // 1940
    0x06ca0, 0x0b550, 0x15355, 0x04da0, 0x0a5b0, 0x14573, 0x052b0, 0x0a9a8, 0x0e950, 0x06aa0, // 1950
    0x0aea6, 0x0ab50, 0x04b60, 0x0aae4, 0x0a570, 0x05260, 0x0f263, 0x0d950, 0x05b57, 0x056a0, // 1960
    0x096d0, 0x04dd5, 0x04ad0, 0x0a4d0, 0x0d4d4, 0x0d250, 0x0d558, 0x0b540, 0x0b5a0, 0x195a6, // 1970
    0x095b0, 0x049b0, 0x0a974, 0x0a4b0, 0x0b27a, 0x06a50, 0x06d40, 0x0af46, 0x0ab60, 0x09570, // 1980
    0x04af5, 0x04970, 0x064b0, 0x074a3, 0x0ea50, 0x06b58, 0x055c0, 0x0ab60, 0x096d5, 0x092e0, // 1990
    0x0c960, 0x0d954, 0x0d4a0, 0x0da50, 0x07552, 0x056a0, 0x0abb7, 0x025d0, 0x092d0, 0x0cab5, // 2000
    0x0a950, 0x0b4a0, 0x0baa4, 0x0ad50, 0x055d9, 0x04ba0, 0x0a5b0, 0x15176, 0x052b0, 0x0a930, // 2010
    0x07954, 0x06aa0, 0x0ad50, 0x05b52, 0x04b60, 0x0a6e6, 0x0a4e0, 0x0d260, 0x0ea65, 0x0d530, // 2020
    0x05aa0, 0x076a3, 0x096d0, 0x04afb, 0x04ad0, 0x0a4d0, 0x1d0b6, 0x0d250, 0x0d520, 0x0dd45, // 2030
    0x0b5a0, 0x056d0, 0x055b2, 0x049b0, 0x0a577, 0x0a4b0, 0x0aa50, 0x1b255, 0x06d20, 0x0ada0, // 2040
    0x14b63, 0x09370, 0x049f8, 0x04970, 0x064b0, 0x168a6, 0x0ea50, 0x06b20, 0x1a6c4, 0x0aae0, // 2050
    0x0a2e0, 0x0d2e3, 0x0c960, 0x0d557, 0x0d4a0, 0x0da50, 0x05d55, 0x056a0, 0x0a6d0, 0x055d4, // 2060
    0x052d0, 0x0a9b8, 0x0a950, 0x0b4a0, 0x0b6a6, 0x0ad50, 0x055a0, 0x0aba4, 0x0a5b0, 0x052b0, // 2070
    0x0b273, 0x06930, 0x07337, 0x06aa0, 0x0ad50, 0x14b55, 0x04b60, 0x0a570, 0x054e4, 0x0d160, // 2080
    0x0e968, 0x0d520, 0x0daa0, 0x16aa6, 0x056d0, 0x04ae0, 0x0a9d4, 0x0a2d0, 0x0d150, 0x0f252, // 2090
    0x0d520,                                                                                  // 2100
];

/// Lunisolar 1900-01-01 on the Gregorian timeline.
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 31).expect("epoch is a valid date")
}

fn year_info(year: i32) -> CalendarResult<u32> {
    if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
        return Err(CalendarError::InvalidDate(format!(
            "lunisolar year {} outside supported range {}-{}",
            year, FIRST_YEAR, LAST_YEAR
        )));
    }
    Ok(YEAR_INFO[(year - FIRST_YEAR) as usize])
}

#[derive(Debug, Default)]
pub struct LunarConverter;

impl LunarConverter {
    pub fn new() -> Self {
        LunarConverter
    }

    /// Leap month number of `year`, 0 when the year has none.
    pub fn leap_month(year: i32) -> CalendarResult<u32> {
        Ok(year_info(year)? & 0xf)
    }

    /// Days in the leap month of `year`, 0 when the year has none.
    pub fn leap_days(year: i32) -> CalendarResult<u32> {
        let info = year_info(year)?;
        if info & 0xf == 0 {
            Ok(0)
        } else if info & 0x10000 != 0 {
            Ok(30)
        } else {
            Ok(29)
        }
    }

    /// Days in ordinary month `month` (1..=12) of `year`.
    pub fn month_days(year: i32, month: u32) -> CalendarResult<u32> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidDate(format!(
                "lunisolar month {} out of range",
                month
            )));
        }
        if year_info(year)? & (0x10000 >> month) != 0 {
            Ok(30)
        } else {
            Ok(29)
        }
    }

    /// Total days in lunisolar `year`, leap month included.
    pub fn year_days(year: i32) -> CalendarResult<u32> {
        let mut days = Self::leap_days(year)?;
        for month in 1..=12 {
            days += Self::month_days(year, month)?;
        }
        Ok(days)
    }

    fn validate(date: &DateInfo) -> CalendarResult<()> {
        date.validate()?;
        if date.day > 30 {
            return Err(CalendarError::InvalidDate(format!(
                "day {} out of range (lunisolar months have at most 30 days)",
                date.day
            )));
        }
        Ok(())
    }

    /// Days in the month `date` refers to, resolving the leap marker.
    /// Referring to a leap month the year does not have is invalid.
    fn target_month_days(date: &DateInfo) -> CalendarResult<u32> {
        let month = date.abs_month();
        if date.is_leap_month() {
            if Self::leap_month(date.year)? != month {
                return Err(CalendarError::InvalidDate(format!(
                    "year {} has no leap month {}",
                    date.year, month
                )));
            }
            Self::leap_days(date.year)
        } else {
            Self::month_days(date.year, month)
        }
    }
}

impl Converter for LunarConverter {
    fn calendar_type(&self) -> CalendarType {
        CalendarType::Lunar
    }

    /// Day-offset walk forward from the epoch. Days beyond the target
    /// month's length clamp to its last day (short-month overflow policy).
    fn to_gregorian(&self, date: &DateInfo) -> CalendarResult<GregorianDate> {
        Self::validate(date)?;
        if date.year == 0 {
            return Err(CalendarError::InvalidDate(
                "cannot convert a yearless date".into(),
            ));
        }

        let mut offset: i64 = 0;
        for y in FIRST_YEAR..date.year {
            offset += Self::year_days(y)? as i64;
        }

        let month = date.abs_month();
        let leap = Self::leap_month(date.year)?;
        for m in 1..month {
            offset += Self::month_days(date.year, m)? as i64;
            if m == leap {
                offset += Self::leap_days(date.year)? as i64;
            }
        }
        // The leap month follows its same-numbered ordinary month.
        if date.is_leap_month() {
            offset += Self::month_days(date.year, month)? as i64;
        }

        let day = (date.day as u32).min(Self::target_month_days(date)?);
        offset += (day - 1) as i64;

        Ok(GregorianDate::from_naive(epoch() + Duration::days(offset)))
    }

    fn from_gregorian(&self, date: &GregorianDate) -> CalendarResult<DateInfo> {
        let naive = date.to_naive()?;
        let mut offset = (naive - epoch()).num_days();
        if offset < 0 {
            return Err(CalendarError::InvalidDate(format!(
                "{} predates the supported lunisolar range",
                date
            )));
        }

        let mut year = FIRST_YEAR;
        loop {
            if year > LAST_YEAR {
                return Err(CalendarError::InvalidDate(format!(
                    "{} is beyond the supported lunisolar range",
                    date
                )));
            }
            let days = Self::year_days(year)? as i64;
            if offset < days {
                break;
            }
            offset -= days;
            year += 1;
        }

        let leap = Self::leap_month(year)?;
        for m in 1..=12 {
            let days = Self::month_days(year, m)? as i64;
            if offset < days {
                return Ok(DateInfo::new(offset as i32 + 1, m as i32, year));
            }
            offset -= days;
            if m == leap {
                let days = Self::leap_days(year)? as i64;
                if offset < days {
                    return Ok(DateInfo::new(offset as i32 + 1, -(m as i32), year));
                }
                offset -= days;
            }
        }

        Err(CalendarError::InvalidDate(format!(
            "day offset overran lunisolar year {}",
            year
        )))
    }

    /// Two-year scan. Annual recurrences cannot skip more than one
    /// lunisolar year relative to a Gregorian reference, so scanning the
    /// reference year and the next is sufficient.
    fn next_occurrence(
        &self,
        original: &DateInfo,
        after: NaiveDate,
    ) -> CalendarResult<GregorianDate> {
        Self::validate(original)?;

        let start_year = self.from_gregorian(&GregorianDate::from_naive(after))?.year;
        let month = original.abs_month();

        for year in [start_year, start_year + 1] {
            // Leap-month originals prefer the candidate year's leap month
            // when the number matches, else fall back to the ordinary one.
            let month_signed = if original.is_leap_month() && Self::leap_month(year)? == month {
                -(month as i32)
            } else {
                month as i32
            };

            let candidate = DateInfo::new(original.day, month_signed, year);
            let gregorian = self.to_gregorian(&candidate)?;
            if gregorian.to_naive()? > after {
                return Ok(gregorian);
            }
        }

        Err(CalendarError::NoRecurrenceFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn table_lookups() {
        assert_eq!(LunarConverter::leap_month(2023).unwrap(), 2);
        assert_eq!(LunarConverter::leap_month(2025).unwrap(), 6);
        assert_eq!(LunarConverter::leap_month(2026).unwrap(), 0);
        assert_eq!(LunarConverter::leap_days(2026).unwrap(), 0);
        assert_eq!(LunarConverter::month_days(2025, 1).unwrap(), 30);
        assert_eq!(LunarConverter::month_days(2025, 2).unwrap(), 29);
        // A leap year runs long, a common year close to 354.
        assert_eq!(LunarConverter::year_days(2025).unwrap(), 384);
        assert_eq!(LunarConverter::year_days(2026).unwrap(), 354);
    }

    #[test]
    fn new_year_anchors() {
        let c = LunarConverter::new();
        assert_eq!(
            c.to_gregorian(&DateInfo::new(1, 1, 1900)).unwrap(),
            GregorianDate::new(1900, 1, 31)
        );
        assert_eq!(
            c.to_gregorian(&DateInfo::new(1, 1, 2025)).unwrap(),
            GregorianDate::new(2025, 1, 29)
        );
        assert_eq!(
            c.to_gregorian(&DateInfo::new(1, 1, 2026)).unwrap(),
            GregorianDate::new(2026, 2, 17)
        );
        assert_eq!(
            c.to_gregorian(&DateInfo::new(1, 1, 2027)).unwrap(),
            GregorianDate::new(2027, 2, 6)
        );
    }

    #[test]
    fn leap_month_conversion() {
        let c = LunarConverter::new();
        // 2023's leap second month started on March 22.
        assert_eq!(
            c.to_gregorian(&DateInfo::new(1, -2, 2023)).unwrap(),
            GregorianDate::new(2023, 3, 22)
        );
        assert_eq!(
            c.from_gregorian(&GregorianDate::new(2023, 3, 22)).unwrap(),
            DateInfo::new(1, -2, 2023)
        );
        // A leap month the year does not have is invalid.
        assert!(c.to_gregorian(&DateInfo::new(1, -3, 2023)).is_err());
    }

    #[test]
    fn round_trip_across_table_range() {
        let c = LunarConverter::new();
        let mut day = date(1901, 1, 1);
        let end = date(2099, 12, 31);
        while day <= end {
            let lunar = c.from_gregorian(&GregorianDate::from_naive(day)).unwrap();
            let back = c.to_gregorian(&lunar).unwrap();
            assert_eq!(back.to_naive().unwrap(), day, "round trip failed for {day}");
            day += Duration::days(97);
        }
    }

    #[test]
    fn new_year_same_year() {
        let c = LunarConverter::new();
        let next = c
            .next_occurrence(&DateInfo::new(15, 1, 0), date(2026, 1, 1))
            .unwrap();
        assert_eq!(next, GregorianDate::new(2026, 3, 3));
    }

    #[test]
    fn mid_autumn_rolls_into_next_gregorian_year() {
        let c = LunarConverter::new();
        let next = c
            .next_occurrence(&DateInfo::new(15, 8, 0), date(2026, 11, 1))
            .unwrap();
        assert_eq!(next, GregorianDate::new(2027, 9, 15));
    }

    #[test]
    fn strict_future_on_the_day_itself() {
        let c = LunarConverter::new();
        // Mid-autumn 2026 falls on September 25.
        let next = c
            .next_occurrence(&DateInfo::new(15, 8, 0), date(2026, 9, 25))
            .unwrap();
        assert_eq!(next, GregorianDate::new(2027, 9, 15));
        let next = c
            .next_occurrence(&DateInfo::new(15, 8, 0), date(2026, 9, 24))
            .unwrap();
        assert_eq!(next, GregorianDate::new(2026, 9, 25));
    }

    #[test]
    fn short_month_overflow_clamps() {
        let c = LunarConverter::new();
        // Month 2 of 2025 has 29 days; day 30 clamps to the 29th.
        let g = c.to_gregorian(&DateInfo::new(30, 2, 2025)).unwrap();
        assert_eq!(g, GregorianDate::new(2025, 3, 28));
        assert_eq!(
            c.from_gregorian(&g).unwrap(),
            DateInfo::new(29, 2, 2025)
        );
    }

    #[test]
    fn leap_original_prefers_leap_month_when_present() {
        let c = LunarConverter::new();
        // 2025 has a leap sixth month; day 15 of it is August 8.
        let next = c
            .next_occurrence(&DateInfo::new(15, -6, 0), date(2025, 1, 1))
            .unwrap();
        assert_eq!(next, GregorianDate::new(2025, 8, 8));
    }

    #[test]
    fn leap_original_falls_back_to_ordinary_month() {
        let c = LunarConverter::new();
        // 2026 has no leap month, so a leap-sixth-month original lands on
        // the ordinary sixth month.
        let next = c
            .next_occurrence(&DateInfo::new(15, -6, 0), date(2025, 12, 31))
            .unwrap();
        assert_eq!(next, GregorianDate::new(2026, 7, 28));
        assert_eq!(
            c.from_gregorian(&next).unwrap(),
            DateInfo::new(15, 6, 2026)
        );
    }

    #[test]
    fn out_of_range_years_are_invalid() {
        let c = LunarConverter::new();
        assert!(matches!(
            c.to_gregorian(&DateInfo::new(1, 1, 1899)),
            Err(CalendarError::InvalidDate(_))
        ));
        assert!(matches!(
            c.to_gregorian(&DateInfo::new(1, 1, 2101)),
            Err(CalendarError::InvalidDate(_))
        ));
        assert!(matches!(
            c.from_gregorian(&GregorianDate::new(1900, 1, 30)),
            Err(CalendarError::InvalidDate(_))
        ));
        // A scan that would need a year past the table edge fails loudly
        // instead of returning a wrong date.
        assert!(matches!(
            c.next_occurrence(&DateInfo::new(1, 1, 0), date(2100, 12, 1)),
            Err(CalendarError::InvalidDate(_))
        ));
    }

    #[test]
    fn invalid_dates_rejected() {
        let c = LunarConverter::new();
        assert!(c.to_gregorian(&DateInfo::new(31, 1, 2025)).is_err());
        assert!(c.to_gregorian(&DateInfo::new(15, 13, 2025)).is_err());
        assert!(c
            .next_occurrence(&DateInfo::new(0, 1, 0), date(2025, 1, 1))
            .is_err());
    }
}
