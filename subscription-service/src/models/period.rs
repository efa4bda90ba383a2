//! Calendar month used as the billing unit.
//!
//! A [`Period`] is a month and a year, written `MM-YYYY` (`"03-2025"`). It is
//! backed by the first day of that month so that ordering, storage as a SQL
//! `DATE` and conversion from [`NaiveDate`] all come for free.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static PERIOD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{2})-([0-9]{4})$").expect("Failed to compile period pattern"));

/// Reasons a `MM-YYYY` string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("'{0}' is not in MM-YYYY format")]
    InvalidFormat(String),

    #[error("'{0}' has a month outside 01-12")]
    InvalidMonth(String),
}

/// A calendar month. Ordered by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period(NaiveDate);

impl Period {
    /// Build a period from a month (1-12) and a year (0-9999).
    pub fn new(month: u32, year: i32) -> Result<Self, PeriodError> {
        if !(0..=9999).contains(&year) {
            return Err(PeriodError::InvalidFormat(format!("{:02}-{}", month, year)));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Period)
            .ok_or_else(|| PeriodError::InvalidMonth(format!("{:02}-{:04}", month, year)))
    }

    /// Parse the strict `MM-YYYY` form.
    pub fn parse(text: &str) -> Result<Self, PeriodError> {
        let captures = PERIOD_PATTERN
            .captures(text)
            .ok_or_else(|| PeriodError::InvalidFormat(text.to_string()))?;

        let month: u32 = captures[1]
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(text.to_string()))?;
        let year: i32 = captures[2]
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(text.to_string()))?;

        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Period)
            .ok_or_else(|| PeriodError::InvalidMonth(text.to_string()))
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// First calendar day of the month, the value stored in the database.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Raise `self` to `bound` if it falls before it.
    pub fn clip_lower(self, bound: Period) -> Period {
        if self < bound {
            bound
        } else {
            self
        }
    }

    /// Lower `self` to `bound` if it falls after it.
    pub fn clip_upper(self, bound: Period) -> Period {
        if self > bound {
            bound
        } else {
            self
        }
    }

    /// Number of months from `from` to `to`, counting both ends.
    ///
    /// Callers clip first so that `to >= from`; an inverted pair yields 0.
    pub fn inclusive_month_span(from: Period, to: Period) -> u64 {
        let span = i64::from(to.year() - from.year()) * 12
            + (i64::from(to.month()) - i64::from(from.month()))
            + 1;
        u64::try_from(span).unwrap_or(0)
    }
}

impl From<NaiveDate> for Period {
    /// Truncate a date to its month.
    fn from(date: NaiveDate) -> Self {
        Period(date.with_day(1).unwrap_or(date))
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse(s)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Period::parse(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(text: &str) -> Period {
        Period::parse(text).unwrap()
    }

    #[test]
    fn parses_valid_period() {
        let period = p("03-2025");
        assert_eq!(period.month(), 3);
        assert_eq!(period.year(), 2025);
        assert_eq!(period.to_string(), "03-2025");
    }

    #[test]
    fn rejects_wrong_shape() {
        for text in ["3-2025", "03-25", "2025-03", "03/2025", "", "03-2025 ", "ab-cdef"] {
            assert_eq!(
                Period::parse(text),
                Err(PeriodError::InvalidFormat(text.to_string())),
                "{text:?} should be rejected as a format error"
            );
        }
    }

    #[test]
    fn rejects_month_out_of_range() {
        assert_eq!(
            Period::parse("00-2025"),
            Err(PeriodError::InvalidMonth("00-2025".to_string()))
        );
        assert_eq!(
            Period::parse("13-2025"),
            Err(PeriodError::InvalidMonth("13-2025".to_string()))
        );
    }

    #[test]
    fn orders_by_year_then_month() {
        assert!(p("12-2024") < p("01-2025"));
        assert!(p("02-2025") > p("01-2025"));
        assert_eq!(p("05-2025").cmp(&p("05-2025")), std::cmp::Ordering::Equal);
    }

    #[test]
    fn clipping_bounds() {
        let window_start = p("01-2025");
        let window_end = p("03-2025");

        assert_eq!(p("11-2024").clip_lower(window_start), window_start);
        assert_eq!(p("02-2025").clip_lower(window_start), p("02-2025"));
        assert_eq!(p("06-2025").clip_upper(window_end), window_end);
        assert_eq!(p("02-2025").clip_upper(window_end), p("02-2025"));
    }

    #[test]
    fn month_span_is_inclusive() {
        assert_eq!(Period::inclusive_month_span(p("01-2025"), p("01-2025")), 1);
        assert_eq!(Period::inclusive_month_span(p("01-2025"), p("03-2025")), 3);
        assert_eq!(Period::inclusive_month_span(p("11-2024"), p("02-2025")), 4);
        assert_eq!(Period::inclusive_month_span(p("01-2020"), p("12-2024")), 60);
    }

    #[test]
    fn inverted_span_is_zero() {
        assert_eq!(Period::inclusive_month_span(p("03-2025"), p("01-2025")), 0);
    }

    #[test]
    fn truncates_dates_to_month() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 19).unwrap();
        let period = Period::from(date);
        assert_eq!(period, p("07-2025"));
        assert_eq!(period.first_day(), NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn new_validates_month() {
        assert_eq!(Period::new(7, 2025).unwrap(), p("07-2025"));
        assert!(matches!(Period::new(13, 2025), Err(PeriodError::InvalidMonth(_))));
        assert!(matches!(Period::new(1, 10_000), Err(PeriodError::InvalidFormat(_))));
    }

    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&p("09-2024")).unwrap();
        assert_eq!(json, "\"09-2024\"");

        let parsed: Period = serde_json::from_str("\"10-2024\"").unwrap();
        assert_eq!(parsed, p("10-2024"));
        assert!(serde_json::from_str::<Period>("\"13-2024\"").is_err());
    }
}
