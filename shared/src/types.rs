//! Common types used across the service

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire format of report dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date range of a report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Build a range from request strings.
    ///
    /// Missing or unparseable values fall back to `today`, each side on its own.
    pub fn from_params(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> Self {
        Self {
            start: parse_report_date(from, today),
            end: parse_report_date(to, today),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Parse a `YYYY-MM-DD` date, substituting `today` when it does not parse
pub fn parse_report_date(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    raw.map(str::trim)
        .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
        .unwrap_or(today)
}

/// Date condition of one aggregation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Strictly before the date (opening balance)
    Before(NaiveDate),
    /// Inside the inclusive range (window movement)
    Within(DateRange),
}

impl DateBound {
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            DateBound::Before(limit) => date < *limit,
            DateBound::Within(range) => range.contains(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_dates_parse() {
        let range = DateRange::from_params(Some("2024-04-01"), Some("2024-04-30"), day(2030, 1, 1));
        assert_eq!(range, DateRange::new(day(2024, 4, 1), day(2024, 4, 30)));
    }

    #[test]
    fn test_invalid_dates_fall_back_to_today() {
        let today = day(2024, 5, 10);
        let range = DateRange::from_params(Some("01/04/2024"), None, today);
        assert_eq!(range, DateRange::new(today, today));

        let range = DateRange::from_params(Some("2024-02-30"), Some("2024-03-01"), today);
        assert_eq!(range.start, today);
        assert_eq!(range.end, day(2024, 3, 1));
    }

    #[test]
    fn test_bounds() {
        let before = DateBound::Before(day(2024, 4, 1));
        assert!(before.matches(day(2024, 3, 31)));
        assert!(!before.matches(day(2024, 4, 1)));

        let within = DateBound::Within(DateRange::new(day(2024, 4, 1), day(2024, 4, 30)));
        assert!(within.matches(day(2024, 4, 1)));
        assert!(within.matches(day(2024, 4, 30)));
        assert!(!within.matches(day(2024, 5, 1)));
    }
}
