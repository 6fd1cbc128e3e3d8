//! Calendar month identifiers (`YYYY-MM`).

use chrono::{Datelike, Months, NaiveDate};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One calendar month, keyed as `YYYY-MM` in budget storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    first_day: NaiveDate,
}

impl MonthKey {
    /// Returns `None` for an out-of-range month or year.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// Month number in `1..=12`.
    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day
            .pred_opt()
            .unwrap_or(self.first_day)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn previous(&self) -> Self {
        self.first_day
            .checked_sub_months(Months::new(1))
            .map_or(*self, |first_day| Self { first_day })
    }

    pub fn next(&self) -> Self {
        self.first_day
            .checked_add_months(Months::new(1))
            .map_or(*self, |first_day| Self { first_day })
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| format!("invalid month key `{trimmed}`; expected YYYY-MM"))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| format!("invalid year in month key `{trimmed}`"))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| format!("invalid month in month key `{trimmed}`"))?;
        Self::new(year, month).ok_or_else(|| format!("month key out of range: `{trimmed}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::MonthKey;
    use chrono::NaiveDate;

    #[test]
    fn display_and_parse_use_padded_year_month() {
        let key = MonthKey::new(2024, 3).unwrap();
        assert_eq!(key.to_string(), "2024-03");
        assert_eq!("2024-03".parse::<MonthKey>().unwrap(), key);
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("march".parse::<MonthKey>().is_err());
    }

    #[test]
    fn previous_crosses_year_boundary() {
        let january = MonthKey::new(2025, 1).unwrap();
        assert_eq!(january.previous(), MonthKey::new(2024, 12).unwrap());
        assert_eq!(january.previous().next(), january);
    }

    #[test]
    fn days_in_month_handles_leap_february() {
        assert_eq!(MonthKey::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthKey::new(2023, 2).unwrap().days_in_month(), 28);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert!(MonthKey::of(date).contains(date));
    }
}
