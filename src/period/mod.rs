//! Named filter periods and their resolution into concrete date intervals.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Half-open date interval: `start <= d < end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Unbounded interval backing the "all time" filter.
    pub fn all_time() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }
}

/// Named filter period selectable by the user.
///
/// `Custom` carries an explicit half-open range; the calendar variants are
/// resolved relative to a reference date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterPeriod {
    Week,
    Month,
    Quarter,
    Year,
    AllTime,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl Default for FilterPeriod {
    fn default() -> Self {
        FilterPeriod::Month
    }
}

impl FilterPeriod {
    /// Resolves the period to a concrete interval, pure in `reference`.
    ///
    /// Weeks start on Monday (fixed convention, the engine has no locale
    /// setting). Months, quarters and years follow the calendar.
    pub fn resolve(&self, reference: NaiveDate) -> DateRange {
        match *self {
            FilterPeriod::Week => {
                let start = reference
                    - Duration::days(reference.weekday().num_days_from_monday() as i64);
                DateRange::new(start, start + Duration::days(7))
            }
            FilterPeriod::Month => {
                let start = first_of_month(reference);
                DateRange::new(start, shift_month(start, 1))
            }
            FilterPeriod::Quarter => {
                let quarter_month = ((reference.month() - 1) / 3) * 3 + 1;
                let start = NaiveDate::from_ymd_opt(reference.year(), quarter_month, 1)
                    .expect("first day of quarter");
                DateRange::new(start, shift_month(start, 3))
            }
            FilterPeriod::Year => {
                let start =
                    NaiveDate::from_ymd_opt(reference.year(), 1, 1).expect("first of year");
                let end = NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1)
                    .expect("first of next year");
                DateRange::new(start, end)
            }
            FilterPeriod::AllTime => DateRange::all_time(),
            FilterPeriod::Custom { start, end } => DateRange::new(start, end),
        }
    }
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 always valid")
}

/// Moves a date by whole months, clamping the day to the target month's
/// length (Jan 31 + 1 month = Feb 28/29).
pub(crate) fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    let day = date.day().min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).expect("clamped day is valid")
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_next =
        NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("first of next month");
    (first_next - Duration::days(1)).day()
}
