//! Closed date-interval arithmetic used by billing.
//!
//! Every range here is inclusive on both ends: `2024-01-10..=2024-01-20` is
//! eleven days.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidRange {
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("no such month: {year}-{month:02}")]
    NoSuchMonth { year: i32, month: u32 },
}

/// A closed `[start, end]` date interval. Always satisfies `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRange> {
        if end < start {
            return Err(InvalidRange::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let first = date - Days::new(u64::from(date.day0()));
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self {
            start: first,
            end: last,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `(year, month)` pairs touched by this range, in calendar order.
    pub fn months(&self) -> Vec<(i32, u32)> {
        let mut out = Vec::new();
        let (mut year, mut month) = (self.start.year(), self.start.month());
        let last = (self.end.year(), self.end.month());
        while (year, month) <= last {
            out.push((year, month));
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        out
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Intersection of two closed ranges, if they share at least one day.
pub fn overlap(a: &DateRange, b: &DateRange) -> Option<DateRange> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (start <= end).then_some(DateRange { start, end })
}

/// Number of days in the range, counting both endpoints.
pub fn inclusive_day_count(range: &DateRange) -> i64 {
    (range.end - range.start).num_days() + 1
}

/// First and last calendar day of `month` in `year`.
pub fn month_bounds(year: i32, month: u32) -> Result<DateRange, InvalidRange> {
    let first =
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(InvalidRange::NoSuchMonth { year, month })?;
    Ok(DateRange::month_of(first))
}
