/// Time-window resolution for analytics
///
/// All calendar arithmetic is done in UTC.

use crate::models::task::parse_due_date;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Requested analytics window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "week" => Some(TimeRange::Week),
            "month" => Some(TimeRange::Month),
            "year" => Some(TimeRange::Year),
            _ => None,
        }
    }

    /// Parses a query value, using `default` when absent or unrecognised
    pub fn parse_or(raw: Option<&str>, default: TimeRange) -> Self {
        raw.and_then(Self::from_str).unwrap_or(default)
    }

    /// First instant of the window ending at `now`
    ///
    /// - `week`: seven days before `now`
    /// - `month`: the first day of the previous calendar month
    /// - `year`: January 1 of the previous calendar year
    ///
    /// `month` and `year` therefore cover more than one month or year.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Week => now - Duration::days(7),
            TimeRange::Month => {
                let (year, month) = previous_month(now.year(), now.month());
                utc_midnight(year, month, 1).unwrap_or(now - Duration::days(62))
            }
            TimeRange::Year => {
                utc_midnight(now.year() - 1, 1, 1).unwrap_or(now - Duration::days(731))
            }
        }
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn utc_midnight(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
}

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
}

impl CalendarMonth {
    pub fn containing(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
        }
    }

    /// Parses `YYYY-MM`, or any date accepted for due dates, into its month
    ///
    /// # Example
    ///
    /// ```
    /// use smarttask_shared::analytics::window::CalendarMonth;
    ///
    /// let month = CalendarMonth::parse("2026-02").unwrap();
    /// assert_eq!(month.label(), "February 2026");
    /// assert_eq!(CalendarMonth::parse("2026-02-17"), Some(month));
    /// assert!(CalendarMonth::parse("someday").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
            return Some(Self {
                year: date.year(),
                month: date.month(),
            });
        }
        parse_due_date(raw).map(Self::containing)
    }

    /// First and last second of the month, both inclusive
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = utc_midnight(self.year, self.month, 1)?;
        let (year, month) = next_month(self.year, self.month);
        let end = utc_midnight(year, month, 1)? - Duration::seconds(1);
        Some((start, end))
    }

    /// English month name and year, e.g. `October 2026`
    pub fn label(&self) -> String {
        match utc_midnight(self.year, self.month, 1) {
            Some(start) => start.format("%B %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}
