//! Reporting date window

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Today on the local calendar, the day branch sheets are written in
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Inclusive calendar-day window
///
/// Entries carry no time of day, so `start` covers the whole first day
/// from 00:00:00.000 and `end` the whole last day up to 23:59:59.999.
/// A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// First day of `today`'s month through `today`
    pub fn month_to_date(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        Self::between(first, today)
    }

    /// Month to date on the local calendar
    pub fn current_month() -> Self {
        Self::month_to_date(local_today())
    }

    /// Parse `YYYY-MM-DD` bounds; blank strings leave the side open
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Ok(Self::new(parse_bound(start)?, parse_bound(end)?))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        if matches!(self.start, Some(start) if day < start) {
            return false;
        }
        if matches!(self.end, Some(end) if day > end) {
            return false;
        }
        true
    }
}

fn parse_bound(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| Error::validation(format!("Invalid date '{}', expected YYYY-MM-DD", s))),
    }
}
