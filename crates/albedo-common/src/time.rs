//! Date handling for daily processing runs.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AlbedoError, AlbedoResult};

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, compact `YYYYMMDD`, or a full RFC 3339 timestamp
/// (whose date part is used).
pub fn parse_date(s: &str) -> AlbedoResult<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y%m%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(AlbedoError::InvalidDate(s.to_string()))
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> AlbedoResult<Self> {
        if start > end {
            return Err(AlbedoError::InvalidDate(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a "start/end" pair or a single date.
    pub fn parse(s: &str) -> AlbedoResult<Self> {
        match s.split_once('/') {
            Some((start, end)) => Self::new(parse_date(start)?, parse_date(end)?),
            None => {
                let day = parse_date(s)?;
                Self::new(day, day)
            }
        }
    }

    /// Number of days in the range.
    pub fn len(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        date >= &self.start && date <= &self.end
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
