//! Time window selection
//!
//! Computes the current/previous week and month windows relative to a
//! reference instant. Calendar arithmetic happens in the UTC offset carried by
//! `now`; membership is decided by comparing instants.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::{InsightError, Result};
use crate::types::JournalEntry;

/// Length of a week window in days
const WEEK_DAYS: i64 = 7;

/// Inclusive instant range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn contains(&self, instant: &DateTime<FixedOffset>) -> bool {
        *instant >= self.start && *instant <= self.end
    }

    /// Entries inside the window; unparseable timestamps are never inside
    pub fn select(&self, entries: &[JournalEntry]) -> Vec<JournalEntry> {
        entries
            .iter()
            .filter(|entry| {
                entry
                    .created_instant()
                    .is_some_and(|instant| self.contains(&instant))
            })
            .cloned()
            .collect()
    }
}

/// The four windows an analysis pass compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisWindows {
    pub current_week: TimeWindow,
    pub previous_week: TimeWindow,
    pub current_month: TimeWindow,
    pub previous_month: TimeWindow,
}

impl AnalysisWindows {
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self {
            current_week: current_week(now),
            previous_week: previous_week(now),
            current_month: current_month(now),
            previous_month: previous_month(now),
        }
    }
}

/// Parse a caller-supplied reference instant (RFC 3339)
pub fn parse_reference_instant(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| InsightError::InvalidTimestamp(format!("{value:?}: {e}")))
}

/// [today − 6 days at 00:00:00.000, now]
pub fn current_week(now: DateTime<FixedOffset>) -> TimeWindow {
    let offset = *now.offset();
    let start_day = now.date_naive() - Duration::days(WEEK_DAYS - 1);
    TimeWindow {
        start: start_of_day(start_day, offset),
        end: now,
    }
}

/// The seven whole days before the current week's start
pub fn previous_week(now: DateTime<FixedOffset>) -> TimeWindow {
    let offset = *now.offset();
    let current_start_day = now.date_naive() - Duration::days(WEEK_DAYS - 1);
    TimeWindow {
        start: start_of_day(current_start_day - Duration::days(WEEK_DAYS), offset),
        end: end_of_day(current_start_day - Duration::days(1), offset),
    }
}

/// [first of this month at 00:00:00.000, now]
pub fn current_month(now: DateTime<FixedOffset>) -> TimeWindow {
    let offset = *now.offset();
    TimeWindow {
        start: start_of_day(first_of_month(now.date_naive()), offset),
        end: now,
    }
}

/// First of the previous month through the same day-of-month as today,
/// clamped to the previous month's length, at 23:59:59.999
pub fn previous_month(now: DateTime<FixedOffset>) -> TimeWindow {
    let offset = *now.offset();
    let today = now.date_naive();
    let last_of_previous = first_of_month(today) - Duration::days(1);
    let first_of_previous = first_of_month(last_of_previous);

    let aligned_day = today.day().min(last_of_previous.day());
    let end_day = first_of_previous + Duration::days(i64::from(aligned_day) - 1);

    TimeWindow {
        start: start_of_day(first_of_previous, offset),
        end: end_of_day(end_day, offset),
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    local_to_instant(date.and_time(NaiveTime::MIN), offset)
}

fn end_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    let next_midnight = date.and_time(NaiveTime::MIN) + Duration::days(1);
    local_to_instant(next_midnight - Duration::milliseconds(1), offset)
}

/// A fixed offset maps every local time to exactly one instant
fn local_to_instant(local: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}
