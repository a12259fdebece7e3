//! Holiday extraction from flagged sales rows

use crate::data::SalesTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Days before a holiday that share its effect
pub const HOLIDAY_LOWER_WINDOW: u32 = 0;
/// Days after a holiday that share its effect
pub const HOLIDAY_UPPER_WINDOW: u32 = 1;

/// A flagged date and the window its effect is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Holiday {
    /// Flagged calendar date
    pub ds: NaiveDate,
    /// Days before `ds` included in the effect
    pub lower_window: u32,
    /// Days after `ds` included in the effect
    pub upper_window: u32,
}

impl Holiday {
    /// Holiday with the standard 0-day / 1-day window
    pub fn new(ds: NaiveDate) -> Self {
        Self {
            ds,
            lower_window: HOLIDAY_LOWER_WINDOW,
            upper_window: HOLIDAY_UPPER_WINDOW,
        }
    }

    /// Signed offset of `date` from the holiday if it falls inside the window
    pub fn offset_of(&self, date: NaiveDate) -> Option<i64> {
        let offset = (date - self.ds).num_days();
        if offset >= -i64::from(self.lower_window) && offset <= i64::from(self.upper_window) {
            Some(offset)
        } else {
            None
        }
    }

}

/// Distinct flagged holidays, ordered by date
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidaySet {
    holidays: Vec<Holiday>,
}

impl HolidaySet {
    /// Build a set from dates, dropping duplicates
    pub fn from_dates<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        let unique: BTreeSet<NaiveDate> = dates.into_iter().collect();
        Self {
            holidays: unique.into_iter().map(Holiday::new).collect(),
        }
    }

    /// All holidays
    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    /// Offsets (relative to the holiday date) that any holiday can produce
    ///
    /// Offsets are shared across holidays: every holiday's "day after"
    /// shares one effect.
    pub fn offsets(&self) -> Vec<i64> {
        let lower = self
            .holidays
            .iter()
            .map(|h| -i64::from(h.lower_window))
            .min();
        let upper = self
            .holidays
            .iter()
            .map(|h| i64::from(h.upper_window))
            .max();
        match (lower, upper) {
            (Some(lower), Some(upper)) => (lower..=upper).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `date` sits at `offset` days from any holiday
    pub fn is_active(&self, date: NaiveDate, offset: i64) -> bool {
        self.holidays
            .iter()
            .any(|h| h.offset_of(date) == Some(offset))
    }

    /// Number of holidays
    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    /// Check if there are no holidays
    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

/// Collect flagged dates into a holiday set
///
/// Returns `None` when the table has no holiday column at all.
pub fn extract_holidays(table: &SalesTable) -> Option<HolidaySet> {
    if !table.has_holiday_flag() {
        return None;
    }

    Some(HolidaySet::from_dates(
        table
            .rows()
            .iter()
            .filter(|row| row.holiday_flag == Some(true))
            .map(|row| row.date),
    ))
}
