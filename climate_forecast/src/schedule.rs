//! Retrain cadence
//!
//! Wall-clock-date-driven weekly trigger. The worker loop polls
//! [`WeeklyCadence::fires_on`] with the current date; the cadence fires at
//! most once per calendar date and only on the configured weekday, so
//! there is no countdown state to drift.

use chrono::{Datelike, NaiveDate, Weekday};

/// Fires once per calendar week on a fixed weekday.
#[derive(Debug, Clone)]
pub struct WeeklyCadence {
    weekday: Weekday,
    last_fired: Option<NaiveDate>,
}

impl WeeklyCadence {
    /// Create a cadence for the given weekday.
    pub fn new(weekday: Weekday) -> Self {
        Self {
            weekday,
            last_fired: None,
        }
    }

    /// Whether the cadence fires on `today`; marks the date as consumed
    /// when it does.
    pub fn fires_on(&mut self, today: NaiveDate) -> bool {
        if today.weekday() != self.weekday || self.last_fired == Some(today) {
            return false;
        }
        self.last_fired = Some(today);
        true
    }
}
