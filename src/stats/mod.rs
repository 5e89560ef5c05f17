//! Weekly aggregation of runs.
//!
//! Weeks run Monday through Sunday. A report's average speed is total
//! distance over total time, not the mean of per-run speeds.

use chrono::{Datelike, Days, NaiveDate, TimeDelta};

use crate::model::Run;
use crate::{Error, Result};

/// Monday and Sunday of the week containing `date`.
///
/// Fails for dates whose week reaches past the representable calendar.
pub fn week_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
    date.checked_sub_days(back)
        .and_then(|monday| Some((monday, monday.checked_add_days(Days::new(6))?)))
        .ok_or_else(|| Error::InvalidInput(format!("date {date} is out of range")))
}

/// Totals for one owner and week.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekStats {
    pub runs: usize,
    pub total_distance_km: f64,
    pub total_time: TimeDelta,
}

impl WeekStats {
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a Run>) -> Self {
        runs.into_iter().fold(
            WeekStats { runs: 0, total_distance_km: 0.0, total_time: TimeDelta::zero() },
            |acc, run| WeekStats {
                runs: acc.runs + 1,
                total_distance_km: acc.total_distance_km + run.distance,
                total_time: acc.total_time + run.time,
            },
        )
    }

    pub fn is_empty(&self) -> bool {
        self.runs == 0
    }

    /// Kilometres per hour over the whole week; zero when no time was logged.
    pub fn average_speed_kmph(&self) -> f64 {
        let seconds = self.total_time.num_milliseconds() as f64 / 1_000.0;
        if seconds <= 0.0 {
            return 0.0;
        }
        self.total_distance_km * 3_600.0 / seconds
    }
}
