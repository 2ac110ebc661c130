//! Wake-point date arithmetic.
//!
//! Pure functions over local wall-clock times, independent of whatever timer
//! primitive eventually delivers the wake point.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::time::ClockTime;

/// Next moment strictly after `now` whose time of day is `time`.
///
/// A time of day that is equal to or earlier than `now` lands on the next
/// calendar day; it never fires immediately.
#[must_use]
pub fn next_occurrence(now: NaiveDateTime, time: ClockTime) -> NaiveDateTime {
    let candidate = now.date().and_time(time.to_naive());
    if candidate <= now {
        candidate + TimeDelta::days(1)
    } else {
        candidate
    }
}

/// Working hours `[start, end)` in whole hours of the local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkHours {
    pub start: u8,
    pub end: u8,
}

impl WorkHours {
    #[must_use]
    pub fn contains(self, hour: u32) -> bool {
        hour >= u32::from(self.start) && hour < u32::from(self.end)
    }
}

/// Next fire time of an interval reminder.
///
/// Counts `interval` steps from the top of the current hour until strictly
/// after `now`. When that lands outside `work`, the reminder moves to the
/// start of work on the same day if still ahead, otherwise the day after.
#[must_use]
pub fn next_interval_fire(
    now: NaiveDateTime,
    interval: TimeDelta,
    work: WorkHours,
) -> NaiveDateTime {
    let step = if interval <= TimeDelta::zero() {
        TimeDelta::hours(1)
    } else {
        interval
    };
    let top_of_hour = now.date().and_time(
        NaiveTime::from_hms_opt(now.hour(), 0, 0).unwrap_or(NaiveTime::MIN),
    );
    let mut next = top_of_hour + step;
    while next <= now {
        next += step;
    }
    if work.contains(next.hour()) {
        return next;
    }
    let start = NaiveTime::from_hms_opt(u32::from(work.start), 0, 0).unwrap_or(NaiveTime::MIN);
    let same_day = next.date().and_time(start);
    if same_day > now {
        same_day
    } else {
        same_day + TimeDelta::days(1)
    }
}
