//! Recurrence calculation

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Next wall-clock occurrence of `time_of_day` strictly after `now` (UTC).
///
/// Today's occurrence is used if it is still ahead; otherwise tomorrow's. An
/// occurrence exactly at `now` counts as passed.
pub fn next_occurrence(time_of_day: NaiveTime, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive().and_time(time_of_day).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
