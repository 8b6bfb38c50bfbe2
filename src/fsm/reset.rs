//! Daily reset-hour arithmetic.
//!
//! A completion rolls over at the next local `reset_hour:00:00` that
//! follows it.  Completing before the reset hour waits for the same day's
//! reset; completing at or after it waits for the following day's.
//!
//! | completed (local) | reset hour | eligible from        |
//! |-------------------|------------|----------------------|
//! | Thu 02:00         | 03         | Thu 03:00            |
//! | Thu 03:00         | 03         | Fri 03:00            |
//! | Thu 15:00         | 03         | Fri 03:00            |

use chrono::offset::LocalResult;
use chrono::{DateTime, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Next reset instant following `completed_at` (unix seconds).
///
/// A reset hour that falls into a DST gap moves one hour later; an
/// ambiguous one (DST fold) takes the earlier instant.  `None` only for
/// timestamps or hours chrono cannot represent.
pub fn next_reset_after(completed_at: i64, reset_hour: u32, tz: Tz) -> Option<DateTime<Utc>> {
    let completed = DateTime::from_timestamp(completed_at, 0)?.with_timezone(&tz);

    let mut day = completed.date_naive();
    if completed.hour() >= reset_hour {
        day = day.succ_opt()?;
    }

    let naive = day.and_hms_opt(reset_hour, 0, 0)?;
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()?,
    };

    Some(local.with_timezone(&Utc))
}

/// Whether `now` is at or past the reset instant following `completed_at`.
/// Unrepresentable inputs count as "not yet".
pub fn reset_due(completed_at: i64, now: DateTime<Utc>, reset_hour: u32, tz: Tz) -> bool {
    next_reset_after(completed_at, reset_hour, tz).is_some_and(|reset| now >= reset)
}
