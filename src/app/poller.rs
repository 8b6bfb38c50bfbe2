//! Calendar polling cadence.
//!
//! Decides *when* to ask the calendar; [`Bindicator::should_check_calendar`]
//! decides *whether* the current status allows it.
//!
//! [`Bindicator::should_check_calendar`]: super::service::Bindicator::should_check_calendar

use log::{debug, info, warn};

use crate::fsm::{CollectionState, CollectionStatus, ErrorKind};

use super::ports::{CalendarPort, CommandSink, MonotonicClock, StoragePort, WallClock};
use super::shared::SharedBindicator;

/// Result of one [`CalendarPoller::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Regular interval not yet elapsed.
    NotDue,
    /// Interval elapsed but the status forbids a check (setup, backoff,
    /// completion not yet reset).
    Skipped,
    Updated(CollectionState),
    Failed(ErrorKind),
}

pub struct CalendarPoller {
    check_interval_ms: u32,
    last_attempt_ms: Option<u32>,
}

impl CalendarPoller {
    pub const fn new(check_interval_ms: u32) -> Self {
        Self {
            check_interval_ms,
            last_attempt_ms: None,
        }
    }

    /// Whether the cadence asks for a check in `status` at `now_ms`.
    ///
    /// Statuses that are waiting on something (bootstrap, completion
    /// reset, error backoff) are consulted every tick; the status gate
    /// does the rate limiting for them.
    fn is_due(&self, now_ms: u32, status: CollectionStatus) -> bool {
        if matches!(
            status,
            CollectionStatus::Loading
                | CollectionStatus::Completed
                | CollectionStatus::ErrorApi
                | CollectionStatus::ErrorWifi
        ) {
            return true;
        }
        self.last_attempt_ms
            .is_none_or(|last| now_ms.wrapping_sub(last) >= self.check_interval_ms)
    }

    pub fn tick<S, C, W, M>(
        &mut self,
        now_ms: u32,
        bindicator: &SharedBindicator<S, C, W, M>,
        calendar: &mut impl CalendarPort,
    ) -> PollOutcome
    where
        S: StoragePort,
        C: CommandSink,
        W: WallClock,
        M: MonotonicClock,
    {
        if !self.is_due(now_ms, bindicator.status()) {
            return PollOutcome::NotDue;
        }
        if !bindicator.should_check_calendar() {
            return PollOutcome::Skipped;
        }

        self.last_attempt_ms = Some(now_ms);
        debug!("Calendar check at {} ms", now_ms);

        match calendar.fetch_collection() {
            Ok(state) => {
                info!("Calendar: {:?}", state);
                bindicator.update_from_calendar(state);
                PollOutcome::Updated(state)
            }
            Err(e) => {
                warn!("Calendar check failed: {}", e);
                let kind = e.kind();
                bindicator.set_error_state(kind);
                PollOutcome::Failed(kind)
            }
        }
    }
}
