//! Thread-shared handle around [`Bindicator`].
//!
//! The poller thread, the button loop and the console all mutate the same
//! instance.  Each public operation runs under one lock acquisition, so
//! the compare/mutate/persist/emit sequence of a transition is never
//! interleaved with another caller.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono_tz::Tz;

use crate::fsm::{CollectionState, CollectionStatus, ErrorKind};

use super::ports::{CommandSink, MonotonicClock, StorageError, StoragePort, WallClock};
use super::service::Bindicator;

pub struct SharedBindicator<S, C, W, M> {
    inner: Mutex<Bindicator<S, C, W, M>>,
}

/// Point-in-time view for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: CollectionStatus,
    pub completed_at: i64,
    pub ms_since_error: Option<u32>,
    pub reset_hour: u32,
    pub timezone: Tz,
}

impl<S, C, W, M> SharedBindicator<S, C, W, M>
where
    S: StoragePort,
    C: CommandSink,
    W: WallClock,
    M: MonotonicClock,
{
    pub fn new(bindicator: Bindicator<S, C, W, M>) -> Self {
        Self {
            inner: Mutex::new(bindicator),
        }
    }

    /// Run `f` with exclusive access.  A panic in another holder does not
    /// invalidate the status, so a poisoned lock is recovered.
    pub fn with<R>(&self, f: impl FnOnce(&mut Bindicator<S, C, W, M>) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Bindicator<S, C, W, M>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn initialize_from_storage(&self) {
        self.lock().initialize_from_storage();
    }

    pub fn handle_button_press(&self) {
        self.lock().handle_button_press();
    }

    pub fn update_from_calendar(&self, state: CollectionState) {
        self.lock().update_from_calendar(state);
    }

    pub fn should_check_calendar(&self) -> bool {
        self.lock().should_check_calendar()
    }

    pub fn set_error_state(&self, kind: ErrorKind) {
        self.lock().set_error_state(kind);
    }

    pub fn clear_error_state(&self) {
        self.lock().clear_error_state();
    }

    pub fn enter_setup_mode(&self) {
        self.lock().enter_setup_mode();
    }

    pub fn exit_setup_mode(&self) {
        self.lock().exit_setup_mode();
    }

    pub fn is_in_error_state(&self) -> bool {
        self.lock().is_in_error_state()
    }

    pub fn is_in_setup_mode(&self) -> bool {
        self.lock().is_in_setup_mode()
    }

    pub fn is_bin_taken_out(&self) -> bool {
        self.lock().is_bin_taken_out()
    }

    pub fn status(&self) -> CollectionStatus {
        self.lock().status()
    }

    pub fn completed_at(&self) -> i64 {
        self.lock().completed_at()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let b = self.lock();
        StatusSnapshot {
            status: b.status(),
            completed_at: b.completed_at(),
            ms_since_error: b.ms_since_error(),
            reset_hour: b.reset_hour(),
            timezone: b.timezone(),
        }
    }

    /// Toggle between `Setup` and `Loading` (long press).
    pub fn toggle_setup_mode(&self) -> bool {
        let mut b = self.lock();
        if b.is_in_setup_mode() {
            b.exit_setup_mode();
            false
        } else {
            b.enter_setup_mode();
            true
        }
    }

    pub fn forget_persisted_state(&self) -> Result<(), StorageError> {
        self.lock().forget_persisted_state()
    }
}
