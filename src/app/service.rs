//! Application service — the hexagonal core.
//!
//! [`Bindicator`] owns the [`StatusMachine`] and the error retry clock.
//! Every accepted transition is persisted through [`StoragePort`] and
//! announced through [`CommandSink`]; both clocks are injected so tests
//! drive time explicitly.
//!
//! ```text
//!  WallClock ──────▶ ┌────────────────────────┐ ──▶ CommandSink
//!                    │       Bindicator        │
//!  MonotonicClock ──▶│ status · retry · reset  │◀─▶ StoragePort
//!                    └────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};

use crate::config::BindicatorConfig;
use crate::fsm::reset::reset_due;
use crate::fsm::retry::RetryClock;
use crate::fsm::{CollectionState, CollectionStatus, ErrorKind, StatusMachine};

use super::commands::Command;
use super::persistence;
use super::ports::{CommandSink, MonotonicClock, StorageError, StoragePort, WallClock};

// ───────────────────────────────────────────────────────────────
// Bindicator
// ───────────────────────────────────────────────────────────────

/// The collection state machine together with its side-effect ports.
pub struct Bindicator<S, C, W, M> {
    machine: StatusMachine,
    retry: RetryClock,
    storage: S,
    commands: C,
    wall: W,
    mono: M,
    reset_hour: u32,
    tz: Tz,
    retry_interval_ms: u32,
}

impl<S, C, W, M> Bindicator<S, C, W, M>
where
    S: StoragePort,
    C: CommandSink,
    W: WallClock,
    M: MonotonicClock,
{
    /// Build the service in `Loading`.  Nothing is read or emitted until
    /// [`initialize_from_storage`](Self::initialize_from_storage).
    pub fn new(config: &BindicatorConfig, storage: S, commands: C, wall: W, mono: M) -> Self {
        Self {
            machine: StatusMachine::new(),
            retry: RetryClock::new(),
            storage,
            commands,
            wall,
            mono,
            reset_hour: u32::from(config.reset_hour),
            tz: config.tz(),
            retry_interval_ms: config.error_retry_interval_ms,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Reconcile the persisted record with the present, once at start-up.
    ///
    /// A completion whose reset hour already passed rolls over to
    /// `Loading`.  A stored error is never trusted: the retry clock is
    /// expired and the status drops to `Loading`.  Anything else is
    /// re-announced unchanged.
    pub fn initialize_from_storage(&mut self) {
        let stored = persistence::load(&self.storage);
        self.machine = StatusMachine::restore(stored.status, stored.completed_at);
        self.retry.clear();
        info!(
            "STATUS | restored {} (completed_at={})",
            self.machine.status(),
            self.machine.completed_at()
        );

        match self.machine.status() {
            CollectionStatus::Completed if self.rollover_due() => {
                info!("STATUS | stored completion is past the reset hour");
                self.transition(CollectionStatus::Loading);
            }
            status if status.is_error() => {
                self.transition(CollectionStatus::Loading);
            }
            status => self.emit(Command::from(status)),
        }
    }

    // ── Inputs ────────────────────────────────────────────────

    /// "Bin taken out".  Only meaningful while a collection is due.
    pub fn handle_button_press(&mut self) {
        if self.machine.status().is_due() {
            self.transition(CollectionStatus::Completed);
        } else {
            debug!("Button press ignored in {}", self.machine.status());
        }
    }

    /// Apply a successful calendar answer.  Overrides completion and
    /// error statuses alike.
    pub fn update_from_calendar(&mut self, state: CollectionState) {
        self.transition(state.into());
    }

    /// Record a failed calendar check.  The retry clock restarts on
    /// every call, even when the status is already this error.
    pub fn set_error_state(&mut self, kind: ErrorKind) {
        let now = self.mono.millis();
        self.retry.arm(now);
        debug!("Retry clock armed at {} ms ({:?})", now, kind);
        self.transition(kind.status());
    }

    /// Leave an error status for `Loading`.  No-op otherwise.
    pub fn clear_error_state(&mut self) {
        if self.machine.status().is_error() {
            self.retry.clear();
            self.transition(CollectionStatus::Loading);
        }
    }

    pub fn enter_setup_mode(&mut self) {
        self.transition(CollectionStatus::Setup);
    }

    pub fn exit_setup_mode(&mut self) {
        self.transition(CollectionStatus::Loading);
    }

    // ── Polling gate ──────────────────────────────────────────

    /// Whether the calendar poller may attempt a check now.
    ///
    /// Side effects: rolls `Completed` over to `Loading` once the reset
    /// hour has passed, and backfills a completion time that was recorded
    /// without a wall clock.
    pub fn should_check_calendar(&mut self) -> bool {
        match self.machine.status() {
            CollectionStatus::Setup => false,
            CollectionStatus::ErrorWifi | CollectionStatus::ErrorApi => {
                self.retry.is_due(self.mono.millis(), self.retry_interval_ms)
            }
            CollectionStatus::Completed => self.check_completed_rollover(),
            CollectionStatus::NoCollection
            | CollectionStatus::RecyclingDue
            | CollectionStatus::RubbishDue
            | CollectionStatus::Loading => true,
        }
    }

    fn check_completed_rollover(&mut self) -> bool {
        let Some(now) = self.wall.now_utc() else {
            debug!("Wall clock unavailable, reset check deferred");
            return false;
        };

        if self.machine.completed_at() == 0 {
            if self.machine.backfill_completed_at(now.timestamp()) {
                info!("STATUS | completion time backfilled to {}", now.timestamp());
                self.persist();
            }
            return false;
        }

        if self.reset_due_at(now) {
            self.transition(CollectionStatus::Loading);
            true
        } else {
            false
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> CollectionStatus {
        self.machine.status()
    }

    /// Unix seconds of the current completion; 0 unless `Completed`.
    pub fn completed_at(&self) -> i64 {
        self.machine.completed_at()
    }

    pub fn is_in_error_state(&self) -> bool {
        self.machine.status().is_error()
    }

    pub fn is_in_setup_mode(&self) -> bool {
        self.machine.status() == CollectionStatus::Setup
    }

    pub fn is_bin_taken_out(&self) -> bool {
        self.machine.status() == CollectionStatus::Completed
    }

    /// Milliseconds since the last recorded error, if the retry clock is armed.
    pub fn ms_since_error(&self) -> Option<u32> {
        self.retry.elapsed_ms(self.mono.millis())
    }

    pub fn reset_hour(&self) -> u32 {
        self.reset_hour
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    // ── Maintenance ───────────────────────────────────────────

    /// Erase the persisted record and start over from `Loading`.
    pub fn forget_persisted_state(&mut self) -> Result<(), StorageError> {
        persistence::forget(&mut self.storage)?;
        info!("Persisted status cleared");
        self.retry.clear();
        self.transition(CollectionStatus::Loading);
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ── Internals ─────────────────────────────────────────────

    /// The single transition path: dedup, timestamp pairing, persist,
    /// emit.  Returns whether the status changed.
    fn transition(&mut self, next: CollectionStatus) -> bool {
        let now = self.wall.now_utc().map(|t| t.timestamp());
        let Some(change) = self.machine.apply(next, now) else {
            return false;
        };

        if next == CollectionStatus::Completed && now.is_none() {
            warn!("STATUS | completed without wall clock, time will be backfilled");
        }

        self.persist();
        self.emit(Command::from(next));
        info!("STATUS | {} -> {}", change.from, change.to);
        true
    }

    fn persist(&mut self) {
        if let Err(e) = persistence::save(
            &mut self.storage,
            self.machine.status(),
            self.machine.completed_at(),
        ) {
            warn!("Persist failed ({}), in-memory status kept", e);
        }
    }

    fn emit(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            warn!("{}", e);
        }
    }

    fn rollover_due(&self) -> bool {
        self.wall.now_utc().is_some_and(|now| self.reset_due_at(now))
    }

    fn reset_due_at(&self, now: DateTime<Utc>) -> bool {
        let completed_at = self.machine.completed_at();
        completed_at != 0 && reset_due(completed_at, now, self.reset_hour, self.tz)
    }
}
