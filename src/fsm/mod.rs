//! Collection status state machine (pure logic, zero I/O).
//!
//! ```text
//! ┌──────────────┐  calendar   ┌───────────────┐  button   ┌───────────┐
//! │   LOADING    │────────────▶│ RECYCLING_DUE │──────────▶│ COMPLETED │
//! │ (bootstrap)  │             │ RUBBISH_DUE   │           │ + time    │
//! └──────────────┘             │ NO_COLLECTION │           └─────┬─────┘
//!     ▲   ▲   ▲                └───────────────┘                 │
//!     │   │   └──────────── reset hour passed ───────────────────┘
//!     │   └─ error cleared ── ERROR_WIFI / ERROR_API
//!     └───── setup exited ─── SETUP
//! ```
//!
//! [`StatusMachine`] owns the status and the `completed_at` timestamp and
//! applies the dedup rule.  Persistence and command emission are layered
//! on top by [`crate::app::service::Bindicator`].

pub mod reset;
pub mod retry;

use log::debug;

// ---------------------------------------------------------------------------
// Status identity
// ---------------------------------------------------------------------------

/// Every status the indicator can be in.  Exactly one is current.
///
/// The discriminants are the persisted encoding of the `state` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CollectionStatus {
    NoCollection = 0,
    RecyclingDue = 1,
    RubbishDue = 2,
    Completed = 3,
    Loading = 4,
    Setup = 5,
    ErrorApi = 6,
    ErrorWifi = 7,
}

impl CollectionStatus {
    /// Total number of statuses.
    pub const COUNT: usize = 8;

    /// Every status, in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::NoCollection,
        Self::RecyclingDue,
        Self::RubbishDue,
        Self::Completed,
        Self::Loading,
        Self::Setup,
        Self::ErrorApi,
        Self::ErrorWifi,
    ];

    /// Decode a persisted discriminant.  `None` for unknown values.
    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Persisted discriminant.
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// `ERROR_WIFI` or `ERROR_API`.
    pub const fn is_error(self) -> bool {
        matches!(self, Self::ErrorApi | Self::ErrorWifi)
    }

    /// A bin is due and the button press is meaningful.
    pub const fn is_due(self) -> bool {
        matches!(self, Self::RecyclingDue | Self::RubbishDue)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::NoCollection => "NO_COLLECTION",
            Self::RecyclingDue => "RECYCLING_DUE",
            Self::RubbishDue => "RUBBISH_DUE",
            Self::Completed => "COMPLETED",
            Self::Loading => "LOADING",
            Self::Setup => "SETUP",
            Self::ErrorApi => "ERROR_API",
            Self::ErrorWifi => "ERROR_WIFI",
        }
    }
}

impl core::fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// The answer of one successful calendar check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionState {
    NoCollection,
    RecyclingDue,
    RubbishDue,
}

impl From<CollectionState> for CollectionStatus {
    fn from(state: CollectionState) -> Self {
        match state {
            CollectionState::NoCollection => Self::NoCollection,
            CollectionState::RecyclingDue => Self::RecyclingDue,
            CollectionState::RubbishDue => Self::RubbishDue,
        }
    }
}

/// Why the last calendar check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Wifi,
    Api,
}

impl ErrorKind {
    /// The error status this failure puts the indicator into.
    pub const fn status(self) -> CollectionStatus {
        match self {
            Self::Wifi => CollectionStatus::ErrorWifi,
            Self::Api => CollectionStatus::ErrorApi,
        }
    }
}

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

/// An accepted status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CollectionStatus,
    pub to: CollectionStatus,
}

/// Holds the authoritative status and its paired completion timestamp.
///
/// Invariant: `completed_at` is non-zero only while the status is
/// `Completed` (it is zero there too when the wall clock was unavailable
/// at completion time, until [`backfill_completed_at`](Self::backfill_completed_at)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMachine {
    status: CollectionStatus,
    completed_at: i64,
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusMachine {
    /// Bootstrap machine: `Loading`, no completion time.
    pub const fn new() -> Self {
        Self {
            status: CollectionStatus::Loading,
            completed_at: 0,
        }
    }

    /// Rebuild from a persisted record without counting it as a transition.
    /// A timestamp stored alongside any status other than `Completed` is dropped.
    pub fn restore(status: CollectionStatus, completed_at: i64) -> Self {
        let completed_at = if status == CollectionStatus::Completed {
            completed_at.max(0)
        } else {
            0
        };
        Self {
            status,
            completed_at,
        }
    }

    pub fn status(&self) -> CollectionStatus {
        self.status
    }

    /// Unix seconds of completion; 0 unless `Completed`.
    pub fn completed_at(&self) -> i64 {
        self.completed_at
    }

    /// Apply a requested status.
    ///
    /// Returns `None` when `next` equals the current status (no side
    /// effects may follow).  `now_secs` is the wall clock, used only when
    /// entering `Completed`.
    pub fn apply(&mut self, next: CollectionStatus, now_secs: Option<i64>) -> Option<Transition> {
        if next == self.status {
            debug!("STATUS | {} unchanged, ignoring", next);
            return None;
        }

        let from = self.status;
        if from == CollectionStatus::Completed {
            self.completed_at = 0;
        }
        if next == CollectionStatus::Completed {
            self.completed_at = now_secs.unwrap_or(0).max(0);
        }
        self.status = next;

        Some(Transition { from, to: next })
    }

    /// Record the completion time after the fact, when the transition into
    /// `Completed` happened without a wall clock.  Returns `true` if the
    /// timestamp was written.
    pub fn backfill_completed_at(&mut self, now_secs: i64) -> bool {
        if self.status != CollectionStatus::Completed || self.completed_at != 0 || now_secs <= 0 {
            return false;
        }
        self.completed_at = now_secs;
        true
    }
}
