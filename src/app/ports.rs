//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Bindicator (domain)
//! ```
//!
//! Driven adapters (clocks, storage, command channel, calendar client)
//! implement these traits.  [`Bindicator`](super::service::Bindicator)
//! consumes them via generics, so the domain core never touches hardware
//! or the network directly.

use chrono::{DateTime, Utc};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use super::commands::Command;
use crate::config::BindicatorConfig;
use crate::fsm::{CollectionState, ErrorKind};

// ───────────────────────────────────────────────────────────────
// Clock ports
// ───────────────────────────────────────────────────────────────

/// Wall-clock source used for completion timestamps and the reset hour.
pub trait WallClock {
    /// Current time, or `None` while the clock is not synchronised.
    fn now_utc(&self) -> Option<DateTime<Utc>>;
}

/// Monotonic millisecond counter used for error-retry backoff.
/// Wraps at `u32::MAX`.
pub trait MonotonicClock {
    fn millis(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Command sink (domain → display)
// ───────────────────────────────────────────────────────────────

/// Non-blocking, best-effort delivery of display commands.
pub trait CommandSink {
    /// Enqueue `command`; never waits.  A full queue drops it.
    fn send(&self, command: Command) -> Result<(), CommandDropped>;
}

/// The command channel was full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDropped(pub Command);

impl<M: RawMutex, const N: usize> CommandSink for Channel<M, Command, N> {
    fn send(&self, command: Command) -> Result<(), CommandDropped> {
        self.try_send(command).map_err(|_| CommandDropped(command))
    }
}

impl<T: CommandSink + ?Sized> CommandSink for &T {
    fn send(&self, command: Command) -> Result<(), CommandDropped> {
        (**self).send(command)
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists device configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration; [`BindicatorConfig::default()`] if none is stored.
    fn load(&self) -> Result<BindicatorConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &BindicatorConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Durable key-value storage that survives power loss.
///
/// Keys are namespaced; writes are atomic per key (ESP-IDF NVS commit).
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Calendar port (driven adapter: domain ← remote calendar)
// ───────────────────────────────────────────────────────────────

/// Answers "what is due today?" for the calendar poller.
pub trait CalendarPort {
    fn fetch_collection(&mut self) -> Result<CollectionState, CalendarError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Value could not be encoded or decoded.
    Encoding,
}

/// Errors from [`CalendarPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarError {
    /// Station is not connected.
    WifiUnavailable,
    /// Transport failed after connecting (DNS, TLS, socket).
    Transport,
    /// Calendar API answered with a non-200 status.
    Http(u16),
    /// Response body was not a calendar events payload.
    Malformed,
    /// No calendar endpoint configured.
    NotConfigured,
    /// Wall clock not synchronised, so "today" is unknown.
    ClockUnavailable,
}

impl CalendarError {
    /// Classify for the error status shown to the user.
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::WifiUnavailable => ErrorKind::Wifi,
            Self::Transport
            | Self::Http(_)
            | Self::Malformed
            | Self::NotConfigured
            | Self::ClockUnavailable => ErrorKind::Api,
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Encoding => write!(f, "value encoding error"),
        }
    }
}

impl core::fmt::Display for CalendarError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WifiUnavailable => write!(f, "WiFi not connected"),
            Self::Transport => write!(f, "calendar transport failed"),
            Self::Http(status) => write!(f, "calendar API returned HTTP {}", status),
            Self::Malformed => write!(f, "calendar payload malformed"),
            Self::NotConfigured => write!(f, "calendar not configured"),
            Self::ClockUnavailable => write!(f, "wall clock not synchronised"),
        }
    }
}

impl core::fmt::Display for CommandDropped {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "command channel full, dropped {:?}", self.0)
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for StorageError {}
impl std::error::Error for CalendarError {}
impl std::error::Error for CommandDropped {}
