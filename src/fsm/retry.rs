//! Error-retry backoff clock.
//!
//! Runs on the monotonic millisecond counter, never the wall clock: the
//! wall clock may itself be unsynchronised during a WiFi outage.  The
//! counter is a `u32` that wraps after ~49.7 days, so elapsed time is a
//! wrapping subtraction.

/// Default minimum gap between calendar attempts while in an error status.
pub const DEFAULT_RETRY_INTERVAL_MS: u32 = 300_000;

/// Reference point of the last recorded error.  `None` means expired:
/// the next attempt may run immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryClock {
    epoch_ms: Option<u32>,
}

impl RetryClock {
    pub const fn new() -> Self {
        Self { epoch_ms: None }
    }

    /// Start (or restart) the backoff at `now_ms`.
    pub fn arm(&mut self, now_ms: u32) {
        self.epoch_ms = Some(now_ms);
    }

    /// Forget the reference point so the next check is due at once.
    pub fn clear(&mut self) {
        self.epoch_ms = None;
    }

    /// Milliseconds since the last [`arm`](Self::arm), wrap-safe.
    pub fn elapsed_ms(&self, now_ms: u32) -> Option<u32> {
        self.epoch_ms.map(|epoch| now_ms.wrapping_sub(epoch))
    }

    /// Whether at least `interval_ms` has passed since the error was recorded.
    pub fn is_due(&self, now_ms: u32, interval_ms: u32) -> bool {
        self.elapsed_ms(now_ms)
            .is_none_or(|elapsed| elapsed >= interval_ms)
    }
}
