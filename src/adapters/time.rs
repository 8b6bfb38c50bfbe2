//! ESP32 time adapter.
//!
//! Implements both clock ports:
//!
//! - [`MonotonicClock`]: milliseconds since boot, truncated to `u32`.
//!   `esp_timer_get_time()` on device, `std::time::Instant` on host.
//! - [`WallClock`]: `SystemTime`, kept in sync by SNTP on device.
//!   Readings before 2020-01-01 mean the clock has not been set yet.

use chrono::{DateTime, Utc};

use crate::app::ports::{MonotonicClock, WallClock};

/// Earliest wall-clock reading accepted as synchronised (2020-01-01T00:00:00Z).
pub const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32-S3 platform.
#[derive(Clone)]
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Convert a raw unix-seconds reading, rejecting an unset clock.
pub fn synced_utc(unix_secs: i64) -> Option<DateTime<Utc>> {
    if unix_secs < EPOCH_2020 {
        return None;
    }
    DateTime::from_timestamp(unix_secs, 0)
}

impl MonotonicClock for Esp32TimeAdapter {
    fn millis(&self) -> u32 {
        (self.uptime_us() / 1_000) as u32
    }
}

impl WallClock for Esp32TimeAdapter {
    fn now_utc(&self) -> Option<DateTime<Utc>> {
        let since_epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?;
        synced_utc(since_epoch.as_secs() as i64)
    }
}
