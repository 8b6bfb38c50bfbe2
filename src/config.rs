//! Device configuration parameters
//!
//! All tunable parameters for the Bindicator.
//! Values are persisted in NVS via [`ConfigPort`](crate::app::ports::ConfigPort).

use chrono_tz::Tz;
use heapless::String;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::fsm::retry::DEFAULT_RETRY_INTERVAL_MS;

/// IANA zone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Europe/London";

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindicatorConfig {
    // --- Collection cycle ---
    /// Local hour (0-23) at which a completed collection rolls over
    pub reset_hour: u8,
    /// IANA time zone name for the reset hour and the calendar day window
    pub timezone: String<32>,

    // --- Timing ---
    /// Minimum gap between calendar attempts while in an error status (ms)
    pub error_retry_interval_ms: u32,
    /// Regular calendar polling interval (ms)
    pub calendar_check_interval_ms: u32,
    /// Hold time that turns a press into a long press (ms)
    pub long_press_ms: u32,

    // --- Network ---
    pub wifi_ssid: String<32>,
    pub wifi_password: String<64>,

    // --- Calendar ---
    /// Events endpoint of the calendar feed
    pub calendar_url: String<256>,
    /// Bearer token sent with calendar requests (may be empty)
    pub api_token: String<256>,
}

impl Default for BindicatorConfig {
    fn default() -> Self {
        Self {
            reset_hour: 3,
            timezone: String::try_from(DEFAULT_TIMEZONE).unwrap_or_default(),

            error_retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS, // 5 min
            calendar_check_interval_ms: 3_600_000,             // 1 h
            long_press_ms: 3_000,

            wifi_ssid: String::new(),
            wifi_password: String::new(),

            calendar_url: String::new(),
            api_token: String::new(),
        }
    }
}

impl BindicatorConfig {
    /// Parsed time zone; falls back to UTC for unknown names.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            warn!("Unknown timezone '{}', using UTC", self.timezone);
            Tz::UTC
        })
    }

    /// Whether station credentials have been provisioned.
    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }
}
