//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter           | Implements         | Connects to                |
//! |-------------------|--------------------|----------------------------|
//! | `nvs`             | ConfigPort         | NVS / in-memory store      |
//! |                   | StoragePort        |                            |
//! | `time`            | WallClock          | SNTP-synced system time    |
//! |                   | MonotonicClock     | ESP32 high-res timer       |
//! | `calendar_client` | CalendarPort       | HTTPS calendar events API  |

pub mod calendar_client;
pub mod nvs;
pub mod time;
