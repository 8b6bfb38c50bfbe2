//! Calendar events client.
//!
//! Implements [`CalendarPort`] by querying the configured events endpoint
//! for the local day and classifying the response with
//! [`crate::calendar::parse_events_response`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: HTTPS GET via `esp_idf_svc::http::client`,
//!   certificates from the IDF bundle.
//! - **all other targets**: no network; every fetch reports
//!   [`CalendarError::WifiUnavailable`].

use chrono::NaiveDate;
use chrono_tz::Tz;
use log::debug;

use crate::app::ports::{CalendarError, CalendarPort, WallClock};
use crate::calendar::day_window_query;
use crate::config::BindicatorConfig;

#[cfg(target_os = "espidf")]
use log::warn;

/// Largest events payload accepted.
#[cfg(target_os = "espidf")]
const MAX_BODY_BYTES: usize = 16 * 1024;

pub struct CalendarClient<W> {
    calendar_url: String,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    api_token: String,
    tz: Tz,
    wall: W,
}

impl<W: WallClock> CalendarClient<W> {
    pub fn new(config: &BindicatorConfig, wall: W) -> Self {
        Self {
            calendar_url: config.calendar_url.as_str().to_owned(),
            api_token: config.api_token.as_str().to_owned(),
            tz: config.tz(),
            wall,
        }
    }

    /// Local calendar date, if the wall clock is set.
    fn today(&self) -> Option<NaiveDate> {
        self.wall
            .now_utc()
            .map(|now| now.with_timezone(&self.tz).date_naive())
    }

    /// Full request URL for `day`.
    pub fn request_url(&self, day: NaiveDate) -> String {
        let separator = if self.calendar_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.calendar_url, separator, day_window_query(day))
    }

    #[cfg(target_os = "espidf")]
    fn get(&self, url: &str) -> Result<Vec<u8>, CalendarError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        if !station_connected() {
            return Err(CalendarError::WifiUnavailable);
        }

        let config = Configuration {
            timeout: Some(core::time::Duration::from_secs(15)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&config).map_err(|e| {
            warn!("Calendar: HTTP client init failed: {:?}", e);
            CalendarError::Transport
        })?;

        let auth = format!("Bearer {}", self.api_token);
        let mut headers = vec![("Accept", "application/json")];
        if !self.api_token.is_empty() {
            headers.push(("Authorization", auth.as_str()));
        }

        conn.initiate_request(Method::Get, url, &headers)
            .map_err(|_| CalendarError::Transport)?;
        conn.initiate_response()
            .map_err(|_| CalendarError::Transport)?;

        let status = conn.status();
        if status != 200 {
            return Err(CalendarError::Http(status));
        }

        let mut body = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let read = conn.read(&mut chunk).map_err(|_| CalendarError::Transport)?;
            if read == 0 {
                break;
            }
            if body.len() + read > MAX_BODY_BYTES {
                warn!("Calendar: response exceeds {} bytes", MAX_BODY_BYTES);
                return Err(CalendarError::Malformed);
            }
            body.extend_from_slice(&chunk[..read]);
        }
        Ok(body)
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&self, _url: &str) -> Result<Vec<u8>, CalendarError> {
        Err(CalendarError::WifiUnavailable)
    }
}

impl<W: WallClock> CalendarPort for CalendarClient<W> {
    fn fetch_collection(&mut self) -> Result<crate::fsm::CollectionState, CalendarError> {
        if self.calendar_url.is_empty() {
            return Err(CalendarError::NotConfigured);
        }
        let day = self.today().ok_or(CalendarError::ClockUnavailable)?;
        let url = self.request_url(day);
        debug!("Calendar: GET {}", url);
        let body = self.get(&url)?;
        crate::calendar::parse_events_response(&body)
    }
}

/// Whether the station is associated with an access point.
#[cfg(target_os = "espidf")]
fn station_connected() -> bool {
    let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
    let rc = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
    rc == esp_idf_svc::sys::ESP_OK
}
