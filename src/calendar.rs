//! Calendar events payload → collection answer.
//!
//! The events endpoint returns the day's entries as
//!
//! ```text
//! { "items": [ { "summary": "Bin day (recycling)" }, ... ] }
//! ```
//!
//! Bins are recognised by a tag in the event summary.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::app::ports::CalendarError;
use crate::fsm::CollectionState;

pub const RECYCLING_TAG: &str = "(recycling)";
pub const RUBBISH_TAG: &str = "(rubbish)";

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<EventItem>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    #[serde(default)]
    summary: Option<String>,
}

/// Classify event summaries.  Recycling wins when both bins are tagged.
pub fn classify<'a>(summaries: impl IntoIterator<Item = &'a str>) -> CollectionState {
    let mut rubbish = false;
    for summary in summaries {
        if summary.contains(RECYCLING_TAG) {
            return CollectionState::RecyclingDue;
        }
        rubbish |= summary.contains(RUBBISH_TAG);
    }
    if rubbish {
        CollectionState::RubbishDue
    } else {
        CollectionState::NoCollection
    }
}

/// Parse a raw events response body.
pub fn parse_events_response(body: &[u8]) -> Result<CollectionState, CalendarError> {
    let response: EventsResponse =
        serde_json::from_slice(body).map_err(|_| CalendarError::Malformed)?;
    Ok(classify(
        response.items.iter().filter_map(|item| item.summary.as_deref()),
    ))
}

/// Query string selecting single events on `day`.
pub fn day_window_query(day: NaiveDate) -> String {
    let date = day.format("%Y-%m-%d");
    format!("timeMin={date}T00:00:00Z&timeMax={date}T23:59:59Z&singleEvents=true")
}
