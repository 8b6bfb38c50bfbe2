//! Fuzz target: calendar events response parser
//!
//! Feeds arbitrary bytes to `parse_events_response` and verifies:
//! - No panics on malformed, truncated or non-UTF-8 bodies
//! - Failures are always `CalendarError::Malformed`
//! - Parsing is deterministic
//!
//! cargo fuzz run fuzz_calendar_response

#![no_main]

use bindicator::app::ports::CalendarError;
use bindicator::calendar::parse_events_response;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let first = parse_events_response(data);
    if let Err(e) = &first {
        assert!(
            matches!(e, CalendarError::Malformed),
            "unexpected parse error {e:?}"
        );
    }
    assert_eq!(first, parse_events_response(data));
});
