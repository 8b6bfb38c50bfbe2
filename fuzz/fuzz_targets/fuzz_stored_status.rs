//! Fuzz target: persisted `state` decoding
//!
//! Whatever bytes a worn or half-written flash page returns, decoding must
//! not panic and must only ever yield one of the eight known statuses.
//!
//! cargo fuzz run fuzz_stored_status

#![no_main]

use bindicator::app::persistence::decode_status;
use bindicator::fsm::CollectionStatus;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(status) = decode_status(data) {
        assert!(CollectionStatus::ALL.contains(&status));
        assert_eq!(CollectionStatus::from_raw(status.raw()), Some(status));
    }
});
