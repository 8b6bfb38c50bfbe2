//! Durable status record on top of [`StoragePort`].
//!
//! One schema only, namespace [`NAMESPACE`]:
//!
//! | key              | encoding            | absent / invalid |
//! |------------------|---------------------|------------------|
//! | `state`          | postcard `u8`       | `LOADING`        |
//! | `completed_time` | postcard `i64` secs | `0`              |

use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ports::{StorageError, StoragePort};
use crate::fsm::CollectionStatus;

pub const NAMESPACE: &str = "bindicator";
pub const KEY_STATE: &str = "state";
pub const KEY_COMPLETED_TIME: &str = "completed_time";

/// Largest postcard encoding of any value stored here (i64 varint).
const MAX_VALUE_LEN: usize = 10;

/// The persisted pair, as read back at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredStatus {
    pub status: CollectionStatus,
    pub completed_at: i64,
}

impl Default for StoredStatus {
    fn default() -> Self {
        Self {
            status: CollectionStatus::Loading,
            completed_at: 0,
        }
    }
}

/// Decode a raw `state` value.  `None` for anything that is not a known status.
pub fn decode_status(bytes: &[u8]) -> Option<CollectionStatus> {
    let raw: u8 = postcard::from_bytes(bytes).ok()?;
    CollectionStatus::from_raw(raw)
}

/// Load the status record, substituting safe defaults for anything
/// missing or unreadable.
pub fn load(storage: &impl StoragePort) -> StoredStatus {
    let mut buf = [0u8; MAX_VALUE_LEN];

    let status = match storage.read(NAMESPACE, KEY_STATE, &mut buf) {
        Ok(len) => decode_status(&buf[..len]).unwrap_or_else(|| {
            warn!("Persist: invalid stored state {:?}, defaulting to LOADING", &buf[..len]);
            CollectionStatus::Loading
        }),
        Err(StorageError::NotFound) => {
            info!("Persist: no stored state, starting in LOADING");
            CollectionStatus::Loading
        }
        Err(e) => {
            warn!("Persist: state read failed ({}), defaulting to LOADING", e);
            CollectionStatus::Loading
        }
    };

    let completed_at = match read_value::<i64>(storage, KEY_COMPLETED_TIME) {
        Ok(secs) => secs,
        Err(StorageError::NotFound) => 0,
        Err(e) => {
            warn!("Persist: completed_time unreadable ({}), using 0", e);
            0
        }
    };

    StoredStatus {
        status,
        completed_at: if status == CollectionStatus::Completed {
            completed_at
        } else {
            0
        },
    }
}

/// Write both fields.  Stops at the first failing key.
///
/// The timestamp goes first: a torn write then leaves either the old
/// status (whose timestamp `load` ignores) or a complete new record,
/// never `COMPLETED` beside a stale time.
pub fn save(
    storage: &mut impl StoragePort,
    status: CollectionStatus,
    completed_at: i64,
) -> Result<(), StorageError> {
    write_value(storage, KEY_COMPLETED_TIME, &completed_at)?;
    write_value(storage, KEY_STATE, &status.raw())
}

/// Remove the record entirely (maintenance "clear").
pub fn forget(storage: &mut impl StoragePort) -> Result<(), StorageError> {
    storage.delete(NAMESPACE, KEY_STATE)?;
    storage.delete(NAMESPACE, KEY_COMPLETED_TIME)
}

fn read_value<T: DeserializeOwned>(storage: &impl StoragePort, key: &str) -> Result<T, StorageError> {
    let mut buf = [0u8; MAX_VALUE_LEN];
    let len = storage.read(NAMESPACE, key, &mut buf)?;
    postcard::from_bytes(&buf[..len]).map_err(|_| StorageError::Encoding)
}

fn write_value<T: Serialize>(
    storage: &mut impl StoragePort,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let mut buf = [0u8; MAX_VALUE_LEN];
    let bytes = postcard::to_slice(value, &mut buf).map_err(|_| StorageError::Encoding)?;
    storage.write(NAMESPACE, key, bytes)
}
