//! Unified error type for the Bindicator firmware.
//!
//! A single `Error` enum for the storage and config failures the console
//! reports, plus start-up steps that fail outside any port.  All variants are `Copy`.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

/// Every fallible firmware-level operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Key-value storage failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Peripheral or service initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Init(_) => None,
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
