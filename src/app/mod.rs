//! Application core — domain logic behind port traits.
//!
//! The business rules for the Bindicator: status transitions with their
//! persistence and display side effects, the polling gate and cadence.
//! All interaction with hardware and the network happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod persistence;
pub mod poller;
pub mod ports;
pub mod service;
pub mod shared;
