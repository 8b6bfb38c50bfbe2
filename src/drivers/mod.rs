//! Input and supervision drivers.

pub mod button;
pub mod watchdog;
