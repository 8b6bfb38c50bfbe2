//! GPIO assignments for the Bindicator board.
//!
//! Single source of truth; drivers reference this module rather than
//! hard-coding pin numbers.

/// "Bin taken out" push button.  The ESP32 BOOT button, active LOW with
/// the internal pull-up.
pub const BUTTON_GPIO: i32 = 0;

/// Data line of the WS2812 LED matrix (driven by the display layer).
pub const MATRIX_DATA_GPIO: i32 = 14;
