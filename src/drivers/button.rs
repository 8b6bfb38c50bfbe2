//! Polled, debounced button driver with short and long press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The main loop samples the
//! pin every 20 ms through [`ButtonDriver::poll`]; the gesture state
//! machine itself ([`ButtonDriver::tick`]) only sees "pressed" booleans
//! and timestamps, so it runs unchanged on host.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                         | Event        |
//! |-------------|-----------------------------------|--------------|
//! | Short press | Stable press, released < long     | `ShortPress` |
//! | Long press  | Held >= `long_press_ms`           | `LongPress`  |
//!
//! A long press fires once while the button is still held; the release
//! that follows is swallowed.

use embedded_hal::digital::InputPin;

pub const DEBOUNCE_MS: u32 = 50;
pub const DEFAULT_LONG_PRESS_MS: u32 = 3_000;

/// Button events emitted after gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { since_ms: u32 },
    Pressed { since_ms: u32 },
    /// Long press already reported; wait for release.
    Held,
}

pub struct ButtonDriver {
    long_press_ms: u32,
    state: GestureState,
}

impl ButtonDriver {
    pub fn new(long_press_ms: u32) -> Self {
        Self {
            long_press_ms,
            state: GestureState::Idle,
        }
    }

    /// Feed one sample.  `pressed` is the logical (debounce-free) level.
    pub fn tick(&mut self, now_ms: u32, pressed: bool) -> Option<ButtonEvent> {
        match self.state {
            GestureState::Idle => {
                if pressed {
                    self.state = GestureState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            GestureState::DebounceWait { since_ms } => {
                if !pressed {
                    // Bounce or glitch shorter than the debounce window.
                    self.state = GestureState::Idle;
                } else if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = GestureState::Pressed { since_ms };
                }
                None
            }

            GestureState::Pressed { since_ms } => {
                let held_ms = now_ms.wrapping_sub(since_ms);
                if !pressed {
                    self.state = GestureState::Idle;
                    return Some(ButtonEvent::ShortPress);
                }
                if held_ms >= self.long_press_ms {
                    self.state = GestureState::Held;
                    return Some(ButtonEvent::LongPress);
                }
                None
            }

            GestureState::Held => {
                if !pressed {
                    self.state = GestureState::Idle;
                }
                None
            }
        }
    }

    /// Sample an active-low pin.  A failed read counts as released.
    pub fn poll<P: InputPin>(&mut self, pin: &mut P, now_ms: u32) -> Option<ButtonEvent> {
        let pressed = pin.is_low().unwrap_or(false);
        self.tick(now_ms, pressed)
    }
}

impl Default for ButtonDriver {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PRESS_MS)
    }
}
