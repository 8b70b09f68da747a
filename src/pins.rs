//! Channel and GPIO assignments.
//!
//! Task bodies address hardware by logical [`ChannelId`]; the GPIO numbers
//! below are only consulted when the ESP-IDF binary builds its pin drivers.

use crate::app::ports::ChannelId;

// ---------------------------------------------------------------------------
// Logical channels
// ---------------------------------------------------------------------------

/// Push-button input sampled by `ButtonTask`.
pub const BUTTON_CHANNEL: ChannelId = ChannelId(0);
/// LED output driven by `LedTask`.
pub const LED_CHANNEL: ChannelId = ChannelId(1);

// ---------------------------------------------------------------------------
// ESP32-S3 GPIO numbers
// ---------------------------------------------------------------------------

/// Momentary switch to GND, internal pull-up: LOW = pressed.
pub const BUTTON_GPIO: i32 = 9;
/// On-board LED, active HIGH.
pub const LED_GPIO: i32 = 2;
