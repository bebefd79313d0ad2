//! Feedback output and change tracking
//!
//! Output values (ring patterns, motor positions, button LEDs) are written
//! into the hardware model synchronously by bindings. They reach the device
//! when the section is flushed; the change tracker remembers what was sent
//! per control so unchanged values are never transmitted twice.

use crate::types::{ChannelButton, ControlId};
use std::collections::HashMap;

/// Sink for hardware feedback
///
/// Implemented by the transport layer, which encodes the values into the
/// device's wire format.
pub trait SurfaceOutput {
    /// LED ring byte (see `RingDisplayType::encode`)
    fn send_ring(&mut self, section: usize, index: usize, value: u8);

    /// Motor fader target position (14 bit)
    fn send_motor(&mut self, section: usize, index: usize, position: u16);

    /// Channel button LED
    fn send_led(&mut self, section: usize, button: ChannelButton, index: usize, on: bool);

    /// Complete display buffer
    fn send_display(&mut self, section: usize, lines: &[String; 2]);
}

/// Change tracker for feedback output
///
/// Remembers last-sent values per control to avoid redundant sends.
pub struct FeedbackChangeTracker {
    last_values: HashMap<ControlId, u16>,
}

impl FeedbackChangeTracker {
    pub fn new() -> Self {
        Self {
            last_values: HashMap::new(),
        }
    }

    /// Check if value has changed and update tracker
    ///
    /// Returns `Some(value)` if the value changed (should send), `None` if unchanged.
    pub fn update(&mut self, control: ControlId, value: u16) -> Option<u16> {
        if self.last_values.get(&control) == Some(&value) {
            None
        } else {
            self.last_values.insert(control, value);
            Some(value)
        }
    }

    /// Clear all tracked state
    pub fn clear(&mut self) {
        self.last_values.clear();
    }

    /// Number of controls with a known last value
    pub fn len(&self) -> usize {
        self.last_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_values.is_empty()
    }
}

impl Default for FeedbackChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a normalized fader value to a 14-bit motor position
pub fn motor_position(value: f64) -> u16 {
    (value.clamp(0.0, 1.0) * 16383.0).round() as u16
}
