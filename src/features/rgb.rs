//! RGB strip control
//!
//! One-shot commands gated on `has_rgb_led`. On models without the strip
//! every call is a silent no-op.

use std::sync::Arc;

use streamdock_transport::Transport;
use tracing::debug;

pub struct RgbController {
    transport: Arc<Transport>,
    enabled: bool,
    led_count: u16,
}

impl RgbController {
    pub(crate) fn new(transport: Arc<Transport>, enabled: bool, led_count: u16) -> Self {
        Self {
            transport,
            enabled,
            led_count,
        }
    }

    fn gated(&self) -> bool {
        if !self.enabled || !self.transport.can_write() {
            debug!("rgb command ignored: no strip or transport not writable");
            return false;
        }
        true
    }

    pub fn set_led_brightness(&self, brightness: u8) {
        if self.gated() {
            self.transport.set_led_brightness(brightness);
        }
    }

    /// Set the whole strip to one color.
    pub fn set_led_color(&self, r: u8, g: u8, b: u8) {
        if self.gated() {
            self.transport
                .set_led_color(self.led_count.min(255) as u8, r, g, b);
        }
    }

    /// Return the strip to the firmware default pattern.
    pub fn reset_led_color(&self) {
        if self.gated() {
            self.transport.reset_led_color();
        }
    }
}
