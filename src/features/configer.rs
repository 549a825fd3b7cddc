//! Device configuration vector
//!
//! One-shot writes gated on `supports_config`. Vectors come from
//! [`crate::device_config::build_config`].

use std::sync::Arc;

use streamdock_transport::Transport;
use tracing::debug;

pub struct ConfigController {
    transport: Arc<Transport>,
    enabled: bool,
}

impl ConfigController {
    pub(crate) fn new(transport: Arc<Transport>, enabled: bool) -> Self {
        Self { transport, enabled }
    }

    pub fn set_device_config(&self, configs: &[u8]) {
        if !self.enabled || !self.transport.can_write() {
            debug!("config command ignored: unsupported or transport not writable");
            return;
        }
        if let Err(e) = self.transport.set_device_config(configs) {
            debug!("config rejected: {e}");
        }
    }
}
