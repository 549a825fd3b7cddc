//! Host-side SDK for Mirabox StreamDock devices
//!
//! Discovers StreamDock macropads and console decks on the local HID bus,
//! binds a model-specific driver for each, and drives their displays,
//! lighting and input surfaces:
//!
//! - [`DeviceManager`] — path-keyed registry plus a hot-plug monitor
//! - [`Device`] — the per-unit driver: images, animations, brightness,
//!   RGB, configuration, input listeners
//! - [`catalog`] / [`models`] — `(vid, pid)` → model specification
//!
//! The wire layer lives in `streamdock-transport`, the rendering pipeline in
//! `streamdock-image`; this crate composes them into the running device.
//!
//! ```no_run
//! use std::sync::Arc;
//! use streamdock::{DeviceManager, Event, ManagerPolicy};
//!
//! let manager = Arc::new(DeviceManager::new(ManagerPolicy::default())?);
//! manager.listen(|device| {
//!     device.set_key_brightness(80);
//!     device.set_key_image_file("icon.png", 6);
//!     device.register_listener(
//!         6,
//!         Event::KeyPress,
//!         Arc::new(|key, _| println!("key {key} pressed")),
//!         false,
//!     );
//!     device.start_input_loop();
//!     device.start_heartbeat();
//! });
//! # Ok::<(), streamdock::DeviceError>(())
//! ```

pub mod catalog;
pub mod descriptor;
pub mod device;
pub mod device_config;
pub mod error;
pub mod events;
pub mod features;
pub mod manager;
pub mod models;

pub use catalog::{is_supported, lookup, ModelSpec, MODELS};
pub use descriptor::{Capabilities, DeviceDescriptor, ModelFamily};
pub use device::Device;
pub use device_config::{build_config, ConfigSchema, ConfigState, N4ProConfig};
pub use error::{DeviceError, PipelineError, TransportError};
pub use events::{Event, EventCallback, RawCallback};
pub use features::{Track, BACKGROUND_TRACK};
pub use manager::{Bus, DeviceManager, ManagerPolicy};

// the wire and pipeline layers are part of the public surface
pub use streamdock_image;
pub use streamdock_transport;
