//! HID transport layer for Mirabox StreamDock devices
//!
//! This crate owns everything between a typed device command and the USB
//! wire:
//!
//! - a thin adapter over the OS HID API ([`hid`]), behind the [`HidIo`] trait
//!   so tests can substitute a scripted endpoint
//! - the report framing and opcode set ([`protocol`])
//! - the per-device serialized write queue ([`Transport`])
//!
//! Device semantics (geometry, key maps, capability gating) live one crate up;
//! nothing here knows what a key looks like, only how bytes reach the device.

pub mod error;
pub mod hid;
pub mod protocol;

mod transport;

pub use error::TransportError;
pub use hid::{HidBinding, HidDeviceInfo, HidIo, HidapiIo};
pub use protocol::{ReportConfig, REPORT_ID_DEFAULT, REPORT_ID_K1PRO};
pub use transport::{Response, Transport};
