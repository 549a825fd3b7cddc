//! Thin adapter over the OS HID API
//!
//! Everything above this module talks to the [`HidIo`] trait; `hidapi` types
//! never leak further up. Tests drive transports with a scripted mock instead
//! of real hardware.

use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::TransportError;

/// HID usage page shared by all StreamDock vendor interfaces
pub const STREAMDOCK_USAGE_PAGE: u16 = 0xFFA0;
/// HID usage of the vendor interface
pub const STREAMDOCK_USAGE: u16 = 0x01;

/// Identification of one enumerated HID endpoint
#[derive(Debug, Clone, Serialize)]
pub struct HidDeviceInfo {
    /// Platform device path (hidraw node, IOKit path, ...)
    pub path: String,
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Device release number (bcdDevice)
    pub release: u16,
    /// HID usage
    pub usage: u16,
    /// HID usage page
    pub usage_page: u16,
    /// USB interface number
    pub interface_number: i32,
    /// Serial number if available
    pub serial: Option<String>,
    /// Manufacturer string if available
    pub manufacturer: Option<String>,
    /// Product string if available
    pub product: Option<String>,
}

impl HidDeviceInfo {
    /// Check whether this endpoint is the StreamDock vendor interface
    /// (usage 1, usage page 0xFFA0).
    pub fn is_streamdock_usage(&self) -> bool {
        self.usage == STREAMDOCK_USAGE && self.usage_page == STREAMDOCK_USAGE_PAGE
    }
}

/// Raw HID I/O consumed by [`crate::Transport`]
///
/// `read` returns `Ok(0)` on timeout and `Err(..)` on device loss; `write`
/// takes a full buffer whose first byte is the report id.
pub trait HidIo: Send {
    /// Write one report. Returns the number of bytes written.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read one input report with a bounded timeout. `Ok(0)` means timeout.
    fn read(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError>;

    /// Last error text reported by the OS binding.
    fn last_error(&self) -> String;
}

/// `HidIo` over a live hidapi handle
pub struct HidapiIo {
    device: HidDevice,
}

impl HidapiIo {
    pub fn new(device: HidDevice) -> Self {
        Self { device }
    }
}

impl HidIo for HidapiIo {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        Ok(self.device.write(data)?)
    }

    fn read(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError> {
        Ok(self.device.read_timeout(buf, timeout_ms)?)
    }

    fn last_error(&self) -> String {
        match self.device.check_error() {
            Ok(e) => e.to_string(),
            Err(e) => e.to_string(),
        }
    }
}

/// Process-wide hidapi context
///
/// hidapi requires its context to outlive every open handle; keeping one
/// mutex-guarded instance mirrors how the enumerator in the original SDK
/// holds `hid_init()` for the process lifetime.
pub struct HidBinding {
    api: Mutex<HidApi>,
}

impl HidBinding {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            api: Mutex::new(HidApi::new()?),
        })
    }

    /// Enumerate all HID endpoints currently on the bus.
    pub fn enumerate(&self) -> Result<Vec<HidDeviceInfo>, TransportError> {
        let mut api = self.api.lock();
        api.refresh_devices()?;
        Ok(api
            .device_list()
            .map(|d| HidDeviceInfo {
                path: d.path().to_string_lossy().to_string(),
                vid: d.vendor_id(),
                pid: d.product_id(),
                release: d.release_number(),
                usage: d.usage(),
                usage_page: d.usage_page(),
                interface_number: d.interface_number(),
                serial: d.serial_number().map(|s| s.to_string()),
                manufacturer: d.manufacturer_string().map(|s| s.to_string()),
                product: d.product_string().map(|s| s.to_string()),
            })
            .collect())
    }

    /// Open a device by platform path.
    pub fn open(&self, path: &str) -> Result<HidapiIo, TransportError> {
        let api = self.api.lock();
        let cpath = std::ffi::CString::new(path)
            .map_err(|_| TransportError::DeviceNotFound(path.to_string()))?;
        let device = api.open_path(&cpath)?;
        Ok(HidapiIo::new(device))
    }
}
