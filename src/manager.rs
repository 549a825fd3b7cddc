//! Device registry and hot-plug monitor
//!
//! The manager keys live devices by HID path. `enumerate` diffs the bus
//! against the registry: paths that vanished are dropped (tearing down their
//! controllers and transport), new supported endpoints are bound. `listen`
//! runs a monitor thread that reacts to udev hidraw events on Linux and
//! falls back to interval polling anywhere the event stream is unavailable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use streamdock_transport::{HidBinding, HidDeviceInfo, HidIo, TransportError};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::device::Device;
use crate::error::DeviceError;
use crate::features::animation::SCHEDULER_TICK;
use crate::features::heartbeat::HEARTBEAT_PERIOD;

/// Tunable timeouts for every device this manager binds
#[derive(Debug, Clone)]
pub struct ManagerPolicy {
    /// Bounded-timeout read in the input loop
    pub read_timeout_ms: i32,
    /// Budget for draining a background image to the OS
    pub background_write_timeout_ms: u32,
    /// Keepalive period
    pub heartbeat_period: Duration,
    /// Animation scheduler tick
    pub scheduler_tick: Duration,
    /// Bus polling interval when no event stream is available
    pub poll_interval: Duration,
}

impl Default for ManagerPolicy {
    fn default() -> Self {
        Self {
            read_timeout_ms: 100,
            background_write_timeout_ms: 3000,
            heartbeat_period: HEARTBEAT_PERIOD,
            scheduler_tick: SCHEDULER_TICK,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Source of HID endpoints
///
/// The production implementation wraps hidapi; tests substitute a scripted
/// bus to drive plug/unplug scenarios.
pub trait Bus: Send + Sync {
    fn endpoints(&self) -> Result<Vec<HidDeviceInfo>, TransportError>;
    fn open(&self, path: &str) -> Result<Box<dyn HidIo>, TransportError>;
}

struct HidapiBus {
    binding: HidBinding,
}

impl Bus for HidapiBus {
    fn endpoints(&self) -> Result<Vec<HidDeviceInfo>, TransportError> {
        self.binding.enumerate()
    }

    fn open(&self, path: &str) -> Result<Box<dyn HidIo>, TransportError> {
        Ok(Box::new(self.binding.open(path)?))
    }
}

type ConnectCallback = Arc<dyn Fn(Arc<Device>) + Send + Sync>;

/// Process-wide registry of live devices
pub struct DeviceManager {
    bus: Box<dyn Bus>,
    devices: Mutex<HashMap<String, Arc<Device>>>,
    policy: ManagerPolicy,
    listening: AtomicBool,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceManager {
    /// Manager over the real HID bus.
    pub fn new(policy: ManagerPolicy) -> Result<Self, DeviceError> {
        let binding = HidBinding::new()?;
        Ok(Self::with_bus(Box::new(HidapiBus { binding }), policy))
    }

    /// Manager over a custom endpoint source.
    pub fn with_bus(bus: Box<dyn Bus>, policy: ManagerPolicy) -> Self {
        Self {
            bus,
            devices: Mutex::new(HashMap::new()),
            policy,
            listening: AtomicBool::new(false),
            monitor: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &ManagerPolicy {
        &self.policy
    }

    /// Scan the bus, drop vanished devices, bind new matches. Returns the
    /// devices added by this scan.
    pub fn enumerate(&self) -> Vec<Arc<Device>> {
        let endpoints = match self.bus.endpoints() {
            Ok(endpoints) => endpoints,
            Err(e) => {
                warn!("bus enumeration failed: {e}");
                return Vec::new();
            }
        };

        let valid: HashMap<String, HidDeviceInfo> = endpoints
            .into_iter()
            .filter(|e| catalog::is_supported(e.vid, e.pid) && e.is_streamdock_usage())
            .map(|e| (e.path.clone(), e))
            .collect();

        let mut added = Vec::new();
        let mut devices = self.devices.lock();

        devices.retain(|path, _| {
            let keep = valid.contains_key(path);
            if !keep {
                info!("device disconnected: {path}");
            }
            keep
        });

        for (path, endpoint) in valid {
            if devices.contains_key(&path) {
                continue;
            }
            // filter above guarantees a catalog hit
            let spec = catalog::lookup(endpoint.vid, endpoint.pid).expect("catalog entry");
            match self.bus.open(&path) {
                Ok(io) => {
                    let device = Arc::new(Device::from_io(io, &endpoint, spec, &self.policy));
                    devices.insert(path, device.clone());
                    added.push(device);
                }
                Err(e) => warn!("failed to open {path}: {e}"),
            }
        }

        debug!("registry holds {} devices", devices.len());
        added
    }

    /// Snapshot of every live device.
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.lock().values().cloned().collect()
    }

    /// Look up one device by HID path.
    pub fn device_at(&self, path: &str) -> Option<Arc<Device>> {
        self.devices.lock().get(path).cloned()
    }

    pub fn device_count(&self) -> usize {
        self.devices.lock().len()
    }

    fn remove_path(&self, path: &str) {
        if self.devices.lock().remove(path).is_some() {
            info!("device removed: {path}");
        }
    }

    /// Start the hot-plug monitor. `on_connect` runs on the monitor thread
    /// for every newly bound device, including those found by the initial
    /// scan the monitor performs.
    pub fn listen(self: &Arc<Self>, on_connect: impl Fn(Arc<Device>) + Send + Sync + 'static) {
        if self.listening.swap(true, Ordering::SeqCst) {
            debug!("monitor already running");
            return;
        }
        let manager = self.clone();
        let callback: ConnectCallback = Arc::new(on_connect);
        let handle = std::thread::Builder::new()
            .name("streamdock-monitor".into())
            .spawn(move || monitor_loop(manager, callback))
            .expect("failed to spawn hot-plug monitor thread");
        *self.monitor.lock() = Some(handle);
    }

    /// Stop the monitor thread and wait for it to exit.
    pub fn stop_listen(&self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.monitor.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.monitor.lock().take() {
            let _ = handle.join();
        }
    }
}

#[cfg(target_os = "linux")]
fn monitor_loop(manager: Arc<DeviceManager>, on_connect: ConnectCallback) {
    for device in manager.enumerate() {
        on_connect(device);
    }
    if let Err(e) = watch_udev(&manager, &on_connect) {
        warn!("udev monitor unavailable ({e}); falling back to polling");
        poll_loop(&manager, &on_connect);
    }
}

#[cfg(not(target_os = "linux"))]
fn monitor_loop(manager: Arc<DeviceManager>, on_connect: ConnectCallback) {
    for device in manager.enumerate() {
        on_connect(device);
    }
    poll_loop(&manager, &on_connect);
}

/// React to hidraw add/remove events pushed by udev.
#[cfg(target_os = "linux")]
fn watch_udev(manager: &Arc<DeviceManager>, on_connect: &ConnectCallback) -> Result<(), DeviceError> {
    use std::os::fd::{AsRawFd, BorrowedFd};

    let monitor = udev::MonitorBuilder::new()
        .and_then(|b| b.match_subsystem("hidraw"))
        .and_then(|b| b.listen())
        .map_err(|e| DeviceError::Monitor(e.to_string()))?;

    info!("udev hidraw monitor started");
    while manager.listening.load(Ordering::SeqCst) {
        let fd = unsafe { BorrowedFd::borrow_raw(monitor.as_raw_fd()) };
        let mut fds = [nix::poll::PollFd::new(fd, nix::poll::PollFlags::POLLIN)];
        match nix::poll::poll(&mut fds, nix::poll::PollTimeout::from(500u16)) {
            Ok(0) => continue,
            Ok(_) => {
                for event in monitor.iter() {
                    match event.event_type() {
                        udev::EventType::Add => {
                            for device in manager.enumerate() {
                                info!("device connected: {}", device.path());
                                on_connect(device);
                            }
                        }
                        udev::EventType::Remove => {
                            if let Some(node) = event.devnode() {
                                manager.remove_path(&node.to_string_lossy());
                            }
                        }
                        _ => {}
                    }
                }
            }
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(DeviceError::Monitor(e.to_string())),
        }
    }
    Ok(())
}

/// Diff the bus on a fixed interval and synthesize add/remove events.
fn poll_loop(manager: &Arc<DeviceManager>, on_connect: &ConnectCallback) {
    info!("hot-plug polling started");
    while manager.listening.load(Ordering::SeqCst) {
        for device in manager.enumerate() {
            info!("device connected: {}", device.path());
            on_connect(device);
        }
        // sleep in short slices so stop_listen returns promptly
        let mut waited = Duration::ZERO;
        let slice = Duration::from_millis(200);
        while waited < manager.policy.poll_interval && manager.listening.load(Ordering::SeqCst) {
            std::thread::sleep(slice);
            waited += slice;
        }
    }
}
