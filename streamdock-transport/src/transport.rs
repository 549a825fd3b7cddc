//! Per-device command transport
//!
//! One [`Transport`] owns one open HID handle and a dedicated writer thread.
//! Callers enqueue typed commands and never block on USB latency; the writer
//! drains the queue strictly FIFO, so commands submitted by one thread hit
//! the wire in submission order.
//!
//! A write failure that denotes device loss latches the transport into a
//! disconnected state: `can_write()` turns false, queued and future commands
//! are dropped without touching the wire, and a pending `read` wakes with
//! [`Response::Disconnected`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::hid::HidIo;
use crate::protocol::{self, op, ReportConfig};

/// Result of a bounded-timeout read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// One complete input report
    Data(Vec<u8>),
    /// Nothing arrived within the timeout
    Empty,
    /// The device is gone; no further reads will succeed
    Disconnected,
}

/// Slice of the read timeout spent inside the HID lock, so reads never
/// starve the writer thread for more than a few milliseconds.
const READ_SLICE_MS: i32 = 5;

/// How long `firmware_version` waits for the version response
const VERSION_TIMEOUT_MS: u64 = 500;

struct Task {
    reports: Vec<Vec<u8>>,
    /// Budget for draining all chunks to the OS; overrunning it is device loss
    deadline: Option<Duration>,
    label: &'static str,
}

struct Shared {
    io: Mutex<Box<dyn HidIo>>,
    queue: Mutex<VecDeque<Task>>,
    queue_cv: Condvar,
    running: AtomicBool,
    writable: AtomicBool,
    in_flight: AtomicBool,
    last_error: Mutex<String>,
    cfg: ReportConfig,
}

impl Shared {
    fn mark_disconnected(&self, reason: &str) {
        if self.writable.swap(false, Ordering::SeqCst) {
            warn!("transport disconnected: {reason}");
            *self.last_error.lock() = reason.to_string();
        }
    }
}

/// Serialized command transport for one attached device
pub struct Transport {
    shared: Arc<Shared>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Transport {
    /// Build a transport over an open HID handle.
    pub fn new(io: Box<dyn HidIo>, cfg: ReportConfig) -> Self {
        let shared = Arc::new(Shared {
            io: Mutex::new(io),
            queue: Mutex::new(VecDeque::new()),
            queue_cv: Condvar::new(),
            running: AtomicBool::new(true),
            writable: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
            last_error: Mutex::new(String::new()),
            cfg,
        });

        let worker = shared.clone();
        let writer = std::thread::Builder::new()
            .name("streamdock-writer".into())
            .spawn(move || writer_loop(worker))
            .expect("failed to spawn transport writer thread");

        Self {
            shared,
            writer: Mutex::new(Some(writer)),
        }
    }

    pub fn report_config(&self) -> ReportConfig {
        self.shared.cfg
    }

    /// Whether commands can still reach the device.
    pub fn can_write(&self) -> bool {
        self.shared.writable.load(Ordering::SeqCst)
    }

    /// Last OS/transport error text.
    pub fn last_error(&self) -> String {
        self.shared.last_error.lock().clone()
    }

    /// Drop every command that has not been written yet.
    pub fn clear_task_queue(&self) {
        let dropped = {
            let mut queue = self.shared.queue.lock();
            let n = queue.len();
            queue.clear();
            n
        };
        if dropped > 0 {
            debug!("cleared {dropped} queued transport tasks");
        }
    }

    /// Block until every queued command has been handed to the OS.
    pub fn flush(&self) {
        while self.shared.writable.load(Ordering::SeqCst)
            && (!self.shared.queue.lock().is_empty()
                || self.shared.in_flight.load(Ordering::SeqCst))
        {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Bounded-timeout read of one input report.
    ///
    /// The timeout is consumed in short slices so the writer thread can
    /// interleave writes on the shared handle.
    pub fn read(&self, timeout_ms: i32) -> Response {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms.max(0) as u64);
        let mut buf = vec![0u8; self.shared.cfg.input_report_size + 1];
        loop {
            if !self.shared.writable.load(Ordering::SeqCst) {
                return Response::Disconnected;
            }
            let result = self.shared.io.lock().read(&mut buf, READ_SLICE_MS);
            match result {
                Ok(0) => {
                    if Instant::now() >= deadline {
                        return Response::Empty;
                    }
                }
                Ok(n) => return Response::Data(buf[..n].to_vec()),
                Err(e) => {
                    self.shared.mark_disconnected(&e.to_string());
                    return Response::Disconnected;
                }
            }
        }
    }

    fn submit(
        &self,
        opcode: u16,
        target: u8,
        params: [u8; 8],
        payload: &[u8],
        deadline: Option<Duration>,
        label: &'static str,
    ) {
        if !self.can_write() {
            debug!("dropping {label}: transport not writable");
            return;
        }
        let reports = protocol::frame_command(&self.shared.cfg, opcode, target, params, payload);
        let mut queue = self.shared.queue.lock();
        queue.push_back(Task {
            reports,
            deadline,
            label,
        });
        self.shared.queue_cv.notify_one();
    }

    fn simple(&self, opcode: u16, target: u8, label: &'static str) {
        self.submit(opcode, target, [0; 8], &[], None, label);
    }

    // === Screen power & display control ===

    pub fn wakeup_screen(&self) {
        self.simple(op::WAKE_SCREEN, 0, "wakeup_screen");
    }

    pub fn sleep(&self) {
        self.simple(op::SLEEP, 0, "sleep");
    }

    pub fn disconnect(&self) {
        self.simple(op::DISCONNECT, 0, "disconnect");
    }

    pub fn heartbeat(&self) {
        self.simple(op::HEARTBEAT, 0, "heartbeat");
    }

    pub fn refresh(&self) {
        self.simple(op::REFRESH, 0, "refresh");
    }

    pub fn set_key_brightness(&self, brightness: u8) {
        self.submit(
            op::KEY_BRIGHTNESS,
            0,
            [brightness, 0, 0, 0, 0, 0, 0, 0],
            &[],
            None,
            "set_key_brightness",
        );
    }

    pub fn clear_key(&self, key: u8) {
        self.simple(op::KEY_CLEAR, key, "clear_key");
    }

    pub fn clear_all_keys(&self) {
        self.simple(op::KEY_CLEAR_ALL, 0, "clear_all_keys");
    }

    // === Image payloads ===

    /// Ship an encoded key tile. Container validation happens at the device
    /// layer, which knows the model's key codec.
    pub fn set_key_image_stream(&self, data: &[u8], key: u8) -> Result<(), TransportError> {
        if data.is_empty() {
            return Err(TransportError::ParamInvalid("empty key image payload"));
        }
        self.submit(op::KEY_IMAGE, key, [0; 8], data, None, "set_key_image");
        Ok(())
    }

    /// Full-screen encoded background (always a JPEG container on the wire).
    pub fn set_background_image_stream(
        &self,
        data: &[u8],
        timeout_ms: u32,
    ) -> Result<(), TransportError> {
        if !protocol::is_jpeg_data(data) {
            return Err(TransportError::InvalidImage("background is not JPEG"));
        }
        self.submit(
            op::BG_IMAGE,
            0,
            [0; 8],
            data,
            Some(Duration::from_millis(timeout_ms as u64)),
            "set_background_image",
        );
        Ok(())
    }

    /// Full-screen raw pixel buffer (BGR888 / RGB565 models).
    pub fn set_background_bitmap(
        &self,
        data: &[u8],
        timeout_ms: u32,
    ) -> Result<(), TransportError> {
        if data.is_empty() {
            return Err(TransportError::ParamInvalid("empty background bitmap"));
        }
        self.submit(
            op::BG_BITMAP,
            0,
            [0; 8],
            data,
            Some(Duration::from_millis(timeout_ms as u64)),
            "set_background_bitmap",
        );
        Ok(())
    }

    /// One animated-background frame into the rect `(x, y, w, h)` on `layer`.
    pub fn set_background_frame_stream(
        &self,
        data: &[u8],
        width: u16,
        height: u16,
        x: u16,
        y: u16,
        layer: u8,
    ) -> Result<(), TransportError> {
        if !protocol::is_jpeg_data(data) {
            return Err(TransportError::InvalidImage("background frame is not JPEG"));
        }
        let mut params = [0u8; 8];
        params[0..2].copy_from_slice(&width.to_be_bytes());
        params[2..4].copy_from_slice(&height.to_be_bytes());
        params[4..6].copy_from_slice(&x.to_be_bytes());
        params[6..8].copy_from_slice(&y.to_be_bytes());
        self.submit(
            op::BG_FRAME,
            layer,
            params,
            data,
            None,
            "set_background_frame",
        );
        Ok(())
    }

    pub fn clear_background_frame_stream(&self, position: u8) {
        self.simple(op::BG_FRAME_CLEAR, position, "clear_background_frame");
    }

    // === RGB strip ===

    pub fn set_led_brightness(&self, brightness: u8) {
        self.submit(
            op::LED_BRIGHTNESS,
            0,
            [brightness, 0, 0, 0, 0, 0, 0, 0],
            &[],
            None,
            "set_led_brightness",
        );
    }

    /// Set the first `count` LEDs to one color. The count rides in the
    /// target byte, per the header layout.
    pub fn set_led_color(&self, count: u8, r: u8, g: u8, b: u8) {
        self.submit(
            op::LED_COLOR,
            count,
            [r, g, b, 0, 0, 0, 0, 0],
            &[],
            None,
            "set_led_color",
        );
    }

    pub fn reset_led_color(&self) {
        self.simple(op::LED_RESET, 0, "reset_led_color");
    }

    // === Configuration & modes ===

    pub fn set_device_config(&self, configs: &[u8]) -> Result<(), TransportError> {
        if configs.is_empty() {
            return Err(TransportError::ParamInvalid("empty config vector"));
        }
        self.submit(op::CONFIG, 0, [0; 8], configs, None, "set_device_config");
        Ok(())
    }

    pub fn change_mode(&self, mode: u8) {
        self.submit(
            op::MODE_CHANGE,
            0,
            [mode, 0, 0, 0, 0, 0, 0, 0],
            &[],
            None,
            "change_mode",
        );
    }

    // === K1Pro keyboard backlight ===

    pub fn set_keyboard_backlight_brightness(&self, brightness: u8) {
        self.submit(
            op::KB_BRIGHTNESS,
            0,
            [brightness, 0, 0, 0, 0, 0, 0, 0],
            &[],
            None,
            "set_keyboard_backlight_brightness",
        );
    }

    pub fn set_keyboard_lighting_effect(&self, effect: u8) {
        self.submit(
            op::KB_EFFECT,
            0,
            [effect, 0, 0, 0, 0, 0, 0, 0],
            &[],
            None,
            "set_keyboard_lighting_effect",
        );
    }

    pub fn set_keyboard_lighting_speed(&self, speed: u8) {
        self.submit(
            op::KB_SPEED,
            0,
            [speed, 0, 0, 0, 0, 0, 0, 0],
            &[],
            None,
            "set_keyboard_lighting_speed",
        );
    }

    pub fn set_keyboard_rgb_backlight(&self, r: u8, g: u8, b: u8) {
        self.submit(
            op::KB_RGB,
            0,
            [r, g, b, 0, 0, 0, 0, 0],
            &[],
            None,
            "set_keyboard_rgb_backlight",
        );
    }

    pub fn keyboard_os_mode_switch(&self, os_mode: u8) {
        self.submit(
            op::KB_OS_MODE,
            0,
            [os_mode, 0, 0, 0, 0, 0, 0, 0],
            &[],
            None,
            "keyboard_os_mode_switch",
        );
    }

    // === Identity ===

    /// Query the firmware version string.
    ///
    /// Sends the version opcode, then scans responses for the matching ACK
    /// until [`VERSION_TIMEOUT_MS`] elapses. Returns an empty string if the
    /// device never answers.
    pub fn firmware_version(&self) -> String {
        self.simple(op::VERSION, 0, "firmware_version");
        self.flush();

        let ack_offset = if self.shared.cfg.report_id == protocol::REPORT_ID_K1PRO {
            1
        } else {
            0
        };
        let deadline = Instant::now() + Duration::from_millis(VERSION_TIMEOUT_MS);
        while Instant::now() < deadline {
            match self.read(100) {
                Response::Data(frame) => {
                    if frame.len() >= protocol::MIN_RESPONSE_LEN
                        && protocol::has_ack_signature(&frame, ack_offset)
                        && u16::from_be_bytes([frame[ack_offset + 3], frame[ack_offset + 4]])
                            == op::VERSION
                    {
                        let body = &frame[ack_offset + 7..];
                        let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
                        return String::from_utf8_lossy(&body[..end]).trim().to_string();
                    }
                }
                Response::Empty => {}
                Response::Disconnected => break,
            }
        }
        String::new()
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.queue_cv.notify_all();
        if let Some(handle) = self.writer.lock().take() {
            let _ = handle.join();
        }
    }
}

fn writer_loop(shared: Arc<Shared>) {
    debug!("transport writer thread started");
    loop {
        let task = {
            let mut queue = shared.queue.lock();
            while queue.is_empty() && shared.running.load(Ordering::SeqCst) {
                shared.queue_cv.wait(&mut queue);
            }
            if !shared.running.load(Ordering::SeqCst) {
                break;
            }
            let task = queue.pop_front().expect("queue non-empty after wait");
            shared.in_flight.store(true, Ordering::SeqCst);
            task
        };

        if shared.writable.load(Ordering::SeqCst) {
            let started = Instant::now();
            for report in &task.reports {
                if let Some(deadline) = task.deadline {
                    if started.elapsed() > deadline {
                        shared.mark_disconnected("write deadline exceeded");
                        break;
                    }
                }
                let result = shared.io.lock().write(report);
                match result {
                    Ok(_) => {}
                    Err(e) => {
                        let os_text = shared.io.lock().last_error();
                        let reason = if os_text.is_empty() {
                            e.to_string()
                        } else {
                            os_text
                        };
                        shared.mark_disconnected(&reason);
                        break;
                    }
                }
            }
            if !shared.writable.load(Ordering::SeqCst) {
                debug!("dropping remainder of {} after device loss", task.label);
            }
        }
        shared.in_flight.store(false, Ordering::SeqCst);
    }
    debug!("transport writer thread exiting");
}
