//! Shared scripted HID endpoint for integration tests
//!
//! Records every written report, replays queued input frames, and answers
//! the firmware version query so binding never waits out the full timeout.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use streamdock::streamdock_transport::protocol::{self, HEADER_LEN};
use streamdock::streamdock_transport::{HidDeviceInfo, HidIo, TransportError};

pub struct MockIo {
    handles: MockHandles,
}

#[derive(Clone)]
pub struct MockHandles {
    pub written: Arc<Mutex<Vec<Vec<u8>>>>,
    pub reads: Arc<Mutex<VecDeque<Vec<u8>>>>,
    pub fail_writes: Arc<AtomicBool>,
    firmware: Arc<Mutex<Option<String>>>,
}

impl MockHandles {
    pub fn clear_writes(&self) {
        self.written.lock().clear();
    }

    /// Queue one input frame for the reader.
    pub fn push_frame(&self, frame: Vec<u8>) {
        self.reads.lock().push_back(frame);
    }

    /// Written reports matching an opcode.
    pub fn writes_with_opcode(&self, opcode: u16) -> Vec<Vec<u8>> {
        self.written
            .lock()
            .iter()
            .filter(|r| report_opcode(r) == Some(opcode))
            .cloned()
            .collect()
    }
}

/// Opcode of one written report (header sits after the report id byte).
pub fn report_opcode(report: &[u8]) -> Option<u16> {
    if report.len() < 1 + HEADER_LEN || &report[1..4] != b"CMD" {
        return None;
    }
    Some(u16::from_be_bytes([report[4], report[5]]))
}

/// Target byte of one written report.
pub fn report_target(report: &[u8]) -> u8 {
    report[8]
}

/// Payload of one written report, padding included.
pub fn report_payload(report: &[u8]) -> &[u8] {
    &report[1 + HEADER_LEN..]
}

/// Install the test log subscriber once (`RUST_LOG=debug` to see traffic).
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Scripted endpoint answering firmware queries with `firmware`.
pub fn mock_with_firmware(firmware: &str) -> (Box<MockIo>, MockHandles) {
    init_tracing();
    let handles = MockHandles {
        written: Arc::new(Mutex::new(Vec::new())),
        reads: Arc::new(Mutex::new(VecDeque::new())),
        fail_writes: Arc::new(AtomicBool::new(false)),
        firmware: Arc::new(Mutex::new(Some(firmware.to_string()))),
    };
    (
        Box::new(MockIo {
            handles: handles.clone(),
        }),
        handles,
    )
}

impl HidIo for MockIo {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if self.handles.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::HidError("device unplugged".into()));
        }
        // answer the version query so binding completes immediately
        if report_opcode(data) == Some(protocol::op::VERSION) {
            if let Some(firmware) = self.handles.firmware.lock().clone() {
                let shift = usize::from(data[0] == protocol::REPORT_ID_K1PRO);
                let mut frame = vec![0u8; 64];
                if shift == 1 {
                    frame[0] = protocol::REPORT_ID_K1PRO;
                }
                frame[shift..shift + 3].copy_from_slice(b"ACK");
                frame[shift + 3..shift + 5].copy_from_slice(&protocol::op::VERSION.to_be_bytes());
                frame[shift + 5..shift + 7].copy_from_slice(b"OK");
                let bytes = firmware.as_bytes();
                frame[shift + 7..shift + 7 + bytes.len()].copy_from_slice(bytes);
                self.handles.reads.lock().push_back(frame);
            }
            return Ok(data.len());
        }
        self.handles.written.lock().push(data.to_vec());
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout_ms: i32) -> Result<usize, TransportError> {
        match self.handles.reads.lock().pop_front() {
            Some(frame) => {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                Ok(n)
            }
            None => {
                // a real endpoint blocks for the timeout; don't spin hot
                std::thread::sleep(Duration::from_millis(1));
                Ok(0)
            }
        }
    }

    fn last_error(&self) -> String {
        String::new()
    }
}

/// Endpoint identity for a `(vid, pid)` with the StreamDock vendor usage.
pub fn endpoint(vid: u16, pid: u16, path: &str) -> HidDeviceInfo {
    HidDeviceInfo {
        path: path.to_string(),
        vid,
        pid,
        release: 0x0100,
        usage: 1,
        usage_page: 0xFFA0,
        interface_number: 0,
        serial: Some("SD-TEST-001".to_string()),
        manufacturer: Some("HOTSPOT".to_string()),
        product: Some("HOTSPOT HID".to_string()),
    }
}

/// A well-formed `ACK .. OK` response carrying a hardware code and event
/// value at the model's offsets (`shifted` = K1Pro framing).
pub fn input_frame(hardware: u8, value: u8, shifted: bool) -> Vec<u8> {
    let shift = usize::from(shifted);
    let mut frame = vec![0u8; 64];
    if shifted {
        frame[0] = protocol::REPORT_ID_K1PRO;
    }
    frame[shift..shift + 3].copy_from_slice(b"ACK");
    frame[shift + 5..shift + 7].copy_from_slice(b"OK");
    frame[shift + 9] = hardware;
    frame[shift + 10] = value;
    frame
}

/// Poll until `predicate` holds or the deadline passes.
pub fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    predicate()
}
