//! Wire protocol for StreamDock devices
//!
//! Every outbound report is `report_id` + a fixed-size frame. The frame opens
//! with a 16-byte command header and continues with payload bytes and zero
//! padding:
//!
//! ```text
//! [0..3)   "CMD"
//! [3..5)   opcode, big-endian
//! [5..7)   total payload length, big-endian
//! [7..8)   target index (key number, layer, LED count, ...)
//! [8..16)  opcode parameters
//! ```
//!
//! Payloads longer than one frame are split into `output_report_size - 16`
//! byte slices; each report repeats the header (the length field always
//! carries the whole payload length) so the device can resynchronize
//! mid-stream. Responses open with `"ACK" <opcode> "OK"`.

use zerocopy::byteorder::big_endian::U16;
use zerocopy::{Immutable, IntoBytes, KnownLayout};

/// Command header magic
pub const CMD_MAGIC: [u8; 3] = *b"CMD";
/// Response magic
pub const ACK_MAGIC: [u8; 3] = *b"ACK";
/// Response status marker following the echoed opcode
pub const OK_MARKER: [u8; 2] = *b"OK";

/// Header length in bytes
pub const HEADER_LEN: usize = 16;

/// Default outbound report id
pub const REPORT_ID_DEFAULT: u8 = 0x00;
/// Report id used by K1Pro-class devices
pub const REPORT_ID_K1PRO: u8 = 0x04;

/// Minimum length of a well-formed response frame
pub const MIN_RESPONSE_LEN: usize = 64;

/// Wire opcodes (big-endian u16, two-ASCII mnemonics)
pub mod op {
    /// Firmware version query
    pub const VERSION: u16 = 0x5652; // "VR"
    /// Wake the screen
    pub const WAKE_SCREEN: u16 = 0x574B; // "WK"
    /// Screen off / standby
    pub const SLEEP: u16 = 0x534C; // "SL"
    /// Session teardown before close
    pub const DISCONNECT: u16 = 0x4443; // "DC"
    /// Key panel brightness
    pub const KEY_BRIGHTNESS: u16 = 0x4C49; // "LI"
    /// Clear a single key tile
    pub const KEY_CLEAR: u16 = 0x4B43; // "KC"
    /// Clear every key tile
    pub const KEY_CLEAR_ALL: u16 = 0x4B41; // "KA"
    /// Present pending framebuffer writes
    pub const REFRESH: u16 = 0x5354; // "ST"
    /// Key tile image payload
    pub const KEY_IMAGE: u16 = 0x4B49; // "KI"
    /// Full-screen encoded background
    pub const BG_IMAGE: u16 = 0x4249; // "BI"
    /// Full-screen raw pixel background
    pub const BG_BITMAP: u16 = 0x4242; // "BB"
    /// Partial-rect animated background frame
    pub const BG_FRAME: u16 = 0x4246; // "BF"
    /// Clear a partial-rect animated layer
    pub const BG_FRAME_CLEAR: u16 = 0x4243; // "BC"
    /// RGB strip brightness
    pub const LED_BRIGHTNESS: u16 = 0x4C42; // "LB"
    /// RGB strip color
    pub const LED_COLOR: u16 = 0x4C43; // "LC"
    /// RGB strip back to firmware default
    pub const LED_RESET: u16 = 0x4C52; // "LR"
    /// Device configuration vector
    pub const CONFIG: u16 = 0x4347; // "CG"
    /// Keepalive ping
    pub const HEARTBEAT: u16 = 0x4842; // "HB"
    /// Runtime mode switch (N1 family)
    pub const MODE_CHANGE: u16 = 0x4D44; // "MD"
    /// Keyboard backlight brightness (K1Pro)
    pub const KB_BRIGHTNESS: u16 = 0x4B42; // "KB"
    /// Keyboard lighting effect (K1Pro)
    pub const KB_EFFECT: u16 = 0x4B45; // "KE"
    /// Keyboard lighting speed (K1Pro)
    pub const KB_SPEED: u16 = 0x4B53; // "KS"
    /// Keyboard RGB backlight color (K1Pro)
    pub const KB_RGB: u16 = 0x4B52; // "KR"
    /// Keyboard OS mode switch (K1Pro)
    pub const KB_OS_MODE: u16 = 0x4B4F; // "KO"
}

/// 16-byte command header, layout fixed by `repr(C)` + zerocopy
#[derive(IntoBytes, Immutable, KnownLayout, Clone, Copy)]
#[repr(C)]
pub struct CommandHeader {
    magic: [u8; 3],
    opcode: U16,
    length: U16,
    target: u8,
    params: [u8; 8],
}

impl CommandHeader {
    pub fn new(opcode: u16, payload_len: u16, target: u8, params: [u8; 8]) -> Self {
        Self {
            magic: CMD_MAGIC,
            opcode: U16::new(opcode),
            length: U16::new(payload_len),
            target,
            params,
        }
    }
}

/// Report sizes for one model
///
/// Sizes exclude the report id byte; the buffer handed to the OS is one byte
/// longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    pub input_report_size: usize,
    pub output_report_size: usize,
    pub report_id: u8,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input_report_size: 512,
            output_report_size: 1024,
            report_id: REPORT_ID_DEFAULT,
        }
    }
}

impl ReportConfig {
    /// Payload bytes carried per report
    pub fn chunk_capacity(&self) -> usize {
        self.output_report_size - HEADER_LEN
    }
}

/// Pack a command into report-sized write buffers.
///
/// Returns one buffer per report, each `1 + output_report_size` bytes: the
/// report id, the header, a payload slice, zero padding.
pub fn frame_command(
    cfg: &ReportConfig,
    opcode: u16,
    target: u8,
    params: [u8; 8],
    payload: &[u8],
) -> Vec<Vec<u8>> {
    let header = CommandHeader::new(opcode, payload.len() as u16, target, params);
    let capacity = cfg.chunk_capacity();
    let chunks: Vec<&[u8]> = if payload.is_empty() {
        vec![&[]]
    } else {
        payload.chunks(capacity).collect()
    };

    chunks
        .into_iter()
        .map(|chunk| {
            let mut report = vec![0u8; 1 + cfg.output_report_size];
            report[0] = cfg.report_id;
            report[1..1 + HEADER_LEN].copy_from_slice(header.as_bytes());
            report[1 + HEADER_LEN..1 + HEADER_LEN + chunk.len()].copy_from_slice(chunk);
            report
        })
        .collect()
}

/// JPEG magic check (`FF D8`)
pub fn is_jpeg_data(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0xFF && data[1] == 0xD8
}

/// PNG magic check (`89 50 4E 47 0D 0A 1A 0A`)
pub fn is_png_data(data: &[u8]) -> bool {
    data.len() >= 8 && data[..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
}

/// Check the `"ACK" <opcode> "OK"` signature of a response frame.
///
/// `offset` is 0 for most models and 1 for K1Pro-class devices, whose
/// responses carry a leading report id byte.
pub fn has_ack_signature(frame: &[u8], offset: usize) -> bool {
    frame.len() >= offset + 7
        && frame[offset..offset + 3] == ACK_MAGIC
        && frame[offset + 5..offset + 7] == OK_MARKER
}
