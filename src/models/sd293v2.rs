//! StreamDock 293 V2
//!
//! The oldest supported unit: 15 keys over an 800×480 panel, content rotated
//! 180°, background shipped as a raw BGR888 bitmap instead of a JPEG.

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::{ReportConfig, REPORT_ID_DEFAULT};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, ModelFamily};
use crate::events::Event;

/// Keys count bottom-left, left to right then bottom to top
const INPUT_MAP: &[(u16, u8)] = &[
    (1, 0x0B),
    (2, 0x0C),
    (3, 0x0D),
    (4, 0x0E),
    (5, 0x0F),
    (6, 0x06),
    (7, 0x07),
    (8, 0x08),
    (9, 0x09),
    (10, 0x0A),
    (11, 0x01),
    (12, 0x02),
    (13, 0x03),
    (14, 0x04),
    (15, 0x05),
];

fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x0F, 0x01) => Event::KeyPress,
        (0x01..=0x0F, 0x00) => Event::KeyRelease,
        _ => Event::Any,
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::Sd293,
    ids: &[(0x5500, 0x1001)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 512,
        report_id: REPORT_ID_DEFAULT,
    },
    display: (800, 480),
    key_size: (100, 100),
    key_range: (1, 15),
    key_rotation: 180.0,
    bg_rotation: 180.0,
    key_flips: (false, false),
    bg_flips: (false, false),
    key_codec: ImageCodec::Jpeg,
    bg_codec: ImageCodec::Raw,
    bg_raw_format: RawFormat::Bgr888,
    caps: Capabilities::NONE,
    input_map: INPUT_MAP,
    decode,
    firmware_adjust: None,
};
