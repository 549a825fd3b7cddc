//! StreamDock 293s V3
//!
//! 15 keys plus a three-slot second screen. The second screen is
//! display-only: its keys take images but never report press events.

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::{ReportConfig, REPORT_ID_DEFAULT};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, ModelFamily};
use crate::events::Event;

/// Keys count top-right, top to bottom then right to left
const INPUT_MAP: &[(u16, u8)] = &[
    (1, 0x01),
    (2, 0x02),
    (3, 0x03),
    (4, 0x04),
    (5, 0x05),
    (6, 0x06),
    (7, 0x07),
    (8, 0x08),
    (9, 0x09),
    (10, 0x0A),
    (11, 0x0B),
    (12, 0x0C),
    (13, 0x0D),
    (14, 0x0E),
    (15, 0x0F),
];

fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x0F, 0x01) => Event::KeyPress,
        (0x01..=0x0F, 0x00) => Event::KeyRelease,
        _ => Event::Any,
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::Sd293s,
    ids: &[(0x6603, 0x1014)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 1024,
        report_id: REPORT_ID_DEFAULT,
    },
    display: (854, 480),
    key_size: (96, 96),
    key_range: (1, 15),
    key_rotation: 270.0,
    bg_rotation: 270.0,
    key_flips: (false, false),
    bg_flips: (false, false),
    key_codec: ImageCodec::Jpeg,
    bg_codec: ImageCodec::Jpeg,
    bg_raw_format: RawFormat::Bgr888,
    caps: Capabilities {
        is_dual_device: true,
        has_second_screen: true,
        min_second_key: 16,
        max_second_key: 18,
        second_screen_width: 80,
        second_screen_height: 80,
        ..Capabilities::NONE
    },
    input_map: INPUT_MAP,
    decode,
    firmware_adjust: None,
};
