//! StreamDock XL
//!
//! The big unit: 32 keys on a 1024×600 panel, four toggle switches, a
//! 6-LED strip and the configuration vector.

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::{ReportConfig, REPORT_ID_DEFAULT};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, ModelFamily};
use crate::events::Event;

const INPUT_MAP: &[(u16, u8)] = &[
    // keys count bottom-left, left to right then bottom to top
    (1, 0x19),
    (2, 0x1A),
    (3, 0x1B),
    (4, 0x1C),
    (5, 0x1D),
    (6, 0x1E),
    (7, 0x1F),
    (8, 0x20),
    (9, 0x11),
    (10, 0x12),
    (11, 0x13),
    (12, 0x14),
    (13, 0x15),
    (14, 0x16),
    (15, 0x17),
    (16, 0x18),
    (17, 0x09),
    (18, 0x0A),
    (19, 0x0B),
    (20, 0x0C),
    (21, 0x0D),
    (22, 0x0E),
    (23, 0x0F),
    (24, 0x10),
    (25, 0x01),
    (26, 0x02),
    (27, 0x03),
    (28, 0x04),
    (29, 0x05),
    (30, 0x06),
    (31, 0x07),
    (32, 0x08),
    // toggle switches, left to right: up edges then down edges
    (33, 0x21),
    (34, 0x23),
    (35, 0x24),
    (36, 0x26),
];

fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x20, 0x01) => Event::KeyPress,
        (0x01..=0x20, 0x00) => Event::KeyRelease,
        (0x21 | 0x24, 0x00) => Event::ToggleUp,
        (0x23 | 0x26, 0x00) => Event::ToggleDown,
        _ => Event::Any,
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::Xl,
    ids: &[(0x5548, 0x1028), (0x5548, 0x1031)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 1024,
        report_id: REPORT_ID_DEFAULT,
    },
    display: (1024, 600),
    key_size: (80, 80),
    key_range: (1, 32),
    key_rotation: 180.0,
    bg_rotation: 180.0,
    key_flips: (false, false),
    bg_flips: (false, false),
    key_codec: ImageCodec::Jpeg,
    bg_codec: ImageCodec::Jpeg,
    bg_raw_format: RawFormat::Bgr888,
    caps: Capabilities {
        is_dual_device: true,
        has_rgb_led: true,
        supports_background_gif: true,
        supports_config: true,
        led_count: 6,
        ..Capabilities::NONE
    },
    input_map: INPUT_MAP,
    decode,
    firmware_adjust: None,
};
