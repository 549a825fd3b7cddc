//! StreamDock M3
//!
//! 15 keys on an 854×480 panel rotated −90°, three knobs on the side.
//! Key tiles are PNG, which keeps icon transparency all the way to the
//! panel.

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::{ReportConfig, REPORT_ID_DEFAULT};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, ModelFamily};
use crate::events::Event;

const INPUT_MAP: &[(u16, u8)] = &[
    // keys count bottom-left, left to right then bottom to top
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
    // knob rotations bottom to top: even indices left, odd indices right
    (16, 0xA0),
    (17, 0xA1),
    (18, 0x90),
    (19, 0x91),
    (20, 0x50),
    (21, 0x51),
    // knob presses bottom to top
    (22, 0x37),
    (23, 0x33),
    (24, 0x35),
];

fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x0F, 0x01) => Event::KeyPress,
        (0x01..=0x0F, 0x00) => Event::KeyRelease,
        (0xA0 | 0x90 | 0x50, 0x00) => Event::KnobLeft,
        (0xA1 | 0x91 | 0x51, 0x00) => Event::KnobRight,
        (0x37 | 0x33 | 0x35, 0x01) => Event::KnobPress,
        _ => Event::Any,
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::M3,
    ids: &[(0x5548, 0x1020)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 1024,
        report_id: REPORT_ID_DEFAULT,
    },
    display: (854, 480),
    key_size: (96, 96),
    key_range: (1, 15),
    key_rotation: -90.0,
    bg_rotation: -90.0,
    key_flips: (false, false),
    bg_flips: (false, false),
    key_codec: ImageCodec::Png,
    bg_codec: ImageCodec::Jpeg,
    bg_raw_format: RawFormat::Bgr888,
    caps: Capabilities {
        is_dual_device: true,
        supports_background_gif: true,
        supports_transparent_icon: true,
        ..Capabilities::NONE
    },
    input_map: INPUT_MAP,
    decode,
    firmware_adjust: None,
};
