//! StreamDock N3 (V2.5 hardware)
//!
//! 6 keys, three bottom buttons and three knobs on a 320×240 panel. The same
//! PID ships with several firmware lines; the marker in the version string
//! decides what the unit can actually do, so capabilities are corrected at
//! bind time.

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::{ReportConfig, REPORT_ID_DEFAULT};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, ModelFamily};
use crate::events::Event;

const INPUT_MAP: &[(u16, u8)] = &[
    // keys count top-left, left to right then top to bottom
    (1, 0x01),
    (2, 0x02),
    (3, 0x03),
    (4, 0x04),
    (5, 0x05),
    (6, 0x06),
    // three black buttons at the bottom, left to right
    (7, 0x25),
    (8, 0x30),
    (9, 0x31),
    // knob presses: bottom-left, bottom-right, top
    (10, 0x33),
    (11, 0x34),
    (12, 0x35),
    // knob left rotations: bottom-left, bottom-right, top
    (13, 0x90),
    (14, 0x60),
    (15, 0x50),
    // knob right rotations: bottom-left, bottom-right, top
    (16, 0x91),
    (17, 0x61),
    (18, 0x51),
];

fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x06, 0x01) | (0x25..=0x31, 0x01) => Event::KeyPress,
        (0x01..=0x06, 0x00) | (0x25..=0x31, 0x00) => Event::KeyRelease,
        (0x33..=0x35, 0x00) => Event::KnobPress,
        (0x90 | 0x60 | 0x50, 0x00) => Event::KnobLeft,
        (0x91 | 0x61 | 0x51, 0x00) => Event::KnobRight,
        _ => Event::Any,
    }
}

fn firmware_adjust(firmware: &str, caps: &mut Capabilities) {
    if firmware.contains("V25.N3") {
        caps.is_dual_device = false;
        caps.supports_background_gif = false;
    } else if firmware.contains("V3.N3") {
        caps.is_dual_device = true;
        caps.supports_background_gif = false;
        caps.has_rgb_led = false;
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::N3,
    ids: &[(0x6603, 0x1002), (0x6603, 0x1003)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 1024,
        report_id: REPORT_ID_DEFAULT,
    },
    display: (320, 240),
    key_size: (64, 64),
    key_range: (1, 6),
    key_rotation: 90.0,
    bg_rotation: 90.0,
    key_flips: (false, false),
    bg_flips: (false, false),
    key_codec: ImageCodec::Jpeg,
    bg_codec: ImageCodec::Jpeg,
    bg_raw_format: RawFormat::Bgr888,
    caps: Capabilities {
        is_dual_device: true,
        ..Capabilities::NONE
    },
    input_map: INPUT_MAP,
    decode,
    firmware_adjust: Some(firmware_adjust),
};
