//! StreamDock N1
//!
//! Portrait 480×854 panel, 15 keys, two top buttons mapped onto the second
//! screen range, and one knob. Carries the runtime mode-change opcode, and
//! background images require firmware suffix ≥ 13.

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
    (7, 0x07),
    (8, 0x08),
    (9, 0x09),
    (10, 0x0A),
    (11, 0x0B),
    (12, 0x0C),
    (13, 0x0D),
    (14, 0x0E),
    (15, 0x0F),
    // two top buttons
    (16, 0x1E),
    (17, 0x1F),
    // knob press
    (18, 0x23),
    // knob rotation
    (19, 0x32),
    (20, 0x33),
];

fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x0F, 0x01) | (0x1E | 0x1F, 0x01) => Event::KeyPress,
        (0x01..=0x0F, 0x00) | (0x1E | 0x1F, 0x00) => Event::KeyRelease,
        (0x23, 0x01) => Event::KnobPress,
        (0x23, 0x00) => Event::KnobRelease,
        (0x32, 0x00) => Event::KnobLeft,
        (0x33, 0x00) => Event::KnobRight,
        _ => Event::Any,
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::N1,
    ids: &[(0x6603, 0x1011), (0x6603, 0x1000)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 1024,
        report_id: REPORT_ID_DEFAULT,
    },
    display: (480, 854),
    key_size: (96, 96),
    key_range: (1, 15),
    key_rotation: 0.0,
    bg_rotation: 0.0,
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
        second_screen_width: 64,
        second_screen_height: 64,
        ..Capabilities::NONE
    },
    input_map: INPUT_MAP,
    decode,
    firmware_adjust: None,
};
