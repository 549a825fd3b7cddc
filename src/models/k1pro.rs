//! StreamDock K1Pro
//!
//! Keyboard-console hybrid: six 64×64 key displays above a keyboard with its
//! own backlight command family. The only model that frames reports with id
//! 0x04, which also shifts every response offset by one byte.

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::{ReportConfig, REPORT_ID_K1PRO};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, ModelFamily};
use crate::events::Event;

const INPUT_MAP: &[(u16, u8)] = &[
    // display keys 1-6; the hardware order is interleaved
    (1, 0x05),
    (2, 0x03),
    (3, 0x01),
    (4, 0x06),
    (5, 0x04),
    (6, 0x02),
    // knob presses for knobs 1-3
    (7, 0x25),
    (8, 0x30),
    (9, 0x31),
    // knob left rotations
    (10, 0x50),
    (11, 0x60),
    (12, 0x90),
    // knob right rotations
    (13, 0x51),
    (14, 0x61),
    (15, 0x91),
];

fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x06, 0x01) => Event::KeyPress,
        (0x01..=0x06, 0x00) => Event::KeyRelease,
        (0x25 | 0x30 | 0x31, 0x01) => Event::KnobPress,
        (0x25 | 0x30 | 0x31, 0x00) => Event::KnobRelease,
        (0x50 | 0x60 | 0x90, 0x00) => Event::KnobLeft,
        (0x51 | 0x61 | 0x91, 0x00) => Event::KnobRight,
        _ => Event::Any,
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::K1Pro,
    ids: &[(0x6603, 0x1015), (0x6603, 0x1019)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 1024,
        report_id: REPORT_ID_K1PRO,
    },
    // no full-screen background on this unit
    display: (0, 0),
    key_size: (64, 64),
    key_range: (1, 6),
    key_rotation: 90.0,
    bg_rotation: 0.0,
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
    firmware_adjust: None,
};
