//! StreamDock N4
//!
//! 10 primary keys (logical 6–15), a four-slot touch second screen
//! (logical 1–4, press-only), four knobs and second-screen swipe gestures.

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::{ReportConfig, REPORT_ID_DEFAULT};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, ModelFamily};
use crate::events::Event;

// shared with the N4 Pro, which has the same panel and input layout
pub(crate) const INPUT_MAP: &[(u16, u8)] = &[
    // second screen slots, left to right (press events only)
    (1, 0x40),
    (2, 0x41),
    (3, 0x42),
    (4, 0x43),
    // primary keys count bottom-left, left to right then bottom to top
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
    // knob rotations: even indices left, odd indices right
    (16, 0xA0),
    (17, 0xA1),
    (18, 0x50),
    (19, 0x51),
    (20, 0x90),
    (21, 0x91),
    (22, 0x70),
    (23, 0x71),
    // knob presses for knobs 1-4
    (24, 0x37),
    (25, 0x35),
    (26, 0x33),
    (27, 0x36),
    // second screen swipe
    (28, 0x38),
    (29, 0x39),
];

pub(crate) fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x0A, 0x01) => Event::KeyPress,
        (0x01..=0x0A, 0x00) => Event::KeyRelease,
        // second screen reports only the release edge
        (0x40..=0x43, 0x00) => Event::KeyRelease,
        (0xA0 | 0x50 | 0x90 | 0x70, 0x00) => Event::KnobLeft,
        (0xA1 | 0x51 | 0x91 | 0x71, 0x00) => Event::KnobRight,
        (0x37 | 0x35 | 0x33 | 0x36, 0x00) => Event::KnobPress,
        (0x38, 0x00) => Event::SwipeLeft,
        (0x39, 0x00) => Event::SwipeRight,
        _ => Event::Any,
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::N4,
    ids: &[(0x6602, 0x1001), (0x6603, 0x1007)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 1024,
        report_id: REPORT_ID_DEFAULT,
    },
    display: (800, 480),
    key_size: (112, 112),
    key_range: (6, 15),
    key_rotation: 180.0,
    bg_rotation: 180.0,
    key_flips: (false, false),
    bg_flips: (false, false),
    key_codec: ImageCodec::Jpeg,
    bg_codec: ImageCodec::Jpeg,
    bg_raw_format: RawFormat::Bgr888,
    caps: Capabilities {
        is_dual_device: true,
        has_second_screen: true,
        min_second_key: 1,
        max_second_key: 4,
        second_screen_width: 176,
        second_screen_height: 112,
        ..Capabilities::NONE
    },
    input_map: INPUT_MAP,
    decode,
    firmware_adjust: None,
};
