//! StreamDock M18
//!
//! 15 keys on a 480×272 panel with three hardware buttons below and a
//! 24-LED RGB strip. V2-era firmware on this PID cannot take dual-device
//! image streaming, so the firmware gate downgrades it at bind.

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
    // three buttons below the panel, left to right
    (16, 0x25),
    (17, 0x30),
    (18, 0x31),
];

fn decode(code: u8, value: u8) -> Event {
    match (code, value) {
        (0x01..=0x0F, 0x01) | (0x25..=0x31, 0x01) => Event::KeyPress,
        (0x01..=0x0F, 0x00) | (0x25..=0x31, 0x00) => Event::KeyRelease,
        _ => Event::Any,
    }
}

fn firmware_adjust(firmware: &str, caps: &mut Capabilities) {
    if firmware.contains("V2.M18") || firmware.contains("V25.M18") {
        caps.is_dual_device = false;
        caps.supports_background_gif = false;
    }
}

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::M18,
    ids: &[(0x6603, 0x1009), (0x6603, 0x1012)],
    report: ReportConfig {
        input_report_size: 512,
        output_report_size: 1024,
        report_id: REPORT_ID_DEFAULT,
    },
    display: (480, 272),
    key_size: (64, 64),
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
        has_rgb_led: true,
        led_count: 24,
        ..Capabilities::NONE
    },
    input_map: INPUT_MAP,
    decode,
    firmware_adjust: Some(firmware_adjust),
};
