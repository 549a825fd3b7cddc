//! StreamDock N4 Pro
//!
//! Same panel and input layout as the N4, plus an RGB strip, a background
//! animation layer and the device configuration vector.

use streamdock_image::{ImageCodec, RawFormat};
use streamdock_transport::{ReportConfig, REPORT_ID_DEFAULT};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, ModelFamily};
use crate::models::n4;

pub static SPEC: ModelSpec = ModelSpec {
    family: ModelFamily::N4Pro,
    ids: &[(0x5548, 0x1008), (0x5548, 0x1021)],
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
        has_rgb_led: true,
        supports_background_gif: true,
        supports_config: true,
        min_second_key: 1,
        max_second_key: 4,
        second_screen_width: 176,
        second_screen_height: 112,
        led_count: 4,
        ..Capabilities::NONE
    },
    input_map: n4::INPUT_MAP,
    decode: n4::decode,
    firmware_adjust: None,
};
