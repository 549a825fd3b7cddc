//! Output paths through the full device: images, animations, LEDs,
//! firmware-gated capabilities.

mod common;

use std::time::Duration;

use common::{endpoint, mock_with_firmware, report_payload, report_target, wait_until};
use streamdock::streamdock_transport::protocol::op;
use streamdock::{models, Device, ManagerPolicy, BACKGROUND_TRACK};

fn fast_policy() -> ManagerPolicy {
    ManagerPolicy {
        read_timeout_ms: 20,
        scheduler_tick: Duration::from_millis(3),
        ..ManagerPolicy::default()
    }
}

/// Minimal JPEG-looking payload (magic only; nothing decodes it on the way
/// to the wire).
fn jpeg_bytes(fill: u8, len: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend(std::iter::repeat(fill).take(len));
    bytes
}

#[test]
fn key_image_stream_lands_on_the_wire_with_the_key_target() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_key_image_stream(&jpeg_bytes(0x11, 64), 7);
    device.flush();

    let writes = handles.writes_with_opcode(op::KEY_IMAGE);
    assert_eq!(writes.len(), 1);
    assert_eq!(report_target(&writes[0]), 7);
    assert_eq!(&report_payload(&writes[0])[..2], &[0xFF, 0xD8]);
}

#[test]
fn key_image_with_wrong_container_is_dropped() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    // N4 keys are JPEG; a PNG payload must not reach the wire
    device.set_key_image_stream(b"\x89PNG\r\n\x1a\n-------", 7);
    device.flush();
    assert!(handles.writes_with_opcode(op::KEY_IMAGE).is_empty());
}

#[test]
fn out_of_range_key_is_a_no_op() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    // N4 addresses keys 6-15 and second screen 1-4; 5 and 99 are holes
    device.clear_key(5);
    device.clear_key(99);
    device.set_key_image_stream(&jpeg_bytes(0x22, 16), 99);
    device.flush();
    assert!(handles.written.lock().is_empty());
}

#[test]
fn second_screen_keys_accept_images() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_key_image_stream(&jpeg_bytes(0x33, 64), 2);
    device.flush();
    let writes = handles.writes_with_opcode(op::KEY_IMAGE);
    assert_eq!(writes.len(), 1);
    assert_eq!(report_target(&writes[0]), 2);
}

#[test]
fn dual_device_background_goes_out_as_jpeg_stream() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_background_image_stream(&jpeg_bytes(0x44, 256));
    device.flush();
    assert!(!handles.writes_with_opcode(op::BG_IMAGE).is_empty());
    assert!(handles.writes_with_opcode(op::BG_BITMAP).is_empty());
}

#[test]
fn raw_model_background_goes_out_as_bitmap() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x5500, 0x1001, "/dev/hidraw1"),
        &models::sd293v2::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    // raw BGR888 pixels, no container magic
    device.set_background_image_stream(&vec![0x10; 300]);
    device.flush();
    assert!(!handles.writes_with_opcode(op::BG_BITMAP).is_empty());
    assert!(handles.writes_with_opcode(op::BG_IMAGE).is_empty());
}

#[test]
fn n1_background_requires_firmware_suffix_13() {
    let (io, handles) = mock_with_firmware("V1.05.12");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1011, "/dev/hidraw5"),
        &models::n1::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();
    device.set_background_image_stream(&jpeg_bytes(0x55, 64));
    device.flush();
    assert!(handles.written.lock().is_empty());

    let (io, handles) = mock_with_firmware("V1.05.13");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1011, "/dev/hidraw5"),
        &models::n1::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();
    device.set_background_image_stream(&jpeg_bytes(0x55, 64));
    device.flush();
    assert!(!handles.writes_with_opcode(op::BG_IMAGE).is_empty());
}

#[test]
fn n3_firmware_markers_downgrade_capabilities() {
    // V25 marker: loses dual mode and the background animation layer
    let (io, _) = mock_with_firmware("SD.V25.N3");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1002, "/dev/hidraw4"),
        &models::n3::SPEC,
        &fast_policy(),
    );
    assert!(!device.capabilities().is_dual_device);
    assert!(!device.capabilities().supports_background_gif);

    // V3 marker: keeps dual mode, loses background animation and RGB
    let (io, _) = mock_with_firmware("SD.V3.N3");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1002, "/dev/hidraw4"),
        &models::n3::SPEC,
        &fast_policy(),
    );
    assert!(device.capabilities().is_dual_device);
    assert!(!device.capabilities().supports_background_gif);
    assert!(!device.capabilities().has_rgb_led);

    // no marker: catalog defaults stand
    let (io, _) = mock_with_firmware("SD.V2");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1002, "/dev/hidraw4"),
        &models::n3::SPEC,
        &fast_policy(),
    );
    assert!(device.capabilities().is_dual_device);
}

#[test]
fn animation_loop_with_no_tracks_stays_silent() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.start_animation_loop();
    std::thread::sleep(Duration::from_millis(60));
    device.stop_animation_loop();
    std::thread::sleep(Duration::from_millis(30));
    assert!(handles.written.lock().is_empty());
}

#[test]
fn replacing_a_track_plays_only_the_replacement() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    // install, then replace before the loop ever runs
    let scheduler_key = 7u16;
    device.set_key_animation_frames(
        vec![streamdock::streamdock_image::AnimationFrame {
            data: jpeg_bytes(0xA1, 8),
            delay_ms: 50,
        }],
        scheduler_key,
    );
    device.set_key_animation_frames(
        vec![streamdock::streamdock_image::AnimationFrame {
            data: jpeg_bytes(0xB2, 8),
            delay_ms: 50,
        }],
        scheduler_key,
    );

    device.start_animation_loop();
    assert!(wait_until(Duration::from_secs(1), || {
        !handles.writes_with_opcode(op::KEY_IMAGE).is_empty()
    }));
    device.stop_animation_loop();

    for report in handles.writes_with_opcode(op::KEY_IMAGE) {
        assert_eq!(report_target(&report), scheduler_key as u8);
        // only the replacement's payload ever shows up
        assert_eq!(report_payload(&report)[..2], [0xFF, 0xD8]);
        assert_eq!(report_payload(&report)[2], 0xB2);
    }
}

#[test]
fn animated_tracks_batch_with_one_refresh_per_tick() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_key_animation_frames(
        vec![
            streamdock::streamdock_image::AnimationFrame {
                data: jpeg_bytes(0xC1, 8),
                delay_ms: 30,
            },
            streamdock::streamdock_image::AnimationFrame {
                data: jpeg_bytes(0xC2, 8),
                delay_ms: 30,
            },
        ],
        8,
    );
    device.start_animation_loop();

    assert!(wait_until(Duration::from_secs(1), || {
        handles.writes_with_opcode(op::KEY_IMAGE).len() >= 3
    }));
    device.stop_animation_loop();
    device.flush();

    // every image batch is followed by a refresh; refreshes never outnumber
    // the batches
    let images = handles.writes_with_opcode(op::KEY_IMAGE).len();
    let refreshes = handles.writes_with_opcode(op::REFRESH).len();
    assert!(refreshes >= 1);
    assert!(refreshes <= images);
}

#[test]
fn background_track_is_index_zero_and_respects_the_display_rect() {
    let (io, handles) = mock_with_firmware("V1.00");
    // N4Pro carries the background animation layer
    let device = Device::from_io(
        io,
        &endpoint(0x5548, 0x1008, "/dev/hidraw0"),
        &models::n4pro::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_background_animation_frames(
        vec![streamdock::streamdock_image::AnimationFrame {
            data: jpeg_bytes(0xD4, 16),
            delay_ms: 40,
        }],
        0,
        0,
    );
    device.start_animation_loop();
    assert!(wait_until(Duration::from_secs(1), || {
        !handles.writes_with_opcode(op::BG_FRAME).is_empty()
    }));
    device.stop_animation_loop();

    device.clear_background_animation();
    assert_eq!(BACKGROUND_TRACK, 0);
}

#[test]
fn led_commands_carry_count_and_color() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x5548, 0x1008, "/dev/hidraw0"),
        &models::n4pro::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_led_color(10, 20, 30);
    device.reset_led_color();
    device.flush();

    let color = handles.writes_with_opcode(op::LED_COLOR);
    assert_eq!(color.len(), 1);
    // N4Pro drives 4 LEDs; count rides in the target byte, RGB in params
    assert_eq!(report_target(&color[0]), 4);
    assert_eq!(&color[0][9..12], &[10, 20, 30]);
    assert_eq!(handles.writes_with_opcode(op::LED_RESET).len(), 1);
}

#[test]
fn led_commands_without_the_strip_are_silent() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_led_color(1, 2, 3);
    device.set_led_brightness(50);
    device.reset_led_color();
    device.flush();
    assert!(handles.written.lock().is_empty());
}

#[test]
fn static_keyboard_effect_forces_speed_zero_first() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1015, "/dev/hidraw9"),
        &models::k1pro::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_keyboard_lighting_effect(0);
    device.flush();

    let written = handles.written.lock();
    assert_eq!(common::report_opcode(&written[0]), Some(op::KB_SPEED));
    assert_eq!(common::report_opcode(&written[1]), Some(op::KB_EFFECT));
}

#[test]
fn keyboard_backlight_needs_a_k1pro() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();

    device.set_keyboard_backlight_brightness(3);
    device.set_keyboard_rgb_backlight(1, 2, 3);
    device.flush();
    assert!(handles.written.lock().is_empty());
}

#[test]
fn config_vector_reaches_the_wire_only_when_supported() {
    let configs = streamdock::build_config(&[(
        streamdock::N4ProConfig::EnableBootVideo,
        streamdock::ConfigState::Off,
    )]);

    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x5548, 0x1008, "/dev/hidraw0"),
        &models::n4pro::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();
    device.set_device_config(&configs);
    device.flush();
    let writes = handles.writes_with_opcode(op::CONFIG);
    assert_eq!(writes.len(), 1);
    assert_eq!(&report_payload(&writes[0])[..6], &[0x11, 0x11, 0x11, 0x11, 0x11, 0xFF]);

    // N4 (non-Pro) has no config vector
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();
    device.set_device_config(&configs);
    device.flush();
    assert!(handles.written.lock().is_empty());
}

#[test]
fn heartbeat_pings_on_its_period_until_stopped() {
    let (io, handles) = mock_with_firmware("V1.00");
    let policy = ManagerPolicy {
        read_timeout_ms: 20,
        heartbeat_period: Duration::from_millis(30),
        ..ManagerPolicy::default()
    };
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &policy,
    );
    handles.clear_writes();

    device.start_heartbeat();
    assert!(wait_until(Duration::from_secs(1), || {
        handles.writes_with_opcode(op::HEARTBEAT).len() >= 2
    }));

    device.stop_heartbeat();
    std::thread::sleep(Duration::from_millis(60));
    let settled = handles.writes_with_opcode(op::HEARTBEAT).len();
    std::thread::sleep(Duration::from_millis(120));
    assert_eq!(handles.writes_with_opcode(op::HEARTBEAT).len(), settled);
}

#[test]
fn change_mode_is_n1_only() {
    let (io, handles) = mock_with_firmware("V1.05.13");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1011, "/dev/hidraw5"),
        &models::n1::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();
    device.change_mode(1);
    device.flush();
    assert_eq!(handles.writes_with_opcode(op::MODE_CHANGE).len(), 1);

    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw0"),
        &models::n4::SPEC,
        &fast_policy(),
    );
    handles.clear_writes();
    device.change_mode(1);
    device.flush();
    assert!(handles.written.lock().is_empty());
}
