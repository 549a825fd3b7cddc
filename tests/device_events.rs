//! Input decoding through the full device: scripted response frames in,
//! listener invocations out.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{endpoint, input_frame, mock_with_firmware, wait_until};
use parking_lot::Mutex;
use streamdock::models;
use streamdock::{Device, Event, ManagerPolicy};

type Fired = Arc<Mutex<Vec<(u16, Event, &'static str)>>>;

fn recorder(fired: &Fired, tag: &'static str) -> streamdock::EventCallback {
    let fired = fired.clone();
    Arc::new(move |key, event| fired.lock().push((key, event, tag)))
}

fn fast_policy() -> ManagerPolicy {
    ManagerPolicy {
        read_timeout_ms: 20,
        ..ManagerPolicy::default()
    }
}

#[test]
fn key_press_fires_exact_then_any_listener() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1011, "/dev/hidraw7"),
        &models::n1::SPEC,
        &fast_policy(),
    );

    let fired: Fired = Arc::new(Mutex::new(Vec::new()));
    device.register_listener(11, Event::KeyPress, recorder(&fired, "exact"), false);
    device.register_listener(11, Event::Any, recorder(&fired, "any"), false);
    // a listener on a different key must stay silent
    device.register_listener(3, Event::KeyPress, recorder(&fired, "other"), false);
    device.start_input_loop();

    // N1 maps hardware 0x0B to logical key 11; value 1 is a press
    handles.push_frame(input_frame(0x0B, 0x01, false));

    assert!(wait_until(Duration::from_secs(1), || fired.lock().len() >= 2));
    std::thread::sleep(Duration::from_millis(50));

    let events = fired.lock().clone();
    assert_eq!(events.len(), 2);
    // synchronous listeners: exact match first, then the wildcard
    assert_eq!(events[0], (11, Event::KeyPress, "exact"));
    assert_eq!(events[1], (11, Event::KeyPress, "any"));
}

#[test]
fn release_and_knob_events_decode_per_model() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6602, 0x1001, "/dev/hidraw2"),
        &models::n4::SPEC,
        &fast_policy(),
    );

    let fired: Fired = Arc::new(Mutex::new(Vec::new()));
    device.register_listener(11, Event::KeyRelease, recorder(&fired, "release"), false);
    device.register_listener(16, Event::KnobLeft, recorder(&fired, "knob"), false);
    device.register_listener(28, Event::SwipeLeft, recorder(&fired, "swipe"), false);
    device.start_input_loop();

    // N4: hardware 0x01 is logical 11; 0xA0 is knob 16; 0x38 is swipe 28
    handles.push_frame(input_frame(0x01, 0x00, false));
    handles.push_frame(input_frame(0xA0, 0x00, false));
    handles.push_frame(input_frame(0x38, 0x00, false));

    assert!(wait_until(Duration::from_secs(1), || fired.lock().len() >= 3));
    let events = fired.lock().clone();
    assert_eq!(events[0], (11, Event::KeyRelease, "release"));
    assert_eq!(events[1], (16, Event::KnobLeft, "knob"));
    assert_eq!(events[2], (28, Event::SwipeLeft, "swipe"));
}

#[test]
fn k1pro_frames_decode_with_shifted_offsets() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1015, "/dev/hidraw3"),
        &models::k1pro::SPEC,
        &fast_policy(),
    );

    let fired: Fired = Arc::new(Mutex::new(Vec::new()));
    device.register_listener(1, Event::KeyPress, recorder(&fired, "exact"), false);
    device.start_input_loop();

    // K1Pro logical key 1 is hardware 0x05; report id shifts all offsets
    handles.push_frame(input_frame(0x05, 0x01, true));

    assert!(wait_until(Duration::from_secs(1), || !fired.lock().is_empty()));
    assert_eq!(fired.lock()[0], (1, Event::KeyPress, "exact"));
}

#[test]
fn short_or_malformed_frames_reach_no_listener() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1011, "/dev/hidraw7"),
        &models::n1::SPEC,
        &fast_policy(),
    );

    let fired: Fired = Arc::new(Mutex::new(Vec::new()));
    for key in 1..=15 {
        device.register_listener(key, Event::Any, recorder(&fired, "any"), false);
    }
    device.start_input_loop();

    // under 64 bytes: dropped before any parsing
    let mut short = input_frame(0x01, 0x01, false);
    short.truncate(32);
    handles.push_frame(short);

    // bad signature: ACK missing
    let mut bad = input_frame(0x01, 0x01, false);
    bad[0] = 0x00;
    handles.push_frame(bad);

    // unknown hardware code: not in the translation table
    handles.push_frame(input_frame(0xEE, 0x01, false));

    std::thread::sleep(Duration::from_millis(200));
    assert!(fired.lock().is_empty());
}

#[test]
fn raw_listener_sees_every_frame_before_decoding() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1011, "/dev/hidraw7"),
        &models::n1::SPEC,
        &fast_policy(),
    );

    let seen: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    device.register_raw_listener(Arc::new(move |frame| sink.lock().push(frame.to_vec())), false);
    device.start_input_loop();

    // a frame with a broken signature still reaches the raw listener
    let mut bad = input_frame(0x01, 0x01, false);
    bad[0] = 0x00;
    handles.push_frame(bad.clone());

    assert!(wait_until(Duration::from_secs(1), || !seen.lock().is_empty()));
    assert_eq!(seen.lock()[0], bad);
}

#[test]
fn unregister_stops_future_dispatch() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1011, "/dev/hidraw7"),
        &models::n1::SPEC,
        &fast_policy(),
    );

    let fired: Fired = Arc::new(Mutex::new(Vec::new()));
    device.register_listener(1, Event::KeyPress, recorder(&fired, "exact"), false);
    device.start_input_loop();

    handles.push_frame(input_frame(0x01, 0x01, false));
    assert!(wait_until(Duration::from_secs(1), || !fired.lock().is_empty()));

    device.unregister_listener(1, Event::KeyPress);
    handles.push_frame(input_frame(0x01, 0x01, false));
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(fired.lock().len(), 1);
}

#[test]
fn async_listener_fires_off_the_reader_thread() {
    let (io, handles) = mock_with_firmware("V1.00");
    let device = Device::from_io(
        io,
        &endpoint(0x6603, 0x1011, "/dev/hidraw7"),
        &models::n1::SPEC,
        &fast_policy(),
    );

    let fired: Fired = Arc::new(Mutex::new(Vec::new()));
    device.register_listener(2, Event::KeyPress, recorder(&fired, "async"), true);
    device.start_input_loop();

    handles.push_frame(input_frame(0x02, 0x01, false));
    assert!(wait_until(Duration::from_secs(1), || !fired.lock().is_empty()));
    assert_eq!(fired.lock()[0], (2, Event::KeyPress, "async"));
}
