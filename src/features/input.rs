//! Input reader loop
//!
//! One background thread per device issues bounded-timeout reads, validates
//! the `ACK`/`OK` signature, inverts the model's translation table and fans
//! the decoded event out to registered listeners.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use streamdock_transport::protocol::{has_ack_signature, MIN_RESPONSE_LEN};
use streamdock_transport::{Response, Transport};
use tracing::{debug, warn};

use crate::catalog::ModelSpec;
use crate::descriptor::ModelFamily;
use crate::events::{Event, Listener, RawListener};

/// Frame offsets for one model's responses
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameOffsets {
    pub ack: usize,
    pub hardware: usize,
    pub event: usize,
}

impl FrameOffsets {
    /// K1Pro responses carry a leading report id, shifting everything by one.
    pub fn for_family(family: ModelFamily) -> Self {
        if family == ModelFamily::K1Pro {
            Self {
                ack: 1,
                hardware: 10,
                event: 11,
            }
        } else {
            Self {
                ack: 0,
                hardware: 9,
                event: 10,
            }
        }
    }
}

struct Shared {
    transport: Arc<Transport>,
    running: AtomicBool,
    enabled: AtomicBool,
    gate: Mutex<()>,
    cv: Condvar,
    listeners: Mutex<HashMap<(u16, Event), Listener>>,
    raw: Mutex<Option<RawListener>>,
    /// hardware code → logical index
    inverse: HashMap<u8, u16>,
    decode: fn(u8, u8) -> Event,
    offsets: FrameOffsets,
    read_timeout_ms: i32,
}

/// Background reader for one device
pub struct InputReader {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl InputReader {
    pub(crate) fn new(
        transport: Arc<Transport>,
        spec: &'static ModelSpec,
        read_timeout_ms: i32,
    ) -> Self {
        let inverse = spec
            .input_map
            .iter()
            .map(|&(logical, code)| (code, logical))
            .collect();
        let shared = Arc::new(Shared {
            transport,
            running: AtomicBool::new(true),
            enabled: AtomicBool::new(false),
            gate: Mutex::new(()),
            cv: Condvar::new(),
            listeners: Mutex::new(HashMap::new()),
            raw: Mutex::new(None),
            inverse,
            decode: spec.decode,
            offsets: FrameOffsets::for_family(spec.family),
            read_timeout_ms,
        });

        let worker = shared.clone();
        let thread = std::thread::Builder::new()
            .name("streamdock-input".into())
            .spawn(move || read_loop(worker))
            .expect("failed to spawn input reader thread");

        Self {
            shared,
            thread: Mutex::new(Some(thread)),
        }
    }

    /// Let the loop start consuming reports.
    pub fn start(&self) {
        self.shared.enabled.store(true, Ordering::SeqCst);
        self.shared.cv.notify_all();
    }

    /// Pause the loop after the in-flight read completes.
    pub fn pause(&self) {
        self.shared.enabled.store(false, Ordering::SeqCst);
    }

    pub fn register(&self, logical: u16, event: Event, listener: Listener) {
        self.shared.listeners.lock().insert((logical, event), listener);
    }

    pub fn unregister(&self, logical: u16, event: Event) {
        self.shared.listeners.lock().remove(&(logical, event));
    }

    pub fn register_raw(&self, listener: RawListener) {
        *self.shared.raw.lock() = Some(listener);
    }

    pub fn unregister_raw(&self) {
        *self.shared.raw.lock() = None;
    }

    /// Stop the loop and join the worker thread.
    pub(crate) fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.cv.notify_all();
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(shared: Arc<Shared>) {
    debug!("input reader started");
    while shared.running.load(Ordering::SeqCst) {
        {
            let mut gate = shared.gate.lock();
            while shared.running.load(Ordering::SeqCst) && !shared.enabled.load(Ordering::SeqCst) {
                shared.cv.wait(&mut gate);
            }
        }
        if !shared.running.load(Ordering::SeqCst) || !shared.transport.can_write() {
            break;
        }

        let frame = match shared.transport.read(shared.read_timeout_ms) {
            Response::Disconnected => break,
            Response::Empty => continue,
            Response::Data(frame) => frame,
        };

        if frame.len() < MIN_RESPONSE_LEN {
            warn!("discarding short response ({} bytes)", frame.len());
            continue;
        }

        let raw = shared.raw.lock().clone();
        if let Some(listener) = raw {
            if listener.run_async {
                let callback = listener.callback.clone();
                let copy = frame.clone();
                std::thread::spawn(move || callback(&copy));
            } else {
                (listener.callback)(&frame);
            }
        }

        if !has_ack_signature(&frame, shared.offsets.ack) {
            continue;
        }
        let hardware = frame[shared.offsets.hardware];
        let value = frame[shared.offsets.event];
        let Some(&logical) = shared.inverse.get(&hardware) else {
            continue;
        };
        let event = (shared.decode)(hardware, value);

        let listeners = shared.listeners.lock();
        if event != Event::Any {
            if let Some(listener) = listeners.get(&(logical, event)) {
                invoke(listener, logical, event);
            }
        }
        if let Some(listener) = listeners.get(&(logical, Event::Any)) {
            invoke(listener, logical, event);
        }
    }
    debug!("input reader exiting");
}

fn invoke(listener: &Listener, logical: u16, event: Event) {
    if listener.run_async {
        let callback = listener.callback.clone();
        std::thread::spawn(move || callback(logical, event));
    } else {
        (listener.callback)(logical, event);
    }
}
