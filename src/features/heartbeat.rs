//! Keepalive heartbeat
//!
//! Sleeps on a cancellable condition for one period, then pings the device
//! if the loop is enabled and the transport still writable. Stopping wakes
//! the wait so teardown never blocks for a full period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use streamdock_transport::Transport;
use tracing::debug;

/// Default keepalive period
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(10);

struct Shared {
    transport: Arc<Transport>,
    running: AtomicBool,
    enabled: AtomicBool,
    gate: Mutex<()>,
    cv: Condvar,
    period: Duration,
}

/// Periodic keepalive for one device
pub struct Heartbeat {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Heartbeat {
    pub(crate) fn new(transport: Arc<Transport>, period: Duration) -> Self {
        let shared = Arc::new(Shared {
            transport,
            running: AtomicBool::new(true),
            enabled: AtomicBool::new(false),
            gate: Mutex::new(()),
            cv: Condvar::new(),
            period,
        });

        let worker = shared.clone();
        let thread = std::thread::Builder::new()
            .name("streamdock-heartbeat".into())
            .spawn(move || beat_loop(worker))
            .expect("failed to spawn heartbeat thread");

        Self {
            shared,
            thread: Mutex::new(Some(thread)),
        }
    }

    pub fn start(&self) {
        self.shared.enabled.store(true, Ordering::SeqCst);
        self.shared.cv.notify_all();
    }

    pub fn pause(&self) {
        self.shared.enabled.store(false, Ordering::SeqCst);
    }

    pub(crate) fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.cv.notify_all();
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop();
    }
}

fn beat_loop(shared: Arc<Shared>) {
    debug!("heartbeat worker started");
    while shared.running.load(Ordering::SeqCst) {
        {
            let mut gate = shared.gate.lock();
            let _ = shared.cv.wait_for(&mut gate, shared.period);
        }
        if !shared.running.load(Ordering::SeqCst) || !shared.transport.can_write() {
            break;
        }
        if !shared.enabled.load(Ordering::SeqCst) {
            continue;
        }
        shared.transport.heartbeat();
    }
    debug!("heartbeat worker exiting");
}
