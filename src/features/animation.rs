//! Animation scheduler
//!
//! Drives every animated target of one device from a single worker thread.
//! Each target owns a [`Track`]: encoded frames, a parallel per-frame delay
//! vector and a playhead. Ticks add the elapsed wall time to each track's
//! accumulator and subtract whole frame delays from it, so tracks with
//! different frame timings stay correct and catch up after a slow tick.
//! All targets that advanced in a tick are flushed as one batch followed by
//! a single refresh.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use streamdock_image::{AnimationFrame, DEFAULT_FRAME_DELAY_MS};
use streamdock_transport::Transport;
use tracing::debug;

/// Track index reserved for the background layer
pub const BACKGROUND_TRACK: u16 = 0;

/// Delay between scheduler ticks
pub const SCHEDULER_TICK: Duration = Duration::from_millis(3);

/// Animation state for one target
pub struct Track {
    frames: Vec<Vec<u8>>,
    delays_ms: Vec<u16>,
    current: usize,
    accumulated_us: u64,
    dirty: bool,
}

impl Track {
    /// Build a track; rejects empty or mismatched frame/delay vectors.
    /// Zero delays are normalized to the 100 ms default hold.
    pub fn new(frames: Vec<Vec<u8>>, delays_ms: Vec<u16>) -> Option<Self> {
        if frames.is_empty() || frames.len() != delays_ms.len() {
            return None;
        }
        let delays_ms = delays_ms
            .into_iter()
            .map(|d| if d == 0 { DEFAULT_FRAME_DELAY_MS } else { d })
            .collect();
        Some(Self {
            frames,
            delays_ms,
            current: 0,
            accumulated_us: 0,
            dirty: true,
        })
    }

    /// Build a track from split animation frames.
    pub fn from_frames(frames: Vec<AnimationFrame>) -> Option<Self> {
        let (data, delays) = frames
            .into_iter()
            .map(|f| (f.data, f.delay_ms))
            .unzip::<_, _, Vec<_>, Vec<_>>();
        Self::new(data, delays)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn current_frame(&self) -> &[u8] {
        &self.frames[self.current]
    }

    /// Advance the playhead by `elapsed_us`; returns whether the displayed
    /// frame index changed (always true on the first tick after install).
    fn advance(&mut self, elapsed_us: u64) -> bool {
        let installed = std::mem::take(&mut self.dirty);
        let start = self.current;
        self.accumulated_us += elapsed_us;
        loop {
            let frame_us = u64::from(self.delays_ms[self.current]) * 1000;
            if self.accumulated_us < frame_us {
                break;
            }
            self.accumulated_us -= frame_us;
            self.current = (self.current + 1) % self.frames.len();
        }
        installed || self.current != start
    }
}

/// Where the background track lands on the panel
#[derive(Debug, Clone, Copy, Default)]
struct BackgroundPlacement {
    x: u16,
    y: u16,
    layer: u8,
}

struct Shared {
    transport: Arc<Transport>,
    running: AtomicBool,
    enabled: AtomicBool,
    tracks: Mutex<HashMap<u16, Track>>,
    cv: Condvar,
    placement: Mutex<BackgroundPlacement>,
    /// Size of background animation frames
    background_size: (u16, u16),
    display: (u16, u16),
    tick: Duration,
}

/// Multi-target animation driver for one device
pub struct AnimationScheduler {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl AnimationScheduler {
    pub(crate) fn new(
        transport: Arc<Transport>,
        background_size: (u16, u16),
        display: (u16, u16),
        tick: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            transport,
            running: AtomicBool::new(true),
            enabled: AtomicBool::new(false),
            tracks: Mutex::new(HashMap::new()),
            cv: Condvar::new(),
            placement: Mutex::new(BackgroundPlacement::default()),
            background_size,
            display,
            tick,
        });

        let worker = shared.clone();
        let thread = std::thread::Builder::new()
            .name("streamdock-animation".into())
            .spawn(move || animate_loop(worker))
            .expect("failed to spawn animation scheduler thread");

        Self {
            shared,
            thread: Mutex::new(Some(thread)),
        }
    }

    /// Install or atomically replace the track at `index`.
    pub fn set_track(&self, index: u16, track: Track) {
        self.shared.tracks.lock().insert(index, track);
        self.shared.cv.notify_all();
    }

    /// Remove the track at `index` without stopping the loop.
    pub fn clear_track(&self, index: u16) {
        self.shared.tracks.lock().remove(&index);
    }

    pub fn has_track(&self, index: u16) -> bool {
        self.shared.tracks.lock().contains_key(&index)
    }

    /// Position the background track on the panel.
    pub fn set_background_placement(&self, x: u16, y: u16, layer: u8) {
        *self.shared.placement.lock() = BackgroundPlacement { x, y, layer };
    }

    /// Enable playback.
    pub fn start(&self) {
        self.shared.enabled.store(true, Ordering::SeqCst);
        self.shared.cv.notify_all();
    }

    /// Pause playback; installed tracks keep their playheads.
    pub fn pause(&self) {
        self.shared.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.cv.notify_all();
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn animate_loop(shared: Arc<Shared>) {
    debug!("animation scheduler started");
    let mut last = Instant::now();
    loop {
        let updates: Vec<(u16, Vec<u8>)> = {
            let mut tracks = shared.tracks.lock();
            while shared.running.load(Ordering::SeqCst)
                && !(shared.enabled.load(Ordering::SeqCst) && !tracks.is_empty())
            {
                shared.cv.wait(&mut tracks);
                // waking from idle must not count the idle time as playback
                last = Instant::now();
            }
            if !shared.running.load(Ordering::SeqCst) || !shared.transport.can_write() {
                break;
            }

            let now = Instant::now();
            let elapsed_us = now.duration_since(last).as_micros() as u64;
            last = now;

            tracks
                .iter_mut()
                .filter_map(|(&index, track)| {
                    track
                        .advance(elapsed_us)
                        .then(|| (index, track.current_frame().to_vec()))
                })
                .collect()
        };

        if !updates.is_empty() {
            let placement = *shared.placement.lock();
            for (index, frame) in updates {
                if index == BACKGROUND_TRACK {
                    let (w, h) = shared.background_size;
                    let (dw, dh) = shared.display;
                    // the reserved rectangle must lie inside the display
                    if placement.x.saturating_add(w) <= dw && placement.y.saturating_add(h) <= dh {
                        let _ = shared.transport.set_background_frame_stream(
                            &frame,
                            w,
                            h,
                            placement.x,
                            placement.y,
                            placement.layer,
                        );
                    }
                } else {
                    let _ = shared.transport.set_key_image_stream(&frame, index as u8);
                }
            }
            shared.transport.wakeup_screen();
            shared.transport.refresh();
        }
        std::thread::sleep(shared.tick);
    }
    debug!("animation scheduler exiting");
}
