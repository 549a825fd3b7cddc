//! Per-device feature controllers
//!
//! Each controller owns at most one worker thread and synchronizes with the
//! rest of the device through atomics and a condition variable. All loops
//! exit on their stop flag and whenever the transport stops being writable.

pub mod animation;
pub mod configer;
pub mod heartbeat;
pub mod input;
pub mod rgb;

pub use animation::{AnimationScheduler, Track, BACKGROUND_TRACK};
pub use configer::ConfigController;
pub use heartbeat::Heartbeat;
pub use input::InputReader;
pub use rgb::RgbController;
