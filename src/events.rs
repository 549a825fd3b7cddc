//! Input events and listener types

use std::sync::Arc;

use serde::Serialize;

/// Semantic input event decoded from a response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Event {
    KeyPress,
    KeyRelease,
    KnobPress,
    KnobRelease,
    KnobLeft,
    KnobRight,
    SwipeLeft,
    SwipeRight,
    ToggleUp,
    ToggleDown,
    /// Wildcard: matches every event on a logical index, and the decode
    /// result for frames the model cannot classify
    Any,
}

/// Callback invoked with the logical index and the decoded event
pub type EventCallback = Arc<dyn Fn(u16, Event) + Send + Sync>;

/// Callback invoked with the raw response frame
pub type RawCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// A registered listener
///
/// Synchronous listeners run inside the reader loop; asynchronous ones run on
/// a detached thread per invocation.
#[derive(Clone)]
pub struct Listener {
    pub callback: EventCallback,
    pub run_async: bool,
}

/// A registered raw-frame listener
#[derive(Clone)]
pub struct RawListener {
    pub callback: RawCallback,
    pub run_async: bool,
}
