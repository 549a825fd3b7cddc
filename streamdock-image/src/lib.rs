//! Image rendering pipeline for StreamDock devices
//!
//! Pure functions from input pixels to device-formatted bytes: decode,
//! crop/resize/pad, rotate, flip, encode (JPEG / PNG / WEBP / raw BGR888 /
//! raw RGB565), plus animated-GIF splitting into per-frame payloads with
//! delays. No HID or device state lives here.

pub mod animation;
pub mod error;
pub mod spec;

// callers hand decoded canvases straight to the render chain
pub use image;

pub use animation::{
    split_animation_bytes, split_animation_file, AnimationFrame, DEFAULT_FRAME_DELAY_MS,
};
pub use error::PipelineError;
pub use spec::{
    CropRect, ImageCodec, RawFormat, RenderSpec, ResizePolicy, ANIMATION_QUALITY, STILL_QUALITY,
};
