//! Device descriptors and capability flags
//!
//! A [`DeviceDescriptor`] is fixed at bind time and never changes afterwards;
//! [`Capabilities`] start from the catalog defaults and may be adjusted once,
//! by the firmware-version gate, before any feature controller reads them.

use streamdock_image::{ImageCodec, RawFormat};

/// Model family, used for the few behaviors that stay model-specific after
/// capability gating (response offsets, N1 mode switch, K1Pro backlight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Sd293,
    Sd293s,
    N1,
    N3,
    N4,
    N4Pro,
    M18,
    M3,
    Xl,
    K1Pro,
}

/// Immutable identity and geometry of one bound device
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub family: ModelFamily,
    pub vid: u16,
    pub pid: u16,
    pub path: String,
    pub serial: String,
    pub firmware: String,
    /// Background screen size in pixels
    pub display_width: u16,
    pub display_height: u16,
    /// Primary key tile size
    pub key_width: u16,
    pub key_height: u16,
    /// Inclusive logical index range of the primary keys
    pub min_key: u16,
    pub max_key: u16,
    pub key_rotation: f64,
    pub bg_rotation: f64,
    pub key_flip_vertical: bool,
    pub key_flip_horizontal: bool,
    pub bg_flip_vertical: bool,
    pub bg_flip_horizontal: bool,
    pub key_codec: ImageCodec,
    pub bg_codec: ImageCodec,
    /// Pixel layout when `bg_codec` is raw
    pub bg_raw_format: RawFormat,
}

/// Optional features of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub is_dual_device: bool,
    pub has_second_screen: bool,
    pub has_rgb_led: bool,
    pub supports_background_gif: bool,
    pub supports_transparent_icon: bool,
    pub supports_config: bool,
    /// Inclusive logical index range of second-screen keys
    pub min_second_key: u16,
    pub max_second_key: u16,
    pub second_screen_width: u16,
    pub second_screen_height: u16,
    pub second_screen_codec: ImageCodec,
    pub background_gif_codec: ImageCodec,
    pub led_count: u16,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        is_dual_device: false,
        has_second_screen: false,
        has_rgb_led: false,
        supports_background_gif: false,
        supports_transparent_icon: false,
        supports_config: false,
        min_second_key: 0,
        max_second_key: 0,
        second_screen_width: 0,
        second_screen_height: 0,
        second_screen_codec: ImageCodec::Jpeg,
        background_gif_codec: ImageCodec::Jpeg,
        led_count: 0,
    };
}
