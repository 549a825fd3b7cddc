//! The running driver for one attached unit
//!
//! A [`Device`] owns the transport, the model's render specs and the feature
//! controllers. Public operations validate locally (index range, container
//! magic, capability flags) and swallow failures after logging them: nothing
//! on this surface panics or unwinds into a worker thread.

use std::sync::Arc;

use streamdock_image::image::DynamicImage;
use streamdock_image::{
    split_animation_bytes, split_animation_file, AnimationFrame, ImageCodec, RenderSpec,
    ANIMATION_QUALITY, STILL_QUALITY,
};
use streamdock_transport::protocol::{is_jpeg_data, is_png_data};
use streamdock_transport::{HidBinding, HidDeviceInfo, HidIo, Transport};
use tracing::{debug, info, warn};

use crate::catalog::ModelSpec;
use crate::descriptor::{Capabilities, DeviceDescriptor, ModelFamily};
use crate::events::{Event, EventCallback, Listener, RawCallback, RawListener};
use crate::features::{
    AnimationScheduler, ConfigController, Heartbeat, InputReader, RgbController, Track,
    BACKGROUND_TRACK,
};
use crate::manager::ManagerPolicy;

/// N1 units only accept background images from this firmware revision on
const N1_BACKGROUND_MIN_SUFFIX: u32 = 13;

/// One attached StreamDock
pub struct Device {
    descriptor: DeviceDescriptor,
    caps: Capabilities,
    spec: &'static ModelSpec,
    key_spec: RenderSpec,
    bg_spec: Option<RenderSpec>,
    second_spec: Option<RenderSpec>,
    bg_gif_spec: Option<RenderSpec>,
    reader: InputReader,
    heartbeat: Heartbeat,
    scheduler: Option<AnimationScheduler>,
    rgb: RgbController,
    configer: ConfigController,
    background_timeout_ms: u32,
    transport: Arc<Transport>,
}

impl Device {
    /// Open the endpoint and bind the model driver.
    pub(crate) fn bind(
        binding: &HidBinding,
        info: &HidDeviceInfo,
        spec: &'static ModelSpec,
        policy: &ManagerPolicy,
    ) -> Result<Self, crate::DeviceError> {
        let io = binding.open(&info.path)?;
        Ok(Self::from_io(Box::new(io), info, spec, policy))
    }

    /// Bind the model driver over an already-open HID endpoint.
    ///
    /// This is the seam the integration tests use; it also lets embedders
    /// bring their own HID binding.
    pub fn from_io(
        io: Box<dyn HidIo>,
        info: &HidDeviceInfo,
        spec: &'static ModelSpec,
        policy: &ManagerPolicy,
    ) -> Self {
        let transport = Arc::new(Transport::new(io, spec.report));

        // the firmware gate must run before any controller reads the flags
        let firmware = transport.firmware_version();
        let mut caps = spec.caps;
        if let Some(adjust) = spec.firmware_adjust {
            adjust(&firmware, &mut caps);
        }

        let descriptor = DeviceDescriptor {
            family: spec.family,
            vid: info.vid,
            pid: info.pid,
            path: info.path.clone(),
            serial: info.serial.clone().unwrap_or_default(),
            firmware,
            display_width: spec.display.0,
            display_height: spec.display.1,
            key_width: spec.key_size.0,
            key_height: spec.key_size.1,
            min_key: spec.key_range.0,
            max_key: spec.key_range.1,
            key_rotation: spec.key_rotation,
            bg_rotation: spec.bg_rotation,
            key_flip_vertical: spec.key_flips.0,
            key_flip_horizontal: spec.key_flips.1,
            bg_flip_vertical: spec.bg_flips.0,
            bg_flip_horizontal: spec.bg_flips.1,
            key_codec: spec.key_codec,
            bg_codec: spec.bg_codec,
            bg_raw_format: spec.bg_raw_format,
        };

        let key_spec = RenderSpec::new(
            u32::from(spec.key_size.0),
            u32::from(spec.key_size.1),
            spec.key_rotation,
            spec.key_codec,
        )
        .with_flips(spec.key_flips.0, spec.key_flips.1);

        let bg_spec = (spec.display != (0, 0)).then(|| {
            RenderSpec::new(
                u32::from(spec.display.0),
                u32::from(spec.display.1),
                spec.bg_rotation,
                spec.bg_codec,
            )
            .with_flips(spec.bg_flips.0, spec.bg_flips.1)
            .with_raw_format(spec.bg_raw_format)
        });

        let second_spec = caps.has_second_screen.then(|| {
            RenderSpec::new(
                u32::from(caps.second_screen_width),
                u32::from(caps.second_screen_height),
                spec.key_rotation,
                caps.second_screen_codec,
            )
            .with_flips(spec.key_flips.0, spec.key_flips.1)
        });

        let bg_gif_spec = caps.supports_background_gif.then(|| {
            RenderSpec::new(
                u32::from(spec.display.0),
                u32::from(spec.display.1),
                spec.bg_rotation,
                caps.background_gif_codec,
            )
            .with_flips(spec.bg_flips.0, spec.bg_flips.1)
        });

        let reader = InputReader::new(transport.clone(), spec, policy.read_timeout_ms);
        let heartbeat = Heartbeat::new(transport.clone(), policy.heartbeat_period);
        let scheduler = caps.is_dual_device.then(|| {
            AnimationScheduler::new(
                transport.clone(),
                spec.display,
                spec.display,
                policy.scheduler_tick,
            )
        });
        let rgb = RgbController::new(transport.clone(), caps.has_rgb_led, caps.led_count);
        let configer = ConfigController::new(transport.clone(), caps.supports_config);

        info!(
            "bound {:?} at {} (vid {:04X} pid {:04X}, firmware {:?})",
            spec.family, descriptor.path, info.vid, info.pid, descriptor.firmware
        );

        Self {
            descriptor,
            caps,
            spec,
            key_spec,
            bg_spec,
            second_spec,
            bg_gif_spec,
            reader,
            heartbeat,
            scheduler,
            rgb,
            configer,
            background_timeout_ms: policy.background_write_timeout_ms,
            transport,
        }
    }

    // === Identity & state ===

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn firmware_version(&self) -> &str {
        &self.descriptor.firmware
    }

    pub fn path(&self) -> &str {
        &self.descriptor.path
    }

    pub fn can_write(&self) -> bool {
        self.transport.can_write()
    }

    pub fn last_error(&self) -> String {
        self.transport.last_error()
    }

    /// Wait until every queued command has reached the OS.
    pub fn flush(&self) {
        self.transport.flush();
    }

    /// Whether `key` addresses neither the primary keys nor the second
    /// screen.
    pub fn out_of_range(&self, key: u16) -> bool {
        let primary = (self.descriptor.min_key..=self.descriptor.max_key).contains(&key);
        let second = self.caps.has_second_screen
            && (self.caps.min_second_key..=self.caps.max_second_key).contains(&key);
        !primary && !second
    }

    fn render_spec_for_key(&self, key: u16) -> Option<&RenderSpec> {
        if (self.descriptor.min_key..=self.descriptor.max_key).contains(&key) {
            Some(&self.key_spec)
        } else if self.caps.has_second_screen
            && (self.caps.min_second_key..=self.caps.max_second_key).contains(&key)
        {
            self.second_spec.as_ref()
        } else {
            None
        }
    }

    // === Display control ===

    pub fn wakeup_screen(&self) {
        self.transport.wakeup_screen();
    }

    pub fn sleep(&self) {
        self.transport.sleep();
    }

    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    pub fn heartbeat(&self) {
        self.transport.heartbeat();
    }

    pub fn refresh(&self) {
        self.transport.refresh();
    }

    pub fn set_key_brightness(&self, brightness: u8) {
        self.transport.set_key_brightness(brightness);
    }

    pub fn clear_all_keys(&self) {
        self.transport.clear_all_keys();
    }

    pub fn clear_key(&self, key: u16) {
        if self.out_of_range(key) {
            warn!("clear_key: key {key} out of range");
            return;
        }
        self.transport.clear_key(key as u8);
    }

    // === Key images ===

    /// Render an image file onto a key.
    pub fn set_key_image_file(&self, path: impl AsRef<std::path::Path>, key: u16) {
        let Some(spec) = self.render_spec_for_key(key) else {
            warn!("set_key_image_file: key {key} out of range");
            return;
        };
        match spec.render_file(path, STILL_QUALITY) {
            Ok(bytes) => self.set_key_image_stream(&bytes, key),
            Err(e) => warn!("set_key_image_file: encode failed: {e}"),
        }
    }

    /// Render a decoded canvas onto a key.
    pub fn set_key_image(&self, image: &DynamicImage, key: u16) {
        let Some(spec) = self.render_spec_for_key(key) else {
            warn!("set_key_image: key {key} out of range");
            return;
        };
        match spec.render(image, STILL_QUALITY) {
            Ok(bytes) => self.set_key_image_stream(&bytes, key),
            Err(e) => warn!("set_key_image: encode failed: {e}"),
        }
    }

    /// Ship pre-encoded bytes to a key. The container must match the
    /// target's codec; mismatches are dropped here, not on the device.
    pub fn set_key_image_stream(&self, stream: &[u8], key: u16) {
        let Some(spec) = self.render_spec_for_key(key) else {
            warn!("set_key_image_stream: key {key} out of range");
            return;
        };
        if !self.transport.can_write() {
            debug!("set_key_image_stream: transport not writable");
            return;
        }
        let magic_ok = match spec.codec {
            ImageCodec::Jpeg => is_jpeg_data(stream),
            ImageCodec::Png => is_png_data(stream),
            _ => true,
        };
        if !magic_ok {
            warn!("set_key_image_stream: container does not match key codec");
            return;
        }
        let _ = self.transport.set_key_image_stream(stream, key as u8);
    }

    // === Background images ===

    fn background_available(&self) -> bool {
        if self.bg_spec.is_none() {
            debug!("background not supported on this model");
            return false;
        }
        if self.descriptor.family == ModelFamily::N1
            && firmware_suffix(&self.descriptor.firmware)
                .map_or(true, |suffix| suffix < N1_BACKGROUND_MIN_SUFFIX)
        {
            debug!("background requires newer N1 firmware");
            return false;
        }
        true
    }

    /// Render an image file as the full-screen background.
    pub fn set_background_image_file(&self, path: impl AsRef<std::path::Path>) {
        let Some(spec) = self.bg_spec.as_ref().filter(|_| self.background_available()) else {
            return;
        };
        match spec.render_file(path, STILL_QUALITY) {
            Ok(bytes) => self.set_background_image_stream(&bytes),
            Err(e) => warn!("set_background_image_file: encode failed: {e}"),
        }
    }

    /// Render a decoded canvas as the full-screen background.
    pub fn set_background_image(&self, image: &DynamicImage) {
        let Some(spec) = self.bg_spec.as_ref().filter(|_| self.background_available()) else {
            return;
        };
        match spec.render(image, STILL_QUALITY) {
            Ok(bytes) => self.set_background_image_stream(&bytes),
            Err(e) => warn!("set_background_image: encode failed: {e}"),
        }
    }

    /// Ship pre-encoded background bytes: a JPEG stream on dual-mode
    /// firmware, a raw bitmap otherwise.
    pub fn set_background_image_stream(&self, stream: &[u8]) {
        if !self.background_available() || !self.transport.can_write() {
            return;
        }
        let result = if self.caps.is_dual_device {
            self.transport
                .set_background_image_stream(stream, self.background_timeout_ms)
        } else {
            self.transport
                .set_background_bitmap(stream, self.background_timeout_ms)
        };
        if let Err(e) = result {
            warn!("set_background_image_stream: {e}");
        }
    }

    // === Animations ===

    /// Decompose an animated GIF file onto a key.
    pub fn set_key_animation_file(&self, path: impl AsRef<std::path::Path>, key: u16) {
        let Some(spec) = self.render_spec_for_key(key) else {
            warn!("set_key_animation_file: key {key} out of range");
            return;
        };
        match split_animation_file(path, spec, ANIMATION_QUALITY) {
            Ok(frames) => self.set_key_animation_frames(frames, key),
            Err(e) => warn!("set_key_animation_file: split failed: {e}"),
        }
    }

    /// Install pre-rendered frames onto a key, replacing any prior track.
    pub fn set_key_animation_frames(&self, frames: Vec<AnimationFrame>, key: u16) {
        if self.out_of_range(key) {
            warn!("set_key_animation_frames: key {key} out of range");
            return;
        }
        let Some(scheduler) = self.scheduler.as_ref() else {
            debug!("animations need dual-mode firmware");
            return;
        };
        if !self.transport.can_write() {
            return;
        }
        match Track::from_frames(frames) {
            Some(track) => scheduler.set_track(key, track),
            None => warn!("set_key_animation_frames: empty frame list"),
        }
    }

    /// Remove the track at `key` without stopping the loop.
    pub fn clear_key_animation(&self, key: u16) {
        if let Some(scheduler) = self.scheduler.as_ref() {
            scheduler.clear_track(key);
        }
    }

    /// Decompose an animated GIF file into the background layer at `(x, y)`.
    pub fn set_background_animation_file(&self, path: impl AsRef<std::path::Path>, x: u16, y: u16) {
        let Some(spec) = self.bg_gif_spec.as_ref() else {
            debug!("background animation not supported on this model");
            return;
        };
        match split_animation_file(path, spec, ANIMATION_QUALITY) {
            Ok(frames) => self.set_background_animation_frames(frames, x, y),
            Err(e) => warn!("set_background_animation_file: split failed: {e}"),
        }
    }

    /// Install pre-rendered frames as the background track.
    pub fn set_background_animation_frames(&self, frames: Vec<AnimationFrame>, x: u16, y: u16) {
        if self.bg_gif_spec.is_none() {
            debug!("background animation not supported on this model");
            return;
        }
        let Some(scheduler) = self.scheduler.as_ref() else {
            return;
        };
        if !self.transport.can_write() {
            return;
        }
        match Track::from_frames(frames) {
            Some(track) => {
                scheduler.set_background_placement(x, y, 0);
                scheduler.set_track(BACKGROUND_TRACK, track);
            }
            None => warn!("set_background_animation_frames: empty frame list"),
        }
    }

    /// Decompose in-memory animated GIF bytes onto a key.
    pub fn set_key_animation_bytes(&self, bytes: &[u8], key: u16) {
        let Some(spec) = self.render_spec_for_key(key) else {
            warn!("set_key_animation_bytes: key {key} out of range");
            return;
        };
        match split_animation_bytes(bytes, spec, ANIMATION_QUALITY) {
            Ok(frames) => self.set_key_animation_frames(frames, key),
            Err(e) => warn!("set_key_animation_bytes: split failed: {e}"),
        }
    }

    /// Drop the background track.
    pub fn clear_background_animation(&self) {
        if let Some(scheduler) = self.scheduler.as_ref() {
            scheduler.clear_track(BACKGROUND_TRACK);
        }
    }

    /// Clear an animated layer on the device itself.
    pub fn clear_background_frame_layer(&self, position: u8) {
        if self.caps.supports_background_gif && self.transport.can_write() {
            self.transport.clear_background_frame_stream(position);
        }
    }

    pub fn start_animation_loop(&self) {
        if let Some(scheduler) = self.scheduler.as_ref() {
            scheduler.start();
        }
    }

    pub fn stop_animation_loop(&self) {
        if let Some(scheduler) = self.scheduler.as_ref() {
            scheduler.pause();
        }
    }

    // === Input events ===

    pub fn start_input_loop(&self) {
        self.reader.start();
    }

    pub fn stop_input_loop(&self) {
        self.reader.pause();
    }

    /// Register a listener for `(key, event)`. Asynchronous listeners run on
    /// a detached thread per invocation; synchronous ones run inside the
    /// reader loop.
    pub fn register_listener(
        &self,
        key: u16,
        event: Event,
        callback: EventCallback,
        run_async: bool,
    ) {
        self.reader.register(
            key,
            event,
            Listener {
                callback,
                run_async,
            },
        );
    }

    pub fn unregister_listener(&self, key: u16, event: Event) {
        self.reader.unregister(key, event);
    }

    /// Register a listener for every raw response frame.
    pub fn register_raw_listener(&self, callback: RawCallback, run_async: bool) {
        self.reader.register_raw(RawListener {
            callback,
            run_async,
        });
    }

    pub fn unregister_raw_listener(&self) {
        self.reader.unregister_raw();
    }

    // === Heartbeat ===

    pub fn start_heartbeat(&self) {
        self.heartbeat.start();
    }

    pub fn stop_heartbeat(&self) {
        self.heartbeat.pause();
    }

    // === RGB strip ===

    pub fn set_led_brightness(&self, brightness: u8) {
        self.rgb.set_led_brightness(brightness);
    }

    pub fn set_led_color(&self, r: u8, g: u8, b: u8) {
        self.rgb.set_led_color(r, g, b);
    }

    pub fn reset_led_color(&self) {
        self.rgb.reset_led_color();
    }

    // === Configuration & modes ===

    pub fn set_device_config(&self, configs: &[u8]) {
        self.configer.set_device_config(configs);
    }

    /// Switch the runtime mode. Only the N1 family understands this.
    pub fn change_mode(&self, mode: u8) {
        if self.descriptor.family != ModelFamily::N1 {
            debug!("change_mode ignored: not an N1");
            return;
        }
        self.transport.change_mode(mode);
    }

    // === K1Pro keyboard backlight ===

    fn keyboard_gated(&self) -> bool {
        if self.descriptor.family != ModelFamily::K1Pro {
            debug!("keyboard backlight commands need a K1Pro");
            return false;
        }
        self.transport.can_write()
    }

    /// Keyboard backlight brightness, 0-6.
    pub fn set_keyboard_backlight_brightness(&self, brightness: u8) {
        if self.keyboard_gated() {
            self.transport.set_keyboard_backlight_brightness(brightness);
        }
    }

    /// Lighting effect 0-9; 0 is static and forces the speed to 0 first.
    pub fn set_keyboard_lighting_effect(&self, effect: u8) {
        if self.keyboard_gated() {
            if effect == 0 {
                self.transport.set_keyboard_lighting_speed(0);
            }
            self.transport.set_keyboard_lighting_effect(effect);
        }
    }

    /// Lighting effect speed, 0-7.
    pub fn set_keyboard_lighting_speed(&self, speed: u8) {
        if self.keyboard_gated() {
            self.transport.set_keyboard_lighting_speed(speed);
        }
    }

    pub fn set_keyboard_rgb_backlight(&self, r: u8, g: u8, b: u8) {
        if self.keyboard_gated() {
            self.transport.set_keyboard_rgb_backlight(r, g, b);
        }
    }

    /// OS mode: 0 Windows, 1 Mac.
    pub fn keyboard_os_mode_switch(&self, os_mode: u8) {
        if self.keyboard_gated() {
            self.transport.keyboard_os_mode_switch(os_mode);
        }
    }

    /// The catalog entry this device was bound from.
    pub fn model(&self) -> &'static ModelSpec {
        self.spec
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        // controllers first, transport last: input, scheduler, rgb,
        // heartbeat, config
        self.reader.stop();
        if let Some(scheduler) = self.scheduler.as_ref() {
            scheduler.stop();
        }
        self.heartbeat.stop();
    }
}

/// Trailing number of a firmware string, e.g. `"V1.05.13"` → 13.
fn firmware_suffix(version: &str) -> Option<u32> {
    let tail = version.rsplit('.').next()?;
    let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_suffix_parses_trailing_number() {
        assert_eq!(firmware_suffix("V1.05.13"), Some(13));
        assert_eq!(firmware_suffix("V1.12"), Some(12));
        assert_eq!(firmware_suffix("V1.13beta"), Some(13));
        assert_eq!(firmware_suffix("nodots"), None);
        assert_eq!(firmware_suffix("V1."), None);
    }
}
