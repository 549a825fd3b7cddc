//! Animated image splitting
//!
//! Decomposes an animated GIF into device-formatted frames with per-frame
//! delays. The decoder composes each frame against the animation's disposal
//! semantics before it reaches the render chain, so every produced frame is a
//! complete canvas.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage};
use tracing::debug;

use crate::error::PipelineError;
use crate::spec::RenderSpec;

/// GIF frames with an unspecified delay are shown for this long
pub const DEFAULT_FRAME_DELAY_MS: u16 = 100;

/// One encoded animation frame and how long to hold it
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub data: Vec<u8>,
    pub delay_ms: u16,
}

/// Split an in-memory animated GIF into rendered frames.
pub fn split_animation_bytes(
    bytes: &[u8],
    spec: &RenderSpec,
    quality: u8,
) -> Result<Vec<AnimationFrame>, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::ParamInvalid("empty animation payload"));
    }
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    let mut frames = Vec::new();
    for frame in decoder.into_frames() {
        let frame = frame?;
        // GIF delays are stored in 10 ms ticks; numer/denom already folds that
        let (numer, denom) = frame.delay().numer_denom_ms();
        let delay_ms = (numer / denom.max(1)) as u16;
        let delay_ms = if delay_ms == 0 {
            DEFAULT_FRAME_DELAY_MS
        } else {
            delay_ms
        };

        let canvas = DynamicImage::ImageRgba8(frame.into_buffer());
        let data = spec.render(&canvas, quality)?;
        frames.push(AnimationFrame { data, delay_ms });
    }
    if frames.is_empty() {
        return Err(PipelineError::ParamInvalid("animation has no frames"));
    }
    debug!("split animation into {} frames", frames.len());
    Ok(frames)
}

/// Split an animated GIF file into rendered frames.
pub fn split_animation_file(
    path: impl AsRef<std::path::Path>,
    spec: &RenderSpec,
    quality: u8,
) -> Result<Vec<AnimationFrame>, PipelineError> {
    let bytes = std::fs::read(path)?;
    split_animation_bytes(&bytes, spec, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ImageCodec, ANIMATION_QUALITY};
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, RgbaImage};

    /// Two-frame GIF: red held for 50 ms, then a frame with zero delay.
    fn two_frame_gif() -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut out);
            let red = RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255]));
            let blue = RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 255, 255]));
            encoder
                .encode_frame(Frame::from_parts(
                    red,
                    0,
                    0,
                    Delay::from_numer_denom_ms(50, 1),
                ))
                .unwrap();
            encoder
                .encode_frame(Frame::from_parts(
                    blue,
                    0,
                    0,
                    Delay::from_numer_denom_ms(0, 1),
                ))
                .unwrap();
        }
        out
    }

    #[test]
    fn frames_and_delays_line_up() {
        let spec = RenderSpec::new(8, 8, 0.0, ImageCodec::Jpeg);
        let frames = split_animation_bytes(&two_frame_gif(), &spec, ANIMATION_QUALITY).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].delay_ms, 50);
        // zero delay becomes the default hold
        assert_eq!(frames[1].delay_ms, DEFAULT_FRAME_DELAY_MS);
        for frame in &frames {
            assert_eq!(&frame.data[..2], &[0xFF, 0xD8]);
        }
    }

    #[test]
    fn frames_pass_through_the_target_spec() {
        let spec = RenderSpec::new(4, 4, 180.0, ImageCodec::Png);
        let frames = split_animation_bytes(&two_frame_gif(), &spec, ANIMATION_QUALITY).unwrap();
        let decoded = image::load_from_memory(&frames[0].data).unwrap();
        assert_eq!(decoded.to_rgba8().dimensions(), (4, 4));
    }

    #[test]
    fn garbage_bytes_are_a_codec_error() {
        let spec = RenderSpec::new(8, 8, 0.0, ImageCodec::Jpeg);
        assert!(matches!(
            split_animation_bytes(b"not a gif at all", &spec, ANIMATION_QUALITY),
            Err(PipelineError::Codec(_))
        ));
    }
}
