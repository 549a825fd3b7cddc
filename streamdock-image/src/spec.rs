//! Per-target render specifications
//!
//! Each display target on a device (background, key tile, second-screen key,
//! background animation) carries one [`RenderSpec`]: target geometry plus the
//! transform chain and output container that turn arbitrary input pixels into
//! bytes the panel accepts.
//!
//! Processing order is fixed: crop-if-valid (else resize or pad), rotate,
//! flip, encode. Cardinal rotations are lossless; any other angle samples the
//! source around its center with the canvas size preserved.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::error::PipelineError;

/// Default JPEG quality for still images
pub const STILL_QUALITY: u8 = 95;

/// JPEG quality for animation frames. Lower than stills to cut USB transfer
/// volume; Linux hosts (commonly VMs in this stack) drop further.
#[cfg(target_os = "linux")]
pub const ANIMATION_QUALITY: u8 = 60;
#[cfg(not(target_os = "linux"))]
pub const ANIMATION_QUALITY: u8 = 70;

/// Output container for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageCodec {
    #[default]
    Jpeg,
    Png,
    Webp,
    /// Raw pixel buffer; layout chosen by [`RawFormat`]
    Raw,
}

/// Pixel layout for [`ImageCodec::Raw`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawFormat {
    #[default]
    Bgr888,
    Rgb565,
}

/// Behavior when the source does not match the target size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizePolicy {
    /// Stretch to exactly (w, h)
    #[default]
    Scale,
    /// Preserve aspect, center on a black canvas
    Pad,
}

/// Source crop rectangle, applied before any resize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Transform chain + output container for one display target
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSpec {
    pub width: u32,
    pub height: u32,
    pub rotate_degrees: f64,
    pub flip_vertical: bool,
    pub flip_horizontal: bool,
    pub resize: ResizePolicy,
    pub crop: Option<CropRect>,
    pub codec: ImageCodec,
    pub raw_format: RawFormat,
}

impl RenderSpec {
    pub fn new(width: u32, height: u32, rotate_degrees: f64, codec: ImageCodec) -> Self {
        Self {
            width,
            height,
            rotate_degrees,
            flip_vertical: false,
            flip_horizontal: false,
            resize: ResizePolicy::Scale,
            crop: None,
            codec,
            raw_format: RawFormat::Bgr888,
        }
    }

    pub fn with_flips(mut self, vertical: bool, horizontal: bool) -> Self {
        self.flip_vertical = vertical;
        self.flip_horizontal = horizontal;
        self
    }

    pub fn with_raw_format(mut self, format: RawFormat) -> Self {
        self.raw_format = format;
        self
    }

    /// Run the full chain over an already-decoded canvas.
    pub fn render(&self, source: &DynamicImage, quality: u8) -> Result<Vec<u8>, PipelineError> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::ParamInvalid("zero-dimension render target"));
        }
        let (sw, sh) = source.dimensions();
        if sw == 0 || sh == 0 {
            return Err(PipelineError::ParamInvalid("zero-dimension source image"));
        }

        let mut img = self.crop_or_resize(source);
        img = rotate(&img, self.rotate_degrees);
        if self.flip_vertical {
            img = img.flipv();
        }
        if self.flip_horizontal {
            img = img.fliph();
        }
        self.encode(&img, quality)
    }

    /// Decode an encoded container, then run the chain.
    pub fn render_bytes(&self, bytes: &[u8], quality: u8) -> Result<Vec<u8>, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::ParamInvalid("empty image payload"));
        }
        let source = image::load_from_memory(bytes)?;
        self.render(&source, quality)
    }

    /// Load a file, then run the chain.
    pub fn render_file(
        &self,
        path: impl AsRef<std::path::Path>,
        quality: u8,
    ) -> Result<Vec<u8>, PipelineError> {
        let source = image::open(path)?;
        self.render(&source, quality)
    }

    fn crop_or_resize(&self, source: &DynamicImage) -> DynamicImage {
        let (sw, sh) = source.dimensions();
        if let Some(crop) = self.crop {
            // use the crop only when it lies fully inside the source
            if crop.width > 0
                && crop.height > 0
                && crop.x.saturating_add(crop.width) <= sw
                && crop.y.saturating_add(crop.height) <= sh
            {
                let cropped = source.crop_imm(crop.x, crop.y, crop.width, crop.height);
                if (crop.width, crop.height) == (self.width, self.height) {
                    return cropped;
                }
                return cropped.resize_exact(self.width, self.height, FilterType::Lanczos3);
            }
        }
        match self.resize {
            ResizePolicy::Scale => {
                source.resize_exact(self.width, self.height, FilterType::Lanczos3)
            }
            ResizePolicy::Pad => {
                let fitted = source.resize(self.width, self.height, FilterType::Lanczos3);
                let mut canvas = RgbaImage::from_pixel(
                    self.width,
                    self.height,
                    image::Rgba([0, 0, 0, 255]),
                );
                let (fw, fh) = fitted.dimensions();
                let ox = i64::from((self.width - fw) / 2);
                let oy = i64::from((self.height - fh) / 2);
                image::imageops::overlay(&mut canvas, &fitted.to_rgba8(), ox, oy);
                DynamicImage::ImageRgba8(canvas)
            }
        }
    }

    fn encode(&self, img: &DynamicImage, quality: u8) -> Result<Vec<u8>, PipelineError> {
        let mut out = Vec::new();
        match self.codec {
            ImageCodec::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
                rgb.write_with_encoder(encoder)?;
            }
            ImageCodec::Png => {
                let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
                let encoder = PngEncoder::new(Cursor::new(&mut out));
                rgba.write_with_encoder(encoder)?;
            }
            ImageCodec::Webp => {
                let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
                let encoder = WebPEncoder::new_lossless(Cursor::new(&mut out));
                rgba.write_with_encoder(encoder)?;
            }
            ImageCodec::Raw => {
                let rgb = img.to_rgb8();
                match self.raw_format {
                    RawFormat::Bgr888 => {
                        out.reserve(rgb.len());
                        for pixel in rgb.pixels() {
                            out.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
                        }
                    }
                    RawFormat::Rgb565 => {
                        out.reserve(rgb.len() / 3 * 2);
                        for pixel in rgb.pixels() {
                            let packed = (u16::from(pixel[0] >> 3) << 11)
                                | (u16::from(pixel[1] >> 2) << 5)
                                | u16::from(pixel[2] >> 3);
                            out.extend_from_slice(&packed.to_be_bytes());
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Rotate a canvas. Cardinal angles are exact; anything else is sampled
/// around the center with the original size preserved and black fill.
fn rotate(img: &DynamicImage, degrees: f64) -> DynamicImage {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        return img.clone();
    }
    match normalized {
        90.0 => img.rotate90(),
        180.0 => img.rotate180(),
        270.0 => img.rotate270(),
        _ => rotate_sampled(img, normalized),
    }
}

fn rotate_sampled(img: &DynamicImage, degrees: f64) -> DynamicImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut out = RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 0, 255]));
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    let cx = f64::from(w) / 2.0;
    let cy = f64::from(h) / 2.0;
    for y in 0..h {
        for x in 0..w {
            // inverse mapping: destination pixel pulled from the source
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            let sx = cos * dx + sin * dy + cx;
            let sy = -sin * dx + cos * dy + cy;
            if sx >= 0.0 && sy >= 0.0 && (sx as u32) < w && (sy as u32) < h {
                out.put_pixel(x, y, *rgba.get_pixel(sx as u32, sy as u32));
            }
        }
    }
    DynamicImage::ImageRgba8(out)
}
