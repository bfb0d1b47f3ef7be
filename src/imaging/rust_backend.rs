//! Pure Rust encoder backend, no system libraries.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 1–100) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, quality ignored) |
//! | Alpha flattening | composited over white before JPEG encoding |

use super::backend::{BackendError, ImageBackend};
use super::canvas::WorkingCanvas;
use super::params::{EncodeFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

/// Encoder backed by the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Composite RGBA over a white background. JPEG has no alpha channel.
fn flatten_on_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let over = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([over(r), over(g), over(b)])
    })
}

fn encode_jpeg(rgba: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = flatten_on_white(rgba);
    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.percent());
        encoder
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| BackendError::EncodeFailed(format!("JPEG encode failed: {}", e)))?;
    }
    Ok(buf)
}

fn encode_png(rgba: &RgbaImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BackendError::EncodeFailed(format!("PNG encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn encode(
        &self,
        canvas: &WorkingCanvas,
        format: EncodeFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        match format {
            EncodeFormat::Jpeg => encode_jpeg(canvas.pixels(), quality),
            EncodeFormat::Png => encode_png(canvas.pixels()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{SourceFormat, SourceImage};

    /// Noisy-ish pattern so JPEG size actually depends on quality.
    fn pattern_canvas(width: u32, height: u32) -> WorkingCanvas {
        let pixels = RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 13) ^ (x * y)) as u8;
            image::Rgba([v, v.wrapping_mul(3), (x % 256) as u8, 255])
        });
        let source = SourceImage::new(pixels, SourceFormat::Png, 0);
        WorkingCanvas::from_source(&source, width, height)
    }

    #[test]
    fn jpeg_output_has_jpeg_magic() {
        let canvas = pattern_canvas(64, 48);
        let bytes = RustBackend::new()
            .encode(&canvas, EncodeFormat::Jpeg, Quality::new(0.8))
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn png_output_has_png_magic() {
        let canvas = pattern_canvas(32, 32);
        let bytes = RustBackend::new()
            .encode(&canvas, EncodeFormat::Png, Quality::new(0.5))
            .unwrap();
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn jpeg_decodes_back_at_canvas_size() {
        let canvas = pattern_canvas(80, 60);
        let bytes = RustBackend::new()
            .encode(&canvas, EncodeFormat::Jpeg, Quality::new(0.7))
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 60));
    }

    #[test]
    fn jpeg_is_deterministic() {
        let canvas = pattern_canvas(40, 40);
        let backend = RustBackend::new();
        let a = backend
            .encode(&canvas, EncodeFormat::Jpeg, Quality::new(0.6))
            .unwrap();
        let b = backend
            .encode(&canvas, EncodeFormat::Jpeg, Quality::new(0.6))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn jpeg_size_grows_with_quality() {
        let canvas = pattern_canvas(128, 128);
        let backend = RustBackend::new();
        let low = backend
            .encode(&canvas, EncodeFormat::Jpeg, Quality::new(0.1))
            .unwrap();
        let high = backend
            .encode(&canvas, EncodeFormat::Jpeg, Quality::new(1.0))
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn png_ignores_quality() {
        let canvas = pattern_canvas(32, 32);
        let backend = RustBackend::new();
        let low = backend
            .encode(&canvas, EncodeFormat::Png, Quality::new(0.1))
            .unwrap();
        let high = backend
            .encode(&canvas, EncodeFormat::Png, Quality::new(1.0))
            .unwrap();
        assert_eq!(low, high);
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let rgba = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 0]));
        let rgb = flatten_on_white(&rgba);
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);

        let opaque = RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        assert_eq!(flatten_on_white(&opaque).get_pixel(0, 0).0, [10, 20, 30]);
    }
}
