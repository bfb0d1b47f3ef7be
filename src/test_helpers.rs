//! Shared test utilities for the photo-fit test suite.
//!
//! Synthetic images are generated in memory so tests never depend on binary
//! fixtures. The pattern has enough detail that JPEG size responds to quality.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_test_image(tmp.path(), "photo.jpg", 800, 600);
//! let source = intake::read_source(&path).unwrap();
//! ```

use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// In-memory images
// =========================================================================

/// Deterministic textured RGBA pattern.
pub fn test_pattern(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let v = ((x * 7 + y * 13) ^ (x * y)) as u8;
        image::Rgba([v, v.wrapping_mul(3), (x % 256) as u8, 255])
    })
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    let image = image::DynamicImage::ImageRgba8(test_pattern(width, height));
    // JPEG can't hold alpha
    let image = match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

// =========================================================================
// On-disk images
// =========================================================================

/// Write a synthetic image into `dir`. The extension picks the format:
/// `.png` → PNG, anything else → JPEG.
pub fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let bytes = if name.ends_with(".png") {
        encode_test_png(width, height)
    } else {
        encode_test_jpeg(width, height)
    };
    std::fs::write(&path, bytes).unwrap();
    path
}
