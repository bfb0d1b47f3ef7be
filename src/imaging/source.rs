//! Decoded input images.

use image::RgbaImage;
use serde::Serialize;
use std::fmt;

/// Container format detected from the file's magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceFormat {
    Jpeg,
    Png,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Jpeg => f.write_str("JPEG"),
            SourceFormat::Png => f.write_str("PNG"),
        }
    }
}

/// An immutable decoded raster. The search only ever reads it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
    format: SourceFormat,
    /// Size of the encoded file it was decoded from.
    byte_len: usize,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage, format: SourceFormat, byte_len: usize) -> Self {
        Self {
            pixels,
            format,
            byte_len,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Replace the pixels, keeping format and original size. Used by the
    /// crop/rotate step, which hands the core an already-edited image.
    pub fn with_pixels(self, pixels: RgbaImage) -> Self {
        Self { pixels, ..self }
    }
}
