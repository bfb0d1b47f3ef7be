//! Scratch raster owned by a single compression run.
//!
//! The canvas is redrawn from the source every time the search changes the
//! output size, then sharpened and handed to the encoder. It never outlives
//! the run that created it and is never shared between runs.

use super::params::Sharpening;
use super::sharpen::sharpen_rgba;
use super::source::SourceImage;
use image::RgbaImage;
use image::imageops::{self, FilterType};

#[derive(Debug, Clone)]
pub struct WorkingCanvas {
    pixels: RgbaImage,
}

impl WorkingCanvas {
    /// Draw `source` at `width × height` into a fresh canvas.
    pub fn from_source(source: &SourceImage, width: u32, height: u32) -> Self {
        let mut canvas = Self {
            pixels: RgbaImage::new(0, 0),
        };
        canvas.redraw(source, width, height);
        canvas
    }

    /// Resize the canvas and redraw the source into it with Lanczos3.
    pub fn redraw(&mut self, source: &SourceImage, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.pixels = if source.dimensions() == (width, height) {
            source.pixels().clone()
        } else {
            imageops::resize(source.pixels(), width, height, FilterType::Lanczos3)
        };
    }

    /// Apply the unsharp mask. A canvas whose pixels can't be read is left
    /// as-is; the run continues unsharpened.
    pub fn sharpen(&mut self, sharpening: Sharpening) -> bool {
        let (width, height) = self.pixels.dimensions();
        match sharpen_rgba(&mut self.pixels, width, height, sharpening.mix) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("skipping sharpen on {width}x{height} canvas: {e}");
                false
            }
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

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
