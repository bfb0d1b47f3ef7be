//! File intake: format check, decode, crop and rotate.
//!
//! Only JPEG and PNG are accepted, and the decision is made from the file's
//! leading bytes, never its extension:
//!
//! | Header | Format |
//! |---|---|
//! | `FF D8` | JPEG |
//! | `89 50 4E 47` | PNG |
//!
//! Anything else is rejected before decoding starts. Crop and rotate produce
//! a new [`SourceImage`], so the compression core always sees an image that
//! is already in its final orientation and framing.
//!
//! Rotation is applied first and the crop rectangle is read in the rotated
//! image's coordinates, the same way an interactive crop tool shows it.

use crate::imaging::{SourceFormat, SourceImage};
use image::imageops;
use image::{ImageFormat, ImageReader, RgbaImage};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid file format: only JPEG and PNG images are supported")]
    UnrecognizedFormat,
    #[error("failed to decode {format} image: {message}")]
    Decode {
        format: SourceFormat,
        message: String,
    },
    #[error("unsupported rotation {0}; use a multiple of 90 degrees")]
    InvalidRotation(i32),
    #[error("invalid crop '{0}': expected X,Y,WIDTH,HEIGHT")]
    InvalidCrop(String),
    #[error("crop {crop} leaves nothing of the {width}x{height} image")]
    EmptyCrop {
        crop: CropRect,
        width: u32,
        height: u32,
    },
}

/// Identify the container format from the first bytes of a file.
pub fn sniff_format(header: &[u8]) -> Result<SourceFormat, IntakeError> {
    if header.starts_with(JPEG_MAGIC) {
        Ok(SourceFormat::Jpeg)
    } else if header.starts_with(PNG_MAGIC) {
        Ok(SourceFormat::Png)
    } else {
        Err(IntakeError::UnrecognizedFormat)
    }
}

fn image_format(format: SourceFormat) -> ImageFormat {
    match format {
        SourceFormat::Jpeg => ImageFormat::Jpeg,
        SourceFormat::Png => ImageFormat::Png,
    }
}

/// Check the header, then decode with the detected format.
pub fn decode_source(bytes: &[u8]) -> Result<SourceImage, IntakeError> {
    let format = sniff_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, image_format(format)).map_err(
        |e| IntakeError::Decode {
            format,
            message: e.to_string(),
        },
    )?;
    Ok(SourceImage::new(decoded.to_rgba8(), format, bytes.len()))
}

/// Read and decode a file from disk.
pub fn read_source(path: &Path) -> Result<SourceImage, IntakeError> {
    let bytes = std::fs::read(path)?;
    decode_source(&bytes)
}

/// Format and dimensions of a file, without decoding pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub format: SourceFormat,
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
}

pub fn inspect(path: &Path) -> Result<SourceInfo, IntakeError> {
    let bytes = std::fs::read(path)?;
    let format = sniff_format(&bytes)?;
    let (width, height) = ImageReader::with_format(Cursor::new(&bytes), image_format(format))
        .into_dimensions()
        .map_err(|e| IntakeError::Decode {
            format,
            message: e.to_string(),
        })?;
    Ok(SourceInfo {
        format,
        width,
        height,
        byte_len: bytes.len(),
    })
}

// ============================================================================
// Rotation
// ============================================================================

/// Clockwise quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    fn apply(self, pixels: RgbaImage) -> RgbaImage {
        match self {
            Rotation::None => pixels,
            Rotation::Cw90 => imageops::rotate90(&pixels),
            Rotation::Cw180 => imageops::rotate180(&pixels),
            Rotation::Cw270 => imageops::rotate270(&pixels),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = IntakeError;

    /// Any multiple of 90; negative values turn counter-clockwise.
    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Cw90),
            180 => Ok(Rotation::Cw180),
            270 => Ok(Rotation::Cw270),
            _ => Err(IntakeError::InvalidRotation(degrees)),
        }
    }
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let degrees: i32 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a whole number of degrees"))?;
        Rotation::try_from(degrees).map_err(|e| e.to_string())
    }
}

// ============================================================================
// Crop
// ============================================================================

/// Pixel rectangle in the (already rotated) image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Clip the rectangle to an image of `width × height`.
    ///
    /// Returns `None` if nothing of the image remains.
    pub fn clamp_to(self, width: u32, height: u32) -> Option<CropRect> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(CropRect {
            x: self.x,
            y: self.y,
            width: w,
            height: h,
        })
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl FromStr for CropRect {
    type Err = IntakeError;

    /// Parses `X,Y,WIDTH,HEIGHT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| IntakeError::InvalidCrop(s.to_string()))?;
        match parts.as_slice() {
            [x, y, width, height] => Ok(CropRect {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            }),
            _ => Err(IntakeError::InvalidCrop(s.to_string())),
        }
    }
}

// ============================================================================
// Adjustments
// ============================================================================

/// User edits applied to a decoded image before compression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjustments {
    pub rotation: Rotation,
    pub crop: Option<CropRect>,
}

impl Adjustments {
    pub fn is_identity(&self) -> bool {
        self.rotation == Rotation::None && self.crop.is_none()
    }

    /// Rotate, then crop.
    pub fn apply(&self, source: SourceImage) -> Result<SourceImage, IntakeError> {
        if self.is_identity() {
            return Ok(source);
        }

        let rotated = self.rotation.apply(source.pixels().clone());
        let pixels = match self.crop {
            None => rotated,
            Some(crop) => {
                let (width, height) = rotated.dimensions();
                let clipped = crop.clamp_to(width, height).ok_or(IntakeError::EmptyCrop {
                    crop,
                    width,
                    height,
                })?;
                imageops::crop_imm(&rotated, clipped.x, clipped.y, clipped.width, clipped.height)
                    .to_image()
            }
        };
        log::debug!(
            "adjusted {}x{} source to {}x{} ({:?}, crop {:?})",
            source.width(),
            source.height(),
            pixels.width(),
            pixels.height(),
            self.rotation,
            self.crop
        );
        Ok(source.with_pixels(pixels))
    }
}
