//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the caller (CLI, config, batch processing) and the
//! [`search`](super::search) engine, which decides how many encodes to run and
//! at which sizes. Nothing in here reads UI or config state; every request is
//! an explicit value.
//!
//! ## Types
//!
//! - [`Quality`]: Encoder quality scalar (0.1–1.0). Clamped on construction.
//! - [`Sharpening`]: Blend strength of the 3×3 unsharp mask.
//! - [`EncodeFormat`]: Raster formats the encoder produces (JPEG, PNG).
//! - [`TargetFormat`]: What the user asked for (JPEG, PNG, or a PDF wrapper).
//! - [`DimensionConstraints`]: Optional custom width/height.
//! - [`TargetSpec`]: Full request: size budget, format, constraints, auto-resize.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Size budget used when the requested one is missing or malformed.
pub const DEFAULT_MAX_SIZE_KB: f64 = 50.0;

/// Quality scalar for lossy encoding, always within `[0.1, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Quality(f32);

impl Quality {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 1.0;

    /// Clamp into the valid range. NaN maps to the minimum.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality as the 1–100 integer scale JPEG encoders expect.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Blend strength for the unsharp mask.
///
/// `mix = 0` leaves pixels untouched, `mix = 1` replaces them with the fully
/// convolved value. Anything in between is a linear blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub mix: f32,
}

impl Sharpening {
    /// Upscaling by more than 20% leaves visible blur.
    pub fn upscale() -> Self {
        Self { mix: 0.35 }
    }

    /// Heavy downscales ring easily; keep it light.
    pub fn heavy_downscale() -> Self {
        Self { mix: 0.12 }
    }

    pub fn standard() -> Self {
        Self { mix: 0.20 }
    }

    /// Fixed strength used while shrinking in the downscale fallback.
    pub fn fallback() -> Self {
        Self { mix: 0.25 }
    }
}

/// Formats the encoder can produce directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EncodeFormat {
    Jpeg,
    Png,
}

impl EncodeFormat {
    pub fn mime(self) -> &'static str {
        match self {
            EncodeFormat::Jpeg => "image/jpeg",
            EncodeFormat::Png => "image/png",
        }
    }

    /// Whether the quality scalar has any effect on output size.
    pub fn has_quality_axis(self) -> bool {
        matches!(self, EncodeFormat::Jpeg)
    }
}

/// Output requested by the user.
///
/// Serialized as the MIME type, which is also what config files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetFormat {
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "application/pdf")]
    Pdf,
}

impl TargetFormat {
    pub fn mime(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
            TargetFormat::Pdf => "application/pdf",
        }
    }

    /// The raster format the search encodes to. PDFs wrap a JPEG.
    pub fn encode_format(self) -> EncodeFormat {
        match self {
            TargetFormat::Jpeg | TargetFormat::Pdf => EncodeFormat::Jpeg,
            TargetFormat::Png => EncodeFormat::Png,
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::Png => "PNG",
            TargetFormat::Pdf => "PDF",
        };
        f.write_str(label)
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    /// Accepts MIME types and the usual short names (`jpg`, `jpeg`, `png`, `pdf`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "jpeg" | "jpg" => Ok(TargetFormat::Jpeg),
            "image/png" | "png" => Ok(TargetFormat::Png),
            "application/pdf" | "pdf" => Ok(TargetFormat::Pdf),
            other => Err(format!(
                "unknown format '{other}' (expected jpeg, png, pdf or a MIME type)"
            )),
        }
    }
}

/// Optional custom output dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DimensionConstraints {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl DimensionConstraints {
    /// Build from raw, possibly malformed numbers.
    ///
    /// Values are truncated like an integer parse. NaN, infinities, and
    /// anything below 1 after truncation count as "not given".
    pub fn from_raw(width: Option<f64>, height: Option<f64>) -> Self {
        Self {
            width: width.and_then(positive_dimension),
            height: height.and_then(positive_dimension),
        }
    }
}

fn positive_dimension(value: f64) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    if truncated < 1.0 {
        return None;
    }
    Some(truncated.min(u32::MAX as f64) as u32)
}

/// One compression request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSpec {
    pub max_size_kb: f64,
    pub format: TargetFormat,
    pub constraints: DimensionConstraints,
    pub auto_resize: bool,
}

impl TargetSpec {
    /// Build a spec, replacing a missing or non-positive budget with the default.
    pub fn new(
        max_size_kb: Option<f64>,
        format: TargetFormat,
        constraints: DimensionConstraints,
        auto_resize: bool,
    ) -> Self {
        let max_size_kb = max_size_kb
            .filter(|kb| kb.is_finite() && *kb > 0.0)
            .unwrap_or(DEFAULT_MAX_SIZE_KB);
        Self {
            max_size_kb,
            format,
            constraints,
            auto_resize,
        }
    }

    /// Whether an encoded blob of `len` bytes fits the budget.
    pub fn fits(&self, len: usize) -> bool {
        size_kb(len) <= self.max_size_kb
    }
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self::new(
            None,
            TargetFormat::default(),
            DimensionConstraints::default(),
            false,
        )
    }
}

/// Byte length expressed in kilobytes (1 KB = 1024 bytes).
pub fn size_kb(len: usize) -> f64 {
    len as f64 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0.0).value(), 0.1);
        assert_eq!(Quality::new(0.55).value(), 0.55);
        assert_eq!(Quality::new(1.5).value(), 1.0);
        assert_eq!(Quality::new(f32::NAN).value(), 0.1);
    }

    #[test]
    fn quality_percent_scale() {
        assert_eq!(Quality::new(0.75).percent(), 75);
        assert_eq!(Quality::new(0.1).percent(), 10);
        assert_eq!(Quality::new(1.0).percent(), 100);
    }

    #[test]
    fn sharpening_bands() {
        assert_eq!(Sharpening::upscale().mix, 0.35);
        assert_eq!(Sharpening::heavy_downscale().mix, 0.12);
        assert_eq!(Sharpening::standard().mix, 0.20);
        assert_eq!(Sharpening::fallback().mix, 0.25);
    }

    #[test]
    fn target_format_parses_mime_and_short_names() {
        assert_eq!("image/jpeg".parse::<TargetFormat>(), Ok(TargetFormat::Jpeg));
        assert_eq!("JPG".parse::<TargetFormat>(), Ok(TargetFormat::Jpeg));
        assert_eq!("png".parse::<TargetFormat>(), Ok(TargetFormat::Png));
        assert_eq!("application/pdf".parse::<TargetFormat>(), Ok(TargetFormat::Pdf));
        assert!("image/webp".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn pdf_encodes_as_jpeg() {
        assert_eq!(TargetFormat::Pdf.encode_format(), EncodeFormat::Jpeg);
        assert_eq!(TargetFormat::Png.encode_format(), EncodeFormat::Png);
        assert!(!EncodeFormat::Png.has_quality_axis());
    }

    #[test]
    fn file_extensions() {
        assert_eq!(TargetFormat::Jpeg.file_extension(), "jpg");
        assert_eq!(TargetFormat::Png.file_extension(), "png");
        assert_eq!(TargetFormat::Pdf.file_extension(), "pdf");
    }

    #[test]
    fn constraints_drop_malformed_values() {
        let c = DimensionConstraints::from_raw(Some(f64::NAN), Some(-20.0));
        assert_eq!(c, DimensionConstraints::default());

        let c = DimensionConstraints::from_raw(Some(0.4), Some(f64::INFINITY));
        assert_eq!(c, DimensionConstraints::default());
    }

    #[test]
    fn constraints_truncate_fractions() {
        let c = DimensionConstraints::from_raw(Some(600.9), None);
        assert_eq!(c.width, Some(600));
        assert_eq!(c.height, None);
    }

    #[test]
    fn target_spec_defaults_bad_budget() {
        let none = TargetSpec::new(None, TargetFormat::Jpeg, Default::default(), false);
        let negative = TargetSpec::new(Some(-3.0), TargetFormat::Jpeg, Default::default(), false);
        let nan = TargetSpec::new(Some(f64::NAN), TargetFormat::Jpeg, Default::default(), false);
        assert_eq!(none.max_size_kb, 50.0);
        assert_eq!(negative.max_size_kb, 50.0);
        assert_eq!(nan.max_size_kb, 50.0);
    }

    #[test]
    fn target_spec_fits_is_inclusive() {
        let spec = TargetSpec::new(Some(2.0), TargetFormat::Jpeg, Default::default(), false);
        assert!(spec.fits(2048));
        assert!(!spec.fits(2049));
    }
}
