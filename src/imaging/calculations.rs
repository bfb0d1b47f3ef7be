//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{DimensionConstraints, Sharpening};

/// Longest side allowed when the user gives no custom dimensions.
pub const MAX_AUTO_DIMENSION: u32 = 1200;

/// Neither side may drop below this while shrinking in the fallback loop.
pub const MIN_FALLBACK_DIMENSION: u32 = 200;

/// Maximum number of shrink attempts in the fallback loop.
pub const MAX_FALLBACK_ATTEMPTS: u32 = 20;

/// Largest canvas a run will allocate, in pixels (about 200 MB of RGBA).
pub const MAX_CANVAS_PIXELS: u64 = 50_000_000;

/// Whether a `width × height` canvas is small enough to allocate.
pub fn canvas_fits_memory(dimensions: (u32, u32)) -> bool {
    dimensions.0 as u64 * dimensions.1 as u64 <= MAX_CANVAS_PIXELS
}

/// Resolve the output dimensions for a source image.
///
/// Rules, in priority order:
/// 1. Both custom sides given → used verbatim (aspect ratio may change).
/// 2. Only width → height follows the source aspect ratio.
/// 3. Only height → width follows the source aspect ratio.
/// 4. Neither → cap the longer side at [`MAX_AUTO_DIMENSION`], never upscale.
///
/// # Arguments
/// * `source` - Natural image dimensions (width, height)
/// * `constraints` - Already-normalised custom width/height
///
/// # Returns
/// * `(width, height)` - Target dimensions, each at least 1px
///
/// # Examples
/// ```
/// # use photo_fit::imaging::{DimensionConstraints, resolve_dimensions};
/// // No constraints: 3000x2000 is capped to 1200 on the long side
/// assert_eq!(resolve_dimensions((3000, 2000), DimensionConstraints::default()), (1200, 800));
///
/// // Width only: height follows the aspect ratio
/// let c = DimensionConstraints { width: Some(600), height: None };
/// assert_eq!(resolve_dimensions((1200, 800), c), (600, 400));
/// ```
pub fn resolve_dimensions(source: (u32, u32), constraints: DimensionConstraints) -> (u32, u32) {
    let (src_w, src_h) = source;

    match (constraints.width, constraints.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, scale_side(src_h, w, src_w)),
        (None, Some(h)) => (scale_side(src_w, h, src_h), h),
        (None, None) => cap_dimensions(source, MAX_AUTO_DIMENSION),
    }
}

/// Shrink `source` so its longer side equals `cap`, if either side exceeds it.
///
/// Sources already within the cap are returned unchanged.
pub fn cap_dimensions(source: (u32, u32), cap: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= cap && h <= cap {
        return (w, h);
    }

    if w > h {
        // Landscape: width is the long side
        (cap, scale_side(h, cap, w))
    } else {
        // Portrait or square: height is the long side
        (scale_side(w, cap, h), cap)
    }
}

/// `round(side * numerator / denominator)`, never below 1.
fn scale_side(side: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return side.max(1);
    }
    let scaled = (side as f64 * numerator as f64 / denominator as f64).round();
    (scaled as u32).max(1)
}

/// Dimensions for one attempt of the downscale fallback.
///
/// Attempt `k` scales by `(95 - 5k)%` with integer flooring. Returns `None`
/// once either side would fall below [`MIN_FALLBACK_DIMENSION`] or the
/// attempt budget is spent.
///
/// # Arguments
/// * `base` - Dimensions the search started from (after resolving)
/// * `attempt` - Zero-based attempt index
pub fn fallback_dimensions(base: (u32, u32), attempt: u32) -> Option<(u32, u32)> {
    if attempt >= MAX_FALLBACK_ATTEMPTS {
        return None;
    }
    let percent = fallback_scale_percent(attempt);
    let w = (base.0 as u64 * percent as u64 / 100) as u32;
    let h = (base.1 as u64 * percent as u64 / 100) as u32;

    if w < MIN_FALLBACK_DIMENSION || h < MIN_FALLBACK_DIMENSION {
        return None;
    }
    Some((w, h))
}

/// Scale of fallback attempt `k` in whole percent: 95, 90, 85, ...
pub fn fallback_scale_percent(attempt: u32) -> u32 {
    95u32.saturating_sub(5 * attempt)
}

/// Resample scale factor between source and target.
///
/// Uses the smaller of the two axis ratios, so a distorting override is
/// judged by its strongest downscale.
pub fn resample_scale(source: (u32, u32), target: (u32, u32)) -> f32 {
    if source.0 == 0 || source.1 == 0 {
        return 1.0;
    }
    let sx = target.0 as f32 / source.0 as f32;
    let sy = target.1 as f32 / source.1 as f32;
    sx.min(sy)
}

/// Pick the sharpening strength for a resample scale factor.
///
/// - `scale > 1.2` → [`Sharpening::upscale`]
/// - `scale < 0.5` → [`Sharpening::heavy_downscale`]
/// - otherwise → [`Sharpening::standard`]
pub fn sharpening_for_scale(scale: f32) -> Sharpening {
    if scale > 1.2 {
        Sharpening::upscale()
    } else if scale < 0.5 {
        Sharpening::heavy_downscale()
    } else {
        Sharpening::standard()
    }
}
