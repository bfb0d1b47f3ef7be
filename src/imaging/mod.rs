//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Resample** | `image::imageops::resize` with Lanczos3 |
//! | **Sharpen** | 3×3 unsharp mask over the RGBA buffer ([`sharpen`]) |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` |
//! | **Encode → PNG** | `image::codecs::png::PngEncoder` |
//! | **Wrap → PDF** | `lopdf` (see [`crate::pdf`]) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a compression request
//! - **Canvas / Sharpen**: The per-run scratch raster and its filter
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Search**: The size-constrained quality search with downscale fallback
//! - **Operations**: Search + packaging into the final [`Artifact`]

pub mod backend;
mod calculations;
mod canvas;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod search;
pub mod sharpen;
mod source;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    MAX_AUTO_DIMENSION, MAX_CANVAS_PIXELS, MAX_FALLBACK_ATTEMPTS, MIN_FALLBACK_DIMENSION,
    canvas_fits_memory, fallback_dimensions, resolve_dimensions,
};
pub use canvas::WorkingCanvas;
pub use operations::{Artifact, OperationError, compress_for_target};
pub use params::{
    DEFAULT_MAX_SIZE_KB, DimensionConstraints, EncodeFormat, Quality, Sharpening, TargetFormat,
    TargetSpec, size_kb,
};
pub use rust_backend::RustBackend;
pub use search::{
    CompressError, CompressionResult, SearchEvent, SearchPhase, StepOutcome, compress_to_target,
};
pub use source::{SourceFormat, SourceImage};
