//! Encoder backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the one capability the search needs from the
//! outside world: turn a canvas into encoded bytes at a given quality. Keeping
//! it behind a trait lets the search run against a deterministic fake in
//! tests, where output size is a known function of quality and area.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), using the `image` crate's
//! pure-Rust JPEG and PNG encoders.

use super::canvas::WorkingCanvas;
use super::params::{EncodeFormat, Quality};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),
}

/// Trait for image encoders.
///
/// Implementations must be deterministic: the same canvas, format, and
/// quality always produce the same bytes. Size is expected (not required)
/// to grow with quality.
pub trait ImageBackend: Sync {
    /// Encode the canvas. Formats without a quality axis ignore `quality`.
    fn encode(
        &self,
        canvas: &WorkingCanvas,
        format: EncodeFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
