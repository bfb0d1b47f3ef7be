//! # Photo Fit
//!
//! Resize and re-encode photos until they fit a file-size budget. Upload forms
//! for ID photos, signatures, and scanned documents often demand "JPEG under
//! 50 KB, 413×531": this crate produces exactly that, keeping as much quality
//! as the budget allows.
//!
//! # Architecture: Decode → Search → Package
//!
//! ```text
//! 1. Intake    file      →  SourceImage      (sniff header, decode, rotate, crop)
//! 2. Search    source    →  JPEG/PNG bytes   (resample, sharpen, quality search)
//! 3. Package   bytes     →  artifact         (as-is, or wrapped in a one-page PDF)
//! ```
//!
//! Each stage is a plain function over owned data, so the search can be unit
//! tested against a mock encoder without decoding or encoding real images.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`intake`] | Format detection by magic bytes, decoding, rotation and crop |
//! | [`imaging`] | Dimension math, resampling, sharpening, encoding, and the size search |
//! | [`pdf`] | Single-page PDF wrapping of a JPEG with `lopdf` |
//! | [`process`] | Batch driver: input discovery, parallel compression, output naming |
//! | [`config`] | `photo-fit.toml` loading, presets, validation, and stock defaults |
//! | [`output`] | CLI output formatting for progress, summaries, and `check` |
//!
//! # Design Decisions
//!
//! ## Binary Search, Then Shrink
//!
//! Quality is searched by bisection over `[0.1, 1.0]` for a fixed seven
//! encodes. When auto-resize is on and the best quality found is poor, the
//! image is shrunk in 5% steps at a fixed good quality instead: a smaller
//! sharp image beats a blocky full-size one. See [`imaging::search`].
//!
//! ## Sizes in KB of 1024 Bytes
//!
//! Budgets are compared against the exact encoded length:
//! `bytes / 1024 <= max_size_kb`. No rounding, no margins.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding, Lanczos3
//! resampling, and JPEG/PNG encoding, and `lopdf` for PDF output. No system
//! libraries, so the binary runs anywhere it is copied to.
//!
//! ## One Source, Many Targets
//!
//! The decoded source is never modified. Every search attempt draws a fresh
//! canvas from it, so repeated resampling never compounds blur.

pub mod config;
pub mod imaging;
pub mod intake;
pub mod output;
pub mod pdf;
pub mod process;

#[cfg(test)]
pub(crate) mod test_helpers;
