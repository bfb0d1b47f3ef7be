//! High-level image operations.
//!
//! Combines the size search with packaging: the search always produces a
//! JPEG or PNG, and PDF targets get that JPEG wrapped in a single page.
//!
//! The size budget applies to the encoded image. A PDF adds a few hundred
//! bytes of document structure on top of it.

use super::backend::ImageBackend;
use super::params::{Quality, TargetFormat, TargetSpec, size_kb};
use super::search::{CompressError, SearchEvent, SearchPhase, compress_to_target};
use super::source::SourceImage;
use crate::pdf::{Orientation, PdfError, wrap_as_single_page_document};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error(transparent)]
    Compress(#[from] CompressError),
    #[error("PDF packaging failed: {0}")]
    Pdf(#[from] PdfError),
}

/// Final packaged output of one compression request.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub format: TargetFormat,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub phase: SearchPhase,
    /// Page orientation, for PDF artifacts only.
    pub orientation: Option<Orientation>,
}

impl Artifact {
    pub fn file_extension(&self) -> &'static str {
        self.format.file_extension()
    }

    pub fn size_kb(&self) -> f64 {
        size_kb(self.bytes.len())
    }
}

/// Compress `source` to fit `spec` and package it in the requested format.
///
/// `Ok(None)` means no candidate fit the budget.
pub fn compress_for_target(
    backend: &impl ImageBackend,
    source: &SourceImage,
    spec: &TargetSpec,
    events: Option<&Sender<SearchEvent>>,
) -> Result<Option<Artifact>, OperationError> {
    let Some(result) = compress_to_target(backend, source, spec, events)? else {
        return Ok(None);
    };

    let (bytes, orientation) = match spec.format {
        TargetFormat::Pdf => {
            let orientation = Orientation::for_dimensions(result.width, result.height);
            let pdf = wrap_as_single_page_document(
                &result.bytes,
                result.width,
                result.height,
                orientation,
            )?;
            if !spec.fits(pdf.len()) {
                log::debug!(
                    "PDF is {:.1} KB, image alone was {:.1} KB",
                    size_kb(pdf.len()),
                    result.size_kb()
                );
            }
            (pdf, Some(orientation))
        }
        TargetFormat::Jpeg | TargetFormat::Png => (result.bytes, None),
    };

    Ok(Some(Artifact {
        bytes,
        format: spec.format,
        width: result.width,
        height: result.height,
        quality: result.quality,
        phase: result.phase,
        orientation,
    }))
}
