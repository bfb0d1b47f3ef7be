//! Size-constrained re-encoding.
//!
//! Finds the best-looking encoding of an image that still fits a size budget.
//! A run has three phases:
//!
//! ```text
//! A. Resample   resolve dimensions → draw with Lanczos3 → sharpen (scale-derived mix)
//! B. Search     7 halvings of the quality range [0.1, 1.0], one encode each
//! C. Fallback   auto-resize only: probe at 0.7, then shrink 5% per step
//!               (max 20 steps, 200px floor) encoding at 0.75 until it fits
//! ```
//!
//! ## Phase B
//!
//! Each iteration encodes at the midpoint of the current range. A fit raises
//! the lower bound and becomes the best candidate; a miss lowers the upper
//! bound. Seven iterations resolve quality to about 0.007, which is finer
//! than the 1–100 steps JPEG encoders accept, and bound the number of real
//! encodes per run.
//!
//! With auto-resize on, midpoints below 0.6 are skipped without encoding and
//! treated as fitting, pushing the search upward. The iteration count stays
//! at exactly seven either way.
//!
//! ## Phase C
//!
//! Runs only with auto-resize, when Phase B found nothing or only something
//! below 0.7. A probe at 0.7 on the current canvas comes first. If it fits,
//! the probe itself becomes the result and replaces the Phase B candidate,
//! instead of the phase ending with the Phase B result unchanged: it is the
//! same canvas at a higher quality, and it also covers the case where Phase B
//! found nothing. Otherwise the canvas is shrunk from the Phase A size (95%, 90%, ...),
//! redrawn from the source, sharpened at 0.25, and encoded once at 0.75. The
//! first fit stops the loop. If nothing fits, the Phase B result stands.
//!
//! ## Outcomes
//!
//! "Nothing fits" is `Ok(None)`, never an error: the caller turns it into a
//! message. Encoder failures end the run with [`CompressError`]; there is no
//! retry. Target dimensions above [`MAX_CANVAS_PIXELS`] are refused before
//! any canvas is allocated. Encode calls are strictly sequential since each decision depends on
//! the previous measurement.
//!
//! Size is assumed to grow with quality for a fixed canvas. Nothing checks
//! that; an encoder that breaks the assumption just gets a less optimal
//! quality, never an over-budget result.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    MAX_CANVAS_PIXELS, MAX_FALLBACK_ATTEMPTS, canvas_fits_memory, fallback_dimensions,
    fallback_scale_percent, resample_scale, resolve_dimensions, sharpening_for_scale,
};
use super::canvas::WorkingCanvas;
use super::params::{EncodeFormat, Quality, Sharpening, TargetSpec, size_kb};
use super::source::SourceImage;
use serde::Serialize;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Number of Phase B iterations, skipped or not.
pub const SEARCH_ITERATIONS: u32 = 7;

/// With auto-resize on, Phase B never encodes below this quality.
pub const AUTO_RESIZE_QUALITY_FLOOR: f32 = 0.6;

/// Quality of the probe that decides whether to shrink.
pub const HIGH_QUALITY_PROBE: f32 = 0.7;

/// Quality used for every shrink attempt.
pub const FALLBACK_QUALITY: f32 = 0.75;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Encoder failed: {0}")]
    Backend(#[from] BackendError),
    #[error("target size {width}x{height} exceeds the {max_pixels} pixel limit")]
    CanvasTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
}

/// Which phase produced the final candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchPhase {
    QualitySearch,
    HighQualityProbe,
    Downscale,
}

/// One encode that fit the budget.
#[derive(Debug, Clone)]
pub struct EncodedCandidate {
    pub bytes: Vec<u8>,
    pub quality: Quality,
    pub width: u32,
    pub height: u32,
    pub phase: SearchPhase,
}

impl EncodedCandidate {
    pub fn size_kb(&self) -> f64 {
        size_kb(self.bytes.len())
    }
}

/// Final output of a run. The caller owns the bytes.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: EncodeFormat,
    pub quality: Quality,
    pub phase: SearchPhase,
}

impl CompressionResult {
    pub fn size_kb(&self) -> f64 {
        size_kb(self.bytes.len())
    }
}

/// Outcome of a single Phase B iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StepOutcome {
    Fits { size_kb: f64 },
    TooLarge { size_kb: f64 },
    /// Below the auto-resize floor; not encoded.
    Skipped,
}

/// Progress reported while a run executes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SearchEvent {
    Resampled {
        source: (u32, u32),
        width: u32,
        height: u32,
        sharpen_mix: f32,
    },
    QualityStep {
        iteration: u32,
        quality: Quality,
        outcome: StepOutcome,
    },
    HighQualityProbe {
        quality: Quality,
        size_kb: f64,
        fits: bool,
    },
    Downscaled {
        attempt: u32,
        scale_percent: u32,
        width: u32,
        height: u32,
        size_kb: f64,
        fits: bool,
    },
    FloorReached {
        attempt: u32,
    },
}

/// Forwards events to an optional channel and the debug log.
struct Reporter<'a> {
    events: Option<&'a Sender<SearchEvent>>,
}

impl Reporter<'_> {
    fn emit(&self, event: SearchEvent) {
        log::debug!("{:?}", event);
        if let Some(tx) = self.events {
            // A dropped receiver just means nobody is listening anymore.
            let _ = tx.send(event);
        }
    }
}

/// Encode `source` so that it fits `spec.max_size_kb`, at the best quality found.
///
/// Returns `Ok(None)` when no candidate fits. See the [module docs](self).
pub fn compress_to_target(
    backend: &impl ImageBackend,
    source: &SourceImage,
    spec: &TargetSpec,
    events: Option<&Sender<SearchEvent>>,
) -> Result<Option<CompressionResult>, CompressError> {
    let reporter = Reporter { events };
    let format = spec.format.encode_format();
    if !format.has_quality_axis() {
        log::debug!(
            "{} has no quality axis; only resizing can change its size",
            format.mime()
        );
    }

    // Phase A
    let base = resolve_dimensions(source.dimensions(), spec.constraints);
    if !canvas_fits_memory(base) {
        return Err(CompressError::CanvasTooLarge {
            width: base.0,
            height: base.1,
            max_pixels: MAX_CANVAS_PIXELS,
        });
    }
    let sharpening = sharpening_for_scale(resample_scale(source.dimensions(), base));
    let mut canvas = WorkingCanvas::from_source(source, base.0, base.1);
    canvas.sharpen(sharpening);
    reporter.emit(SearchEvent::Resampled {
        source: source.dimensions(),
        width: base.0,
        height: base.1,
        sharpen_mix: sharpening.mix,
    });

    // Phase B
    let mut best = quality_search(backend, &canvas, format, spec, &reporter)?;

    // Phase C
    let low_quality = best
        .as_ref()
        .is_none_or(|c| c.quality.value() < HIGH_QUALITY_PROBE);
    if spec.auto_resize && low_quality {
        if let Some(candidate) =
            downscale_fallback(backend, source, &mut canvas, base, format, spec, &reporter)?
        {
            best = Some(candidate);
        }
    }

    Ok(best.map(|c| CompressionResult {
        bytes: c.bytes,
        width: c.width,
        height: c.height,
        format,
        quality: c.quality,
        phase: c.phase,
    }))
}

fn quality_search(
    backend: &impl ImageBackend,
    canvas: &WorkingCanvas,
    format: EncodeFormat,
    spec: &TargetSpec,
    reporter: &Reporter<'_>,
) -> Result<Option<EncodedCandidate>, CompressError> {
    let mut min_quality = Quality::MIN;
    let mut max_quality = Quality::MAX;
    let mut best = None;

    for iteration in 1..=SEARCH_ITERATIONS {
        let mid = Quality::new((min_quality + max_quality) / 2.0);

        if spec.auto_resize && mid.value() < AUTO_RESIZE_QUALITY_FLOOR {
            min_quality = mid.value();
            reporter.emit(SearchEvent::QualityStep {
                iteration,
                quality: mid,
                outcome: StepOutcome::Skipped,
            });
            continue;
        }

        let bytes = backend.encode(canvas, format, mid)?;
        let size = size_kb(bytes.len());

        let outcome = if spec.fits(bytes.len()) {
            min_quality = mid.value();
            best = Some(EncodedCandidate {
                bytes,
                quality: mid,
                width: canvas.width(),
                height: canvas.height(),
                phase: SearchPhase::QualitySearch,
            });
            StepOutcome::Fits { size_kb: size }
        } else {
            max_quality = mid.value();
            StepOutcome::TooLarge { size_kb: size }
        };

        reporter.emit(SearchEvent::QualityStep {
            iteration,
            quality: mid,
            outcome,
        });
    }

    Ok(best)
}

fn downscale_fallback(
    backend: &impl ImageBackend,
    source: &SourceImage,
    canvas: &mut WorkingCanvas,
    base: (u32, u32),
    format: EncodeFormat,
    spec: &TargetSpec,
    reporter: &Reporter<'_>,
) -> Result<Option<EncodedCandidate>, CompressError> {
    let probe_quality = Quality::new(HIGH_QUALITY_PROBE);
    let probe = backend.encode(canvas, format, probe_quality)?;
    let fits = spec.fits(probe.len());
    reporter.emit(SearchEvent::HighQualityProbe {
        quality: probe_quality,
        size_kb: size_kb(probe.len()),
        fits,
    });
    if fits {
        return Ok(Some(EncodedCandidate {
            bytes: probe,
            quality: probe_quality,
            width: canvas.width(),
            height: canvas.height(),
            phase: SearchPhase::HighQualityProbe,
        }));
    }

    let quality = Quality::new(FALLBACK_QUALITY);
    for attempt in 0..MAX_FALLBACK_ATTEMPTS {
        let Some((width, height)) = fallback_dimensions(base, attempt) else {
            reporter.emit(SearchEvent::FloorReached { attempt });
            break;
        };

        canvas.redraw(source, width, height);
        canvas.sharpen(Sharpening::fallback());

        let bytes = backend.encode(canvas, format, quality)?;
        let fits = spec.fits(bytes.len());
        reporter.emit(SearchEvent::Downscaled {
            attempt,
            scale_percent: fallback_scale_percent(attempt),
            width,
            height,
            size_kb: size_kb(bytes.len()),
            fits,
        });

        if fits {
            return Ok(Some(EncodedCandidate {
                bytes,
                quality,
                width,
                height,
                phase: SearchPhase::Downscale,
            }));
        }
    }

    Ok(None)
}
