//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every input is shown by its position in the batch and its file name, with
//! paths and numbers as indented context lines. The compressed result leads
//! with where it went, then what it is.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! 001 dawn.jpg
//!     Source: photos/dawn.jpg
//!     → photos/dawn_compressed.jpg
//!     1200x800 JPEG, 48.7 KB (was 2417.3 KB), quality 0.786
//! 002 noise.png
//!     Source: photos/noise.png
//!     image too complex to compress to this target
//!
//! Compressed 1 of 2 images to 50 KB JPEG
//! Hint: --auto-resize lets photo-fit shrink images that don't fit
//! ```
//!
//! With `--verbose`, each result also lists the search steps:
//!
//! ```text
//!         resample 3000x2000 → 1200x800, sharpen 0.20
//!         step 1: q 0.550 → 61.2 KB, too large
//!         ...
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 dawn.jpg: JPEG 3000x2000, 2417.3 KB
//! 002 anim.gif: invalid file format: only JPEG and PNG images are supported
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{SearchEvent, SearchPhase, StepOutcome};
use crate::intake::{IntakeError, SourceInfo};
use crate::process::{InputReport, Outcome, ProcessEvent, ProcessReport};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// File name of a path, falling back to the whole path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn fit_label(fits: bool) -> &'static str {
    if fits { "fits" } else { "too large" }
}

// ============================================================================
// Compress output
// ============================================================================

/// Format one search step as a single line (no indentation).
pub fn format_search_event(event: &SearchEvent) -> String {
    match event {
        SearchEvent::Resampled {
            source,
            width,
            height,
            sharpen_mix,
        } => format!(
            "resample {}x{} \u{2192} {}x{}, sharpen {:.2}",
            source.0, source.1, width, height, sharpen_mix
        ),
        SearchEvent::QualityStep {
            iteration,
            quality,
            outcome,
        } => match outcome {
            StepOutcome::Fits { size_kb } => {
                format!("step {iteration}: q {quality} \u{2192} {size_kb:.1} KB, fits")
            }
            StepOutcome::TooLarge { size_kb } => {
                format!("step {iteration}: q {quality} \u{2192} {size_kb:.1} KB, too large")
            }
            StepOutcome::Skipped => format!("step {iteration}: q {quality} skipped"),
        },
        SearchEvent::HighQualityProbe {
            quality,
            size_kb,
            fits,
        } => format!(
            "probe: q {quality} \u{2192} {size_kb:.1} KB, {}",
            fit_label(*fits)
        ),
        SearchEvent::Downscaled {
            scale_percent,
            width,
            height,
            size_kb,
            fits,
            ..
        } => format!(
            "shrink {scale_percent}%: {width}x{height} \u{2192} {size_kb:.1} KB, {}",
            fit_label(*fits)
        ),
        SearchEvent::FloorReached { attempt } => {
            format!("shrink stopped at the size floor after {attempt} attempt(s)")
        }
    }
}

/// Format the result of one input.
pub fn format_input_report(index: usize, report: &InputReport, verbose: bool) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", format_index(index), display_name(&report.source)),
        format!("{}Source: {}", indent(1), report.source.display()),
    ];

    match &report.outcome {
        Outcome::Written {
            output,
            format,
            source_kb,
            size_kb,
            width,
            height,
            quality,
            phase,
            orientation,
        } => {
            lines.push(format!("{}\u{2192} {}", indent(1), output.display()));
            let mut detail = format!(
                "{}{}x{} {}, {:.1} KB (was {:.1} KB), quality {}",
                indent(1),
                width,
                height,
                format,
                size_kb,
                source_kb,
                quality
            );
            if *phase == SearchPhase::Downscale {
                detail.push_str(", downscaled to fit");
            }
            if let Some(orientation) = orientation {
                let name = match orientation {
                    crate::pdf::Orientation::Portrait => "portrait",
                    crate::pdf::Orientation::Landscape => "landscape",
                };
                detail.push_str(&format!(", {name} page"));
            }
            lines.push(detail);
        }
        Outcome::NoFit { message } => lines.push(format!("{}{}", indent(1), message)),
        Outcome::Rejected { reason } => lines.push(format!("{}Rejected: {}", indent(1), reason)),
        Outcome::Failed { error } => lines.push(format!("{}Failed: {}", indent(1), error)),
    }

    if verbose {
        for step in &report.steps {
            lines.push(format!("{}{}", indent(2), format_search_event(step)));
        }
    }
    lines
}

/// Format a single progress event as display lines.
///
/// `Started` only shows in verbose mode; results are shown as they finish,
/// which under parallel processing is not input order.
pub fn format_process_event(event: &ProcessEvent, verbose: bool) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            index,
            total,
            source,
        } => {
            if verbose {
                vec![format!(
                    "{} {} (compressing, {} of {})",
                    format_index(*index),
                    display_name(source),
                    index,
                    total
                )]
            } else {
                Vec::new()
            }
        }
        ProcessEvent::Finished { index, report, .. } => {
            format_input_report(*index, report, verbose)
        }
    }
}

/// Format the closing summary of a batch.
pub fn format_summary(report: &ProcessReport) -> Vec<String> {
    let total = report.results.len();
    let mut lines = vec![
        String::new(),
        format!(
            "Compressed {} of {} {} to {} KB {}",
            report.written_count(),
            total,
            if total == 1 { "image" } else { "images" },
            report.target.max_size_kb,
            report.target.format
        ),
    ];
    let any_no_fit = report
        .results
        .iter()
        .any(|r| matches!(r.outcome, Outcome::NoFit { .. }));
    if any_no_fit && !report.target.auto_resize {
        lines.push("Hint: --auto-resize lets photo-fit shrink images that don't fit".to_string());
    }
    lines
}

/// Print a progress event to stdout.
pub fn print_process_event(event: &ProcessEvent, verbose: bool) {
    for line in format_process_event(event, verbose) {
        println!("{}", line);
    }
}

/// Print the batch summary to stdout.
pub fn print_summary(report: &ProcessReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format one `check` result.
pub fn format_check_entry(
    index: usize,
    path: &Path,
    result: &Result<SourceInfo, IntakeError>,
) -> String {
    let head = format!("{} {}", format_index(index), display_name(path));
    match result {
        Ok(info) => format!(
            "{}: {} {}x{}, {:.1} KB",
            head,
            info.format,
            info.width,
            info.height,
            crate::imaging::size_kb(info.byte_len)
        ),
        Err(e) => format!("{}: {}", head, e),
    }
}

/// Print `check` results to stdout.
pub fn print_check(entries: &[(std::path::PathBuf, Result<SourceInfo, IntakeError>)]) {
    for (i, (path, result)) in entries.iter().enumerate() {
        println!("{}", format_check_entry(i + 1, path, result));
    }
}
