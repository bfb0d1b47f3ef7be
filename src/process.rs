//! Batch compression.
//!
//! Takes the files and directories named on the command line, compresses each
//! image independently to the same target, and writes the results.
//!
//! ## Inputs
//!
//! Directories are walked recursively for `.jpg`, `.jpeg`, and `.png` files.
//! Files named explicitly are always attempted, whatever their extension:
//! intake checks the real format from the file header. Earlier outputs
//! (`*_compressed.*`) are skipped when walking.
//!
//! ## Output Naming
//!
//! ```text
//! photos/
//! ├── dawn.jpg
//! ├── dawn_compressed.jpg     # no -o: written next to the source
//! └── ...
//! out/
//! └── dawn_compressed.pdf     # -o out/ with --format pdf
//! ```
//!
//! With a single input, `-o` may also name the output file itself.
//!
//! ## Outcomes
//!
//! Every input gets exactly one [`Outcome`]. A rejected, unfittable, or
//! failed input never stops the rest of the batch.
//!
//! ## Parallel Processing
//!
//! Inputs are processed in parallel using [rayon](https://docs.rs/rayon).
//! Each run owns its source image and canvas; nothing is shared between runs
//! except the (stateless) encoder backend.

use crate::imaging::{
    Artifact, CompressError, ImageBackend, OperationError, Quality, SearchEvent, SearchPhase,
    TargetFormat, TargetSpec, compress_for_target, size_kb,
};
use crate::intake::{self, Adjustments, IntakeError};
use crate::pdf::Orientation;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use thiserror::Error;
use walkdir::WalkDir;

/// Reported when no candidate fits the budget.
pub const NO_FIT_MESSAGE: &str = "image too complex to compress to this target";

/// Appended to output file stems.
pub const OUTPUT_SUFFIX: &str = "_compressed";

const INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("no JPEG or PNG images found in the given inputs")]
    NoInputs,
    #[error("{path} is a file, but {count} inputs were given; use a directory")]
    OutputNotDirectory { path: PathBuf, count: usize },
}

/// Where compressed files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLocation {
    /// Next to each source file.
    BesideSource,
    /// All outputs in one directory.
    Directory(PathBuf),
    /// Exactly this path. Single input only.
    File(PathBuf),
}

impl OutputLocation {
    /// Interpret the `-o` argument for a batch of `input_count` files.
    ///
    /// An existing directory, or a path without an extension, is a directory.
    /// Anything else names the output file, which requires a single input.
    pub fn resolve(output: Option<&Path>, input_count: usize) -> Result<Self, ProcessError> {
        let Some(path) = output else {
            return Ok(OutputLocation::BesideSource);
        };
        if path.is_dir() || path.extension().is_none() {
            return Ok(OutputLocation::Directory(path.to_path_buf()));
        }
        if input_count > 1 {
            return Err(ProcessError::OutputNotDirectory {
                path: path.to_path_buf(),
                count: input_count,
            });
        }
        Ok(OutputLocation::File(path.to_path_buf()))
    }

    /// Output path for `source` with the given extension.
    pub fn path_for(&self, source: &Path, extension: &str) -> PathBuf {
        let file_name = output_file_name(source, extension);
        match self {
            OutputLocation::BesideSource => source.with_file_name(file_name),
            OutputLocation::Directory(dir) => dir.join(file_name),
            OutputLocation::File(path) => path.clone(),
        }
    }
}

/// `<stem>_compressed.<ext>`
pub fn output_file_name(source: &Path, extension: &str) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{stem}{OUTPUT_SUFFIX}.{extension}")
}

/// Everything a batch needs besides the inputs.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub spec: TargetSpec,
    pub adjustments: Adjustments,
    pub output: OutputLocation,
}

/// Progress events sent while a batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Started {
        /// 1-based position in the batch.
        index: usize,
        total: usize,
        source: PathBuf,
    },
    Finished {
        index: usize,
        total: usize,
        report: InputReport,
    },
}

/// Result of one input.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Written {
        output: PathBuf,
        format: TargetFormat,
        source_kb: f64,
        size_kb: f64,
        width: u32,
        height: u32,
        quality: Quality,
        phase: SearchPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        orientation: Option<Orientation>,
    },
    NoFit {
        message: String,
    },
    /// Not a usable image: wrong format, undecodable, bad crop.
    Rejected {
        reason: String,
    },
    /// Encoder or filesystem failure.
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct InputReport {
    pub source: PathBuf,
    pub outcome: Outcome,
    /// Every step the search took, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<SearchEvent>,
}

impl InputReport {
    pub fn is_written(&self) -> bool {
        matches!(self.outcome, Outcome::Written { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub target: TargetSpec,
    pub results: Vec<InputReport>,
}

impl ProcessReport {
    pub fn written_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_written()).count()
    }

    pub fn all_written(&self) -> bool {
        self.written_count() == self.results.len()
    }
}

/// Expand directories and keep explicit files, in a stable order.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ProcessError> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(path).follow_links(true) {
            let entry = entry?;
            if entry.file_type().is_file() && is_candidate_image(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        inputs.extend(found);
    }
    Ok(inputs)
}

fn is_candidate_image(path: &Path) -> bool {
    let has_image_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| INPUT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    let is_previous_output = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(OUTPUT_SUFFIX));
    has_image_ext && !is_previous_output
}

/// Compress every input to `options.spec` and write the results.
pub fn process(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    options: &ProcessOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    if inputs.is_empty() {
        return Err(ProcessError::NoInputs);
    }
    if let OutputLocation::Directory(dir) = &options.output {
        std::fs::create_dir_all(dir)?;
    }

    let total = inputs.len();
    log::info!("compressing {} image(s) to {} KB", total, options.spec.max_size_kb);
    let collisions = find_output_collisions(inputs, options);

    let results: Vec<InputReport> = inputs
        .par_iter()
        .enumerate()
        .map(|(i, source)| {
            let index = i + 1;
            if let Some(tx) = &events {
                let _ = tx.send(ProcessEvent::Started {
                    index,
                    total,
                    source: source.clone(),
                });
            }
            let report = match &collisions[i] {
                Some(outcome) => InputReport {
                    source: source.clone(),
                    outcome: outcome.clone(),
                    steps: Vec::new(),
                },
                None => process_one(backend, source, options),
            };
            if let Some(tx) = &events {
                let _ = tx.send(ProcessEvent::Finished {
                    index,
                    total,
                    report: report.clone(),
                });
            }
            report
        })
        .collect();

    Ok(ProcessReport {
        target: options.spec.clone(),
        results,
    })
}

/// Inputs whose output path an earlier input already claimed.
///
/// The first input in batch order keeps the path; every later one gets a
/// `Failed` outcome and is never compressed, so no output is overwritten.
fn find_output_collisions(inputs: &[PathBuf], options: &ProcessOptions) -> Vec<Option<Outcome>> {
    let extension = options.spec.format.file_extension();
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    inputs
        .iter()
        .map(|source| {
            let output = options.output.path_for(source, extension);
            if let Some(first) = claimed.get(&output) {
                log::warn!(
                    "{} and {} both map to {}",
                    first.display(),
                    source.display(),
                    output.display()
                );
                return Some(Outcome::Failed {
                    error: format!(
                        "output {} is already used by {}",
                        output.display(),
                        first.display()
                    ),
                });
            }
            claimed.insert(output, source);
            None
        })
        .collect()
}

fn process_one(backend: &impl ImageBackend, source: &Path, options: &ProcessOptions) -> InputReport {
    let (outcome, steps) = compress_file(backend, source, options);
    match &outcome {
        Outcome::Written { output, .. } => {
            log::debug!("{} -> {}", source.display(), output.display())
        }
        other => log::debug!("{}: {:?}", source.display(), other),
    }
    InputReport {
        source: source.to_path_buf(),
        outcome,
        steps,
    }
}

fn compress_file(
    backend: &impl ImageBackend,
    path: &Path,
    options: &ProcessOptions,
) -> (Outcome, Vec<SearchEvent>) {
    let source = match intake::read_source(path) {
        Ok(source) => source,
        Err(IntakeError::Io(e)) => {
            return (
                Outcome::Failed {
                    error: e.to_string(),
                },
                Vec::new(),
            );
        }
        Err(e) => {
            return (
                Outcome::Rejected {
                    reason: e.to_string(),
                },
                Vec::new(),
            );
        }
    };
    let source_kb = size_kb(source.byte_len());
    let source = match options.adjustments.apply(source) {
        Ok(source) => source,
        Err(e) => {
            return (
                Outcome::Rejected {
                    reason: e.to_string(),
                },
                Vec::new(),
            );
        }
    };

    let (tx, rx) = mpsc::channel();
    let result = compress_for_target(backend, &source, &options.spec, Some(&tx));
    drop(tx);
    let steps: Vec<SearchEvent> = rx.try_iter().collect();

    let outcome = match result {
        Ok(Some(artifact)) => match write_artifact(&artifact, path, &options.output) {
            Ok(output) => Outcome::Written {
                output,
                format: artifact.format,
                source_kb,
                size_kb: artifact.size_kb(),
                width: artifact.width,
                height: artifact.height,
                quality: artifact.quality,
                phase: artifact.phase,
                orientation: artifact.orientation,
            },
            Err(e) => Outcome::Failed {
                error: e.to_string(),
            },
        },
        Ok(None) => Outcome::NoFit {
            message: NO_FIT_MESSAGE.to_string(),
        },
        Err(e @ OperationError::Compress(CompressError::CanvasTooLarge { .. })) => {
            Outcome::Rejected {
                reason: e.to_string(),
            }
        }
        Err(e) => Outcome::Failed {
            error: e.to_string(),
        },
    };
    (outcome, steps)
}

fn write_artifact(
    artifact: &Artifact,
    source: &Path,
    location: &OutputLocation,
) -> Result<PathBuf, std::io::Error> {
    let output = location.path_for(source, artifact.file_extension());
    if let OutputLocation::File(path) = location {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !ext.eq_ignore_ascii_case(artifact.file_extension()) {
            log::warn!(
                "writing {} data to {}",
                artifact.format,
                path.display()
            );
        }
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, &artifact.bytes)?;
    Ok(output)
}
