//! Configuration module.
//!
//! Handles loading, validating, and merging `photo-fit.toml`. Configuration is
//! layered, each layer overriding the one before it:
//!
//! ```text
//! stock defaults
//!   < photo-fit.toml in the working directory (or --config FILE)
//!     < --preset NAME (a [presets.NAME] table)
//!       < command-line flags (--max-kb, --format, --width, ...)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [target]
//! max_size_kb = 50          # Size budget in KB (1 KB = 1024 bytes)
//! format = "image/jpeg"     # image/jpeg | image/png | application/pdf
//! # width = 600             # Custom width in pixels
//! # height = 400            # Custom height in pixels
//! auto_resize = false       # Shrink the image rather than drop quality below 0.6
//!
//! [presets.passport]        # Named presets, selected with --preset
//! width = 413
//! height = 531
//! max_size_kb = 50
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Malformed Numbers
//!
//! Sizes and dimensions are normalised, not rejected: a zero, negative, or
//! non-finite `max_size_kb` falls back to 50, and a width or height below 1
//! counts as "not given". Fractional dimensions are truncated.
//!
//! Unknown keys and unknown formats are rejected to catch typos early.

use crate::imaging::{DEFAULT_MAX_SIZE_KB, DimensionConstraints, TargetFormat, TargetSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when `--config` isn't given.
pub const CONFIG_FILE_NAME: &str = "photo-fit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
}

/// Configuration loaded from `photo-fit.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    /// Default compression target.
    pub target: TargetConfig,
    /// Named target overrides, selected with `--preset`.
    pub presets: BTreeMap<String, TargetOverrides>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl FitConfig {
    /// Validate config values are within acceptable ranges.
    ///
    /// Target numbers are never rejected here; see the module docs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if let Some(name) = self.presets.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "preset name '{name}' must not be blank"
            )));
        }
        Ok(())
    }

    /// Apply the optional preset, then command-line overrides, and build the
    /// request.
    pub fn resolve_target(
        &self,
        preset: Option<&str>,
        overrides: &TargetOverrides,
    ) -> Result<TargetSpec, ConfigError> {
        let mut target = self.target.clone();
        if let Some(name) = preset {
            let preset = self
                .presets
                .get(name)
                .ok_or_else(|| ConfigError::UnknownPreset {
                    name: name.to_string(),
                    available: self.preset_names(),
                })?;
            target.apply(preset);
        }
        target.apply(overrides);
        Ok(target.to_spec())
    }

    fn preset_names(&self) -> String {
        if self.presets.is_empty() {
            "none defined".to_string()
        } else {
            self.presets.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

/// The compression target as written in config.
///
/// Numbers stay raw here and are normalised by [`TargetConfig::to_spec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Size budget in kilobytes.
    pub max_size_kb: f64,
    /// Output format as a MIME type.
    pub format: TargetFormat,
    /// Custom output width in pixels.
    pub width: Option<f64>,
    /// Custom output height in pixels.
    pub height: Option<f64>,
    /// Prefer shrinking dimensions over dropping quality below 0.6.
    pub auto_resize: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            max_size_kb: DEFAULT_MAX_SIZE_KB,
            format: TargetFormat::default(),
            width: None,
            height: None,
            auto_resize: false,
        }
    }
}

impl TargetConfig {
    /// Overwrite every field the overrides set.
    pub fn apply(&mut self, overrides: &TargetOverrides) {
        if let Some(kb) = overrides.max_size_kb {
            self.max_size_kb = kb;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if overrides.width.is_some() {
            self.width = overrides.width;
        }
        if overrides.height.is_some() {
            self.height = overrides.height;
        }
        if let Some(auto_resize) = overrides.auto_resize {
            self.auto_resize = auto_resize;
        }
    }

    pub fn to_spec(&self) -> TargetSpec {
        TargetSpec::new(
            Some(self.max_size_kb),
            self.format,
            DimensionConstraints::from_raw(self.width, self.height),
            self.auto_resize,
        )
    }
}

/// A sparse set of target values: one preset, or the command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetOverrides {
    pub max_size_kb: Option<f64>,
    pub format: Option<TargetFormat>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub auto_resize: Option<bool>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel compression workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(FitConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `photo-fit.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    load_raw_config_file(&config_path).map(Some)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_raw_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<FitConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FitConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a run.
///
/// `explicit` is the `--config` path; without it, `photo-fit.toml` in `dir`
/// is used if present. User values are merged on top of stock defaults,
/// unknown keys rejected, and the result validated.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<FitConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = match explicit {
        Some(path) => Some(load_raw_config_file(path)?),
        None => load_raw_config(dir)?,
    };
    if let Some(path) = explicit {
        log::debug!("using config file {}", path.display());
    } else if overlay.is_some() {
        log::debug!("using {} in {}", CONFIG_FILE_NAME, dir.display());
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `photo-fit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-fit Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# photo-fit reads photo-fit.toml from the working directory, or the file
# given with --config. Command-line flags override everything in here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Compression target
# ---------------------------------------------------------------------------
[target]
# Size budget in kilobytes (1 KB = 1024 bytes).
# Zero, negative or missing values fall back to 50.
max_size_kb = 50.0

# Output format: "image/jpeg", "image/png" or "application/pdf".
# PDF output is a JPEG wrapped in a single page sized to the image.
format = "image/jpeg"

# Custom output dimensions in pixels. Give one to keep the aspect ratio,
# both to force an exact size. Without either, the longer side is capped
# at 1200 pixels.
# width = 600
# height = 400

# Shrink the image instead of dropping JPEG quality below 0.6.
auto_resize = false

# ---------------------------------------------------------------------------
# Presets
# ---------------------------------------------------------------------------
# Named sets of target values, selected with --preset NAME. A preset may set
# any key of [target]; the rest come from [target].
#
# [presets.passport]
# width = 413
# height = 531
# max_size_kb = 50
#
# [presets.signature]
# width = 140
# height = 60
# max_size_kb = 20

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel compression workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
