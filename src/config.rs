//! Server configuration module.
//!
//! Handles loading, validating, and merging `picserve.toml`. Stock defaults
//! are the base layer; a user file overrides any subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [pipeline]
//! transform = "resize"      # Registered transform to run ("" for none)
//! max_width = 0             # Reject larger sources (0 = unlimited)
//! max_height = 0
//!
//! [resize]
//! param = "resize"          # Request key holding the resize options
//! default_interpolation = "lanczos3"
//! max_dimension = 8192      # Largest width/height a request may ask for
//!
//! [jpeg]
//! default_quality = 75      # Used when a request has no "quality"
//!
//! [avif]
//! default_quality = 80
//! speed = 6                 # rav1e speed, 1 (slow) to 10 (fast)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [logging]
//! level = "info"            # Overridden by RUST_LOG
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{EncoderDefaults, Interpolation, Quality, Registry, ResizeProcessor};
use crate::imaging::{UnsupportedFormat, encoders, resize};
use crate::process::{Limits, Pipeline};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "picserve.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    UnsupportedTransform(#[from] UnsupportedFormat),
}

/// Server configuration loaded from `picserve.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Pipeline shape and source limits.
    pub pipeline: PipelineConfig,
    /// Built-in resize transform settings.
    pub resize: ResizeConfig,
    /// JPEG encoder defaults.
    pub jpeg: JpegConfig,
    /// AVIF encoder defaults.
    pub avif: AvifConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg.default_quality) {
            return Err(ConfigError::Validation(
                "jpeg.default_quality must be 1-100".into(),
            ));
        }
        if !(1..=100).contains(&self.avif.default_quality) {
            return Err(ConfigError::Validation(
                "avif.default_quality must be 1-100".into(),
            ));
        }
        if !(1..=10).contains(&self.avif.speed) {
            return Err(ConfigError::Validation("avif.speed must be 1-10".into()));
        }
        if self.resize.param.is_empty() {
            return Err(ConfigError::Validation(
                "resize.param must not be empty".into(),
            ));
        }
        if self.resize.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "resize.max_dimension must be non-zero".into(),
            ));
        }
        if Interpolation::parse(&self.resize.default_interpolation).is_none() {
            return Err(ConfigError::Validation(format!(
                "resize.default_interpolation must be one of {}",
                Interpolation::NAMES.join(", ")
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn encoder_defaults(&self) -> EncoderDefaults {
        EncoderDefaults {
            jpeg_quality: Quality::new(self.jpeg.default_quality),
            avif_quality: Quality::new(self.avif.default_quality),
            avif_speed: self.avif.speed,
        }
    }

    /// Registry with every built-in handler, configured from `self`.
    pub fn build_registry(&self) -> Registry {
        let interpolation =
            Interpolation::parse(&self.resize.default_interpolation).unwrap_or_default();
        let mut registry = Registry::new();
        encoders::register_all(&mut registry, &self.encoder_defaults());
        resize::register(
            &mut registry,
            ResizeProcessor::new()
                .with_param(&self.resize.param)
                .with_default_interpolation(interpolation)
                .with_max_dimension(self.resize.max_dimension),
        );
        registry
    }

    /// Pipeline over [`build_registry`](Self::build_registry) with the
    /// configured transform and limits.
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        let pipeline = Pipeline::new(Arc::new(self.build_registry())).with_limits(Limits {
            max_width: self.pipeline.max_width,
            max_height: self.pipeline.max_height,
        });
        if self.pipeline.transform.is_empty() {
            return Ok(pipeline);
        }
        Ok(pipeline.with_transform(&self.pipeline.transform)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Registered transform name; empty runs decode and encode only.
    pub transform: String,
    /// Largest accepted source width, 0 = unlimited.
    pub max_width: u32,
    /// Largest accepted source height, 0 = unlimited.
    pub max_height: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transform: "resize".to_string(),
            max_width: 0,
            max_height: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Request key holding the nested resize options.
    pub param: String,
    /// Interpolation used when a request does not name one.
    pub default_interpolation: String,
    /// Largest width or height a request may ask for.
    pub max_dimension: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            param: resize::DEFAULT_PARAM.to_string(),
            default_interpolation: "lanczos3".to_string(),
            max_dimension: resize::DEFAULT_MAX_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    pub default_quality: u32,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self { default_quality: 75 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AvifConfig {
    pub default_quality: u32,
    /// rav1e speed, 1 (slowest, smallest) to 10 (fastest).
    pub speed: u8,
}

impl Default for AvifConfig {
    fn default() -> Self {
        Self {
            default_quality: 80,
            speed: 6,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"picserve=debug"`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `picserve.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# picserve configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Pipeline
# ---------------------------------------------------------------------------
[pipeline]
# Registered transform run between decode and encode. "" disables it.
transform = "resize"

# Sources larger than this are rejected before their pixels are decoded.
# 0 means unlimited.
max_width = 0
max_height = 0

# ---------------------------------------------------------------------------
# Resize transform
# ---------------------------------------------------------------------------
[resize]
# Request key holding the nested options, e.g. resize.width=100.
param = "resize"

# One of: nearest_neighbor, bilinear, bicubic, mitchell_netravali,
# gaussian, lanczos2, lanczos3.
default_interpolation = "lanczos3"

# Largest output width or height, requested or derived.
max_dimension = 8192

# ---------------------------------------------------------------------------
# Encoders
# ---------------------------------------------------------------------------
[jpeg]
# Quality used when a request has no "quality" (1-100).
default_quality = 75

[avif]
default_quality = 80

# rav1e speed: 1 is slowest with the smallest output, 10 is fastest.
speed = 6

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for batch runs. Omit for auto (= CPU cores).
# Values above the core count are clamped down.
# max_processes = 4

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# tracing filter directive. RUST_LOG takes precedence when set.
level = "info"
"##
}
