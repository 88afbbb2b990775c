//! Engine configuration.
//!
//! Handles loading, validating, and merging an optional `retouch.toml`. Stock
//! defaults are the base layer; a user file only needs the keys it wants to
//! override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_file_size_bytes = 104857600  # 100 MiB input ceiling
//! max_width = 8000                 # Upscale cap per axis
//! max_height = 8000
//!
//! [upscale]
//! kernel = "lanczos3"              # nearest, linear, cubic, gaussian, lanczos3
//!
//! [encoding]
//! quality = 95                     # Enhance / upscale / denoise / restore output
//! color_balance_quality = 95       # Color-balance output (always JPEG)
//!
//! [thumbnail]
//! width = 300                      # Bounding box
//! height = 300
//! quality = 80
//!
//! [convert]
//! quality = 90                     # Used when the caller gives none
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::params::ResampleKernel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default input size ceiling: 100 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from a TOML file over stock defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Input and output size bounds.
    pub limits: LimitsConfig,
    /// Resampling settings for upscale.
    pub upscale: UpscaleConfig,
    /// Fixed high-quality settings used by the transformers.
    pub encoding: EncodingConfig,
    /// Thumbnail bounding box and quality.
    pub thumbnail: ThumbnailConfig,
    /// Format-convert defaults.
    pub convert: ConvertConfig,
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_size_bytes == 0 {
            return Err(ConfigError::Validation(
                "limits.max_file_size_bytes must be non-zero".into(),
            ));
        }
        if self.limits.max_width == 0 || self.limits.max_height == 0 {
            return Err(ConfigError::Validation(
                "limits.max_width and limits.max_height must be non-zero".into(),
            ));
        }
        if self.thumbnail.width == 0 || self.thumbnail.height == 0 {
            return Err(ConfigError::Validation(
                "thumbnail.width and thumbnail.height must be non-zero".into(),
            ));
        }
        for (key, quality) in [
            ("encoding.quality", self.encoding.quality),
            ("encoding.color_balance_quality", self.encoding.color_balance_quality),
            ("thumbnail.quality", self.thumbnail.quality),
            ("convert.quality", self.convert.quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Inputs larger than this are rejected before decoding.
    pub max_file_size_bytes: u64,
    /// Upscale output is capped at this width.
    pub max_width: u32,
    /// Upscale output is capped at this height.
    pub max_height: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
            max_width: 8000,
            max_height: 8000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpscaleConfig {
    pub kernel: ResampleKernel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub quality: u32,
    pub color_balance_quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            color_balance_quality: 95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
    pub quality: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            quality: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    pub quality: u32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EngineConfig::default())?)
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

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the engine config.
///
/// With no path, returns the stock defaults. With a path, the file must exist;
/// its values are merged over the defaults, unknown keys are rejected and the
/// result is validated.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# retouch configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Inputs larger than this many bytes are rejected before decoding (100 MiB).
max_file_size_bytes = 104857600

# Upscaled output is capped at this many pixels on each axis.
max_width = 8000
max_height = 8000

# ---------------------------------------------------------------------------
# Upscale
# ---------------------------------------------------------------------------
[upscale]
# Resampling kernel: nearest, linear, cubic, gaussian, lanczos3.
kernel = "lanczos3"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# Quality for enhance, upscale, denoise and restore output (1-100).
# Applies to JPEG and AVIF; PNG and WebP are lossless.
quality = 95

# Quality for color-balance output, which is always JPEG.
color_balance_quality = 95

# ---------------------------------------------------------------------------
# Thumbnails (always JPEG, never enlarged)
# ---------------------------------------------------------------------------
[thumbnail]
width = 300
height = 300
quality = 80

# ---------------------------------------------------------------------------
# Format conversion
# ---------------------------------------------------------------------------
[convert]
# Quality used when the caller does not give one.
quality = 90
"##
}
