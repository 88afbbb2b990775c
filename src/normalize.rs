//! Parameter normalization: raw caller options into canonical settings.
//!
//! Callers (CLI flags, a JSON body) hand over a [`RawOptions`] where every
//! field is optional. Each transformer has a typed settings struct with an
//! explicit default; `normalize` fills absent fields from that default and
//! clamps the bounded ones. Normalization never fails.
//!
//! | Field | Default | Range |
//! |---|---|---|
//! | gamma | 1.1 | clamped to 1.0–3.0 |
//! | scale | 2.0 (upscale), 1.5 (restore) | clamped to 1.1–8.0 |
//! | strength | 3 | rounded, clamped to 1–10 |
//! | brightness, contrast, saturation | 1.1, 1.2, 1.1 | unbounded |
//! | temperature, vibrance, exposure, highlights, shadows | 0 | unbounded |
//!
//! Unbounded fields are trusted as given, with one exception: a non-finite
//! number (NaN, ±∞) is replaced by the field's default.

use crate::config::EngineConfig;
use crate::imaging::params::{Quality, ResampleKernel};
use serde::Deserialize;

pub const GAMMA_RANGE: (f32, f32) = (1.0, 3.0);
pub const SCALE_RANGE: (f64, f64) = (1.1, 8.0);
pub const STRENGTH_RANGE: (u32, u32) = (1, 10);

/// Options exactly as a caller supplied them. Absent means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawOptions {
    pub brightness: Option<f32>,
    pub contrast: Option<f32>,
    pub saturation: Option<f32>,
    pub gamma: Option<f32>,
    pub sharpen: Option<bool>,
    pub denoise: Option<bool>,
    pub scale: Option<f64>,
    /// Post-upscale sharpen and saturation nudge.
    pub enhance: Option<bool>,
    pub kernel: Option<ResampleKernel>,
    pub strength: Option<f64>,
    pub temperature: Option<f32>,
    pub vibrance: Option<f32>,
    pub exposure: Option<f32>,
    pub highlights: Option<f32>,
    pub shadows: Option<f32>,
    pub format: Option<String>,
    pub quality: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

fn finite_f32(value: Option<f32>, default: f32) -> f32 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

fn finite_f64(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

/// Default-then-clamp for the bounded scale field.
pub fn normalize_scale(value: Option<f64>, default: f64) -> f64 {
    finite_f64(value, default).clamp(SCALE_RANGE.0, SCALE_RANGE.1)
}

/// Default-then-clamp for the bounded gamma field.
pub fn normalize_gamma(value: Option<f32>, default: f32) -> f32 {
    finite_f32(value, default).clamp(GAMMA_RANGE.0, GAMMA_RANGE.1)
}

/// Round, then clamp to the denoise strength range.
pub fn normalize_strength(value: Option<f64>, default: u32) -> u32 {
    let rounded = finite_f64(value, default as f64).round();
    rounded.clamp(STRENGTH_RANGE.0 as f64, STRENGTH_RANGE.1 as f64) as u32
}

/// Canonical Enhance parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceSettings {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub gamma: f32,
    pub sharpen: bool,
    pub denoise: bool,
    pub quality: Quality,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self {
            brightness: 1.1,
            contrast: 1.2,
            saturation: 1.1,
            gamma: 1.1,
            sharpen: true,
            denoise: false,
            quality: Quality::new(95),
        }
    }
}

impl EnhanceSettings {
    /// Restoration uses the same tone defaults with denoise on.
    pub fn restoration() -> Self {
        Self {
            denoise: true,
            ..Self::default()
        }
    }

    pub fn normalize(raw: &RawOptions, config: &EngineConfig) -> Self {
        Self::normalize_over(Self::default(), raw, config)
    }

    /// Apply `raw` over an explicit set of defaults.
    pub fn normalize_over(defaults: Self, raw: &RawOptions, config: &EngineConfig) -> Self {
        Self {
            brightness: finite_f32(raw.brightness, defaults.brightness),
            contrast: finite_f32(raw.contrast, defaults.contrast),
            saturation: finite_f32(raw.saturation, defaults.saturation),
            gamma: normalize_gamma(raw.gamma, defaults.gamma),
            sharpen: raw.sharpen.unwrap_or(defaults.sharpen),
            denoise: raw.denoise.unwrap_or(defaults.denoise),
            quality: Quality::new(config.encoding.quality),
        }
    }
}

/// Canonical Upscale parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpscaleSettings {
    pub scale: f64,
    /// Chain a light sharpen and saturation nudge after resizing.
    pub enhance: bool,
    pub kernel: ResampleKernel,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl Default for UpscaleSettings {
    fn default() -> Self {
        Self::normalize(&RawOptions::default(), &EngineConfig::default())
    }
}

impl UpscaleSettings {
    pub const DEFAULT_SCALE: f64 = 2.0;

    pub fn normalize(raw: &RawOptions, config: &EngineConfig) -> Self {
        Self {
            scale: normalize_scale(raw.scale, Self::DEFAULT_SCALE),
            enhance: raw.enhance.unwrap_or(false),
            kernel: raw.kernel.unwrap_or(config.upscale.kernel),
            max_width: config.limits.max_width,
            max_height: config.limits.max_height,
            quality: Quality::new(config.encoding.quality),
        }
    }
}

/// Canonical Denoise parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenoiseSettings {
    pub strength: u32,
    pub quality: Quality,
}

impl Default for DenoiseSettings {
    fn default() -> Self {
        Self::normalize(&RawOptions::default(), &EngineConfig::default())
    }
}

impl DenoiseSettings {
    pub const DEFAULT_STRENGTH: u32 = 3;

    pub fn normalize(raw: &RawOptions, config: &EngineConfig) -> Self {
        Self {
            strength: normalize_strength(raw.strength, Self::DEFAULT_STRENGTH),
            quality: Quality::new(config.encoding.quality),
        }
    }
}

/// Canonical Color-Balance parameters. Zero means "leave alone".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSettings {
    pub temperature: f32,
    pub vibrance: f32,
    pub exposure: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub quality: Quality,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self::normalize(&RawOptions::default(), &EngineConfig::default())
    }
}

impl ColorSettings {
    pub fn normalize(raw: &RawOptions, config: &EngineConfig) -> Self {
        Self {
            temperature: finite_f32(raw.temperature, 0.0),
            vibrance: finite_f32(raw.vibrance, 0.0),
            exposure: finite_f32(raw.exposure, 0.0),
            highlights: finite_f32(raw.highlights, 0.0),
            shadows: finite_f32(raw.shadows, 0.0),
            quality: Quality::new(config.encoding.color_balance_quality),
        }
    }
}

/// Canonical Format-Convert parameters.
///
/// The target stays a string here: rejecting an unknown target is the
/// transformer's job, since normalization never fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSettings {
    pub target: String,
    pub quality: Quality,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self::normalize(&RawOptions::default(), &EngineConfig::default())
    }
}

impl ConvertSettings {
    pub const DEFAULT_TARGET: &'static str = "jpeg";

    pub fn normalize(raw: &RawOptions, config: &EngineConfig) -> Self {
        Self {
            target: raw
                .format
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_TARGET.to_string()),
            quality: Quality::new(raw.quality.unwrap_or(config.convert.quality)),
        }
    }
}

/// Canonical Thumbnail parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailSettings {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self::normalize(&RawOptions::default(), &EngineConfig::default())
    }
}

impl ThumbnailSettings {
    pub fn normalize(raw: &RawOptions, config: &EngineConfig) -> Self {
        Self {
            width: raw.width.unwrap_or(config.thumbnail.width).max(1),
            height: raw.height.unwrap_or(config.thumbnail.height).max(1),
            quality: Quality::new(raw.quality.unwrap_or(config.thumbnail.quality)),
        }
    }
}

/// Canonical Restore parameters: both stages plus the scale as requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestoreSettings {
    /// Scale before clamping; decides between the one- and two-stage plans.
    pub requested_scale: f64,
    /// Upscale stage, with its scale clamped and post-enhance off.
    pub upscale: UpscaleSettings,
    pub enhance: EnhanceSettings,
}

impl Default for RestoreSettings {
    fn default() -> Self {
        Self::normalize(&RawOptions::default(), &EngineConfig::default())
    }
}

impl RestoreSettings {
    pub const DEFAULT_SCALE: f64 = 1.5;

    pub fn normalize(raw: &RawOptions, config: &EngineConfig) -> Self {
        let requested_scale = finite_f64(raw.scale, Self::DEFAULT_SCALE);
        let upscale = UpscaleSettings {
            scale: normalize_scale(Some(requested_scale), Self::DEFAULT_SCALE),
            enhance: false,
            ..UpscaleSettings::normalize(raw, config)
        };
        Self {
            requested_scale,
            upscale,
            enhance: EnhanceSettings::normalize_over(EnhanceSettings::restoration(), raw, config),
        }
    }
}
