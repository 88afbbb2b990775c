//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which plans each transformer) and the [`backend`](super::backend) (which
//! does the pixel work). Keeping the plan as plain data lets tests assert on
//! exactly which steps a transformer asked for, using a recording mock.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (sigma + threshold).
//! - [`Adjustment`]: One pixel step (tone, gamma, linear remap, filters).
//! - [`Encoding`]: Output container plus quality.
//! - [`ResampleKernel`]: Resize filter, named by what it is rather than by crate type.
//! - [`ResizeParams`]: Resize to exact dimensions, then adjust, then encode.
//! - [`AdjustParams`]: Adjust at the original size, then encode.

use super::format::OutputFormat;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening, used after upscaling.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }

    /// Standard sharpening for the enhance transformer.
    pub fn standard() -> Self {
        Self {
            sigma: 1.0,
            threshold: 1,
        }
    }
}

/// A single pixel-level step. Steps run in the order given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Multiply RGB by `brightness`; mix each pixel with its luma by `saturation`.
    Modulate { brightness: f32, saturation: f32 },
    /// `out = 255 * (in / 255) ^ (1 / gamma)`.
    Gamma(f32),
    /// `out = multiplier * in + offset`, per channel.
    Linear { multiplier: f32, offset: f32 },
    /// Independent per-channel gains.
    ChannelGains { red: f32, green: f32, blue: f32 },
    Sharpen(Sharpening),
    /// Median over a `(2 * radius + 1)` square window.
    Median { radius: u32 },
    Blur { sigma: f32 },
}

/// Output container and quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
    pub format: OutputFormat,
    pub quality: Quality,
}

/// Resampling filter used when resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleKernel {
    Nearest,
    /// Bilinear (triangle).
    Linear,
    /// Catmull-Rom.
    Cubic,
    Gaussian,
    /// Windowed sinc, three lobes.
    #[default]
    Lanczos3,
}

impl ResampleKernel {
    pub fn filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Linear => FilterType::Triangle,
            Self::Cubic => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Cubic => "cubic",
            Self::Gaussian => "gaussian",
            Self::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for ResampleKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResampleKernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" | "bilinear" | "triangle" => Ok(Self::Linear),
            "cubic" | "catmullrom" => Ok(Self::Cubic),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            other => Err(format!("unknown resampling kernel: {other}")),
        }
    }
}

/// Resize to exactly `width` x `height` (no letterboxing), then apply
/// `adjustments`, then encode.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub kernel: ResampleKernel,
    pub adjustments: Vec<Adjustment>,
    pub encoding: Encoding,
}

/// Apply `adjustments` at the original size, then encode. An empty list is a
/// plain re-encode.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub adjustments: Vec<Adjustment>,
    pub encoding: Encoding,
}
