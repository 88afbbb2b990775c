//! Suggested restoration settings from image size and intended use.
//!
//! The scale factor steps down as the image grows:
//!
//! | Use case | Scale by megapixels |
//! |---|---|
//! | general | < 1 → 2.0, < 4 → 1.5, else 1.2 |
//! | print | < 2 → 4.0, < 8 → 2.0, else 1.5 |
//! | web | < 0.5 → 1.5, else 1.0 |

use crate::imaging::calculations::megapixels;
use crate::normalize::RawOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseCase {
    #[default]
    General,
    Print,
    Web,
}

impl UseCase {
    pub fn name(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Print => "print",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UseCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "print" => Ok(Self::Print),
            "web" => Ok(Self::Web),
            other => Err(format!("unknown use case: {other} (expected general, print or web)")),
        }
    }
}

/// Suggested settings for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterPreset {
    pub use_case: UseCase,
    pub megapixels: f64,
    pub scale: f64,
    pub sharpen: bool,
    pub denoise: bool,
    pub quality: u32,
}

impl ParameterPreset {
    /// Restoration options carrying this preset's choices. Quality is not
    /// included: restore output quality comes from the engine config.
    pub fn to_raw_options(&self) -> RawOptions {
        RawOptions {
            scale: Some(self.scale),
            sharpen: Some(self.sharpen),
            denoise: Some(self.denoise),
            ..RawOptions::default()
        }
    }
}

/// Derive a preset from pixel dimensions and intended use.
pub fn get_optimal_settings(width: u32, height: u32, use_case: UseCase) -> ParameterPreset {
    let mp = megapixels(width, height);
    let scale = match use_case {
        UseCase::General if mp < 1.0 => 2.0,
        UseCase::General if mp < 4.0 => 1.5,
        UseCase::General => 1.2,
        UseCase::Print if mp < 2.0 => 4.0,
        UseCase::Print if mp < 8.0 => 2.0,
        UseCase::Print => 1.5,
        UseCase::Web if mp < 0.5 => 1.5,
        UseCase::Web => 1.0,
    };
    // Small sources carry the most visible noise once enlarged.
    let denoise = matches!(use_case, UseCase::General | UseCase::Print) && mp < 1.0;
    let quality = match use_case {
        UseCase::General => 95,
        UseCase::Print => 100,
        UseCase::Web => 85,
    };

    ParameterPreset {
        use_case,
        megapixels: mp,
        scale,
        sharpen: true,
        denoise,
        quality,
    }
}
