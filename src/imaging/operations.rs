//! Single-operation transformers.
//!
//! Each transformer identifies its source, plans backend parameters with a
//! pure `plan_*` function, makes exactly one backend call and describes what
//! happened in an [`Outcome`]. None of them touch the source file.
//!
//! | Transformer | Backend call | Output container |
//! |---|---|---|
//! | [`enhance`] | `adjust` | source format |
//! | [`upscale`] | `resize` | source format |
//! | [`denoise`] | `adjust` | source format |
//! | [`color_balance`] | `adjust` | always JPEG |
//! | [`convert`] | `adjust` (no steps) | requested target |
//! | [`thumbnail`] | `resize` | always JPEG |

use super::backend::ImageBackend;
use super::calculations::{
    TONE_DIVISOR, contrast_remap, fit_within, format_scale_factor, temperature_gains,
    upscale_dimensions,
};
use super::format::OutputFormat;
use super::params::{
    AdjustParams, Adjustment, Encoding, Quality, ResampleKernel, ResizeParams, Sharpening,
};
use crate::normalize::{
    ColorSettings, ConvertSettings, DenoiseSettings, EnhanceSettings, ThumbnailSettings,
    UpscaleSettings,
};
use crate::types::{ImageInfo, Outcome, PipelineError, ResizeSummary};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Result type for transformers.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Read source metadata through the backend.
pub fn image_info(backend: &impl ImageBackend, path: &Path) -> Result<ImageInfo> {
    Ok(backend.identify(path)?)
}

/// Encoding that writes the source's own container at `quality`.
fn same_format(info: &ImageInfo, quality: Quality) -> Result<Encoding> {
    let format = info.format.output_format().ok_or_else(|| {
        PipelineError::ProcessingFailure(format!("No encoder available for {}", info.format))
    })?;
    Ok(Encoding { format, quality })
}

// ============================================================================
// Enhance
// ============================================================================

/// Enhance steps, in order: tone, gamma, contrast, then the optional filters.
///
/// Contrast follows tone modulation so the remap's fixed point at 128 is not
/// shifted by the brightness change.
pub fn plan_enhance(settings: &EnhanceSettings) -> Vec<Adjustment> {
    let (multiplier, offset) = contrast_remap(settings.contrast);
    let mut steps = vec![
        Adjustment::Modulate {
            brightness: settings.brightness,
            saturation: settings.saturation,
        },
        Adjustment::Gamma(settings.gamma),
        Adjustment::Linear { multiplier, offset },
    ];
    if settings.sharpen {
        steps.push(Adjustment::Sharpen(Sharpening::standard()));
    }
    if settings.denoise {
        steps.push(Adjustment::Median { radius: 1 });
    }
    steps
}

pub fn enhance(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    settings: &EnhanceSettings,
) -> Result<Outcome> {
    let info = backend.identify(source)?;
    let params = AdjustParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        adjustments: plan_enhance(settings),
        encoding: same_format(&info, settings.quality)?,
    };
    debug!(?settings, steps = params.adjustments.len(), "enhance planned");
    backend.adjust(&params)?;

    info!(output = %output.display(), "image enhanced");
    Ok(Outcome::new("Image enhanced", output))
}

// ============================================================================
// Upscale
// ============================================================================

/// Light sharpen plus a saturation nudge, chained after an upscale on request.
pub fn post_upscale_steps() -> Vec<Adjustment> {
    vec![
        Adjustment::Sharpen(Sharpening::light()),
        Adjustment::Modulate {
            brightness: 1.0,
            saturation: 1.1,
        },
    ]
}

pub fn plan_upscale(
    source: &Path,
    output: &Path,
    info: &ImageInfo,
    settings: &UpscaleSettings,
) -> Result<ResizeParams> {
    let (width, height) = upscale_dimensions(
        (info.width, info.height),
        settings.scale,
        (settings.max_width, settings.max_height),
    );
    Ok(ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        kernel: settings.kernel,
        adjustments: if settings.enhance {
            post_upscale_steps()
        } else {
            Vec::new()
        },
        encoding: same_format(info, settings.quality)?,
    })
}

pub fn upscale(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    settings: &UpscaleSettings,
) -> Result<Outcome> {
    let info = backend.identify(source)?;
    let params = plan_upscale(source, output, &info, settings)?;
    debug!(
        scale = settings.scale,
        kernel = %settings.kernel,
        width = params.width,
        height = params.height,
        "upscale planned"
    );
    let new = backend.resize(&params)?;

    let summary = ResizeSummary {
        original: info.dimensions(),
        new,
        scale_factor: Some(settings.scale),
    };
    info!(
        output = %output.display(),
        from = %summary.original,
        to = %summary.new,
        "image upscaled"
    );
    Ok(Outcome::new(
        format!(
            "Image upscaled from {} to {} ({})",
            summary.original,
            summary.new,
            format_scale_factor(settings.scale)
        ),
        output,
    )
    .with_resize(summary))
}

// ============================================================================
// Denoise
// ============================================================================

/// Denoise escalation by strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenoiseTier {
    /// 1–3: a single median pass. Strength reads as the window width, so the
    /// radius never exceeds the moderate tier's.
    Light,
    /// 4–6: small median, slight blur, sharpen to recover detail.
    Moderate,
    /// 7–10: larger median, stronger blur, sharpen, small brightness lift.
    Strong,
}

impl DenoiseTier {
    pub fn for_strength(strength: u32) -> Self {
        match strength {
            0..=3 => Self::Light,
            4..=6 => Self::Moderate,
            _ => Self::Strong,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for DenoiseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn plan_denoise(strength: u32) -> Vec<Adjustment> {
    match DenoiseTier::for_strength(strength) {
        DenoiseTier::Light => vec![Adjustment::Median {
            radius: (strength / 2).max(1),
        }],
        DenoiseTier::Moderate => vec![
            Adjustment::Median { radius: 1 },
            Adjustment::Blur { sigma: 0.5 },
            Adjustment::Sharpen(Sharpening {
                sigma: 1.0,
                threshold: 1,
            }),
        ],
        DenoiseTier::Strong => vec![
            Adjustment::Median { radius: 2 },
            Adjustment::Blur { sigma: 1.0 },
            Adjustment::Sharpen(Sharpening {
                sigma: 1.5,
                threshold: 1,
            }),
            Adjustment::Modulate {
                brightness: 1.05,
                saturation: 1.0,
            },
        ],
    }
}

pub fn denoise(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    settings: &DenoiseSettings,
) -> Result<Outcome> {
    let info = backend.identify(source)?;
    let tier = DenoiseTier::for_strength(settings.strength);
    let params = AdjustParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        adjustments: plan_denoise(settings.strength),
        encoding: same_format(&info, settings.quality)?,
    };
    debug!(strength = settings.strength, %tier, "denoise planned");
    backend.adjust(&params)?;

    info!(output = %output.display(), strength = settings.strength, "noise removed");
    Ok(Outcome::new(
        format!("Noise removed (strength {}, {tier})", settings.strength),
        output,
    ))
}

// ============================================================================
// Color balance
// ============================================================================

/// Color-balance steps. Fields left at zero contribute nothing.
///
/// Temperature becomes opposite red/blue gains; vibrance, exposure and
/// shadows fold into one modulate step; highlights become a contrast remap.
pub fn plan_color_balance(settings: &ColorSettings) -> Vec<Adjustment> {
    let mut steps = Vec::new();

    if settings.temperature != 0.0 {
        let (red, blue) = temperature_gains(settings.temperature);
        steps.push(Adjustment::ChannelGains {
            red,
            green: 1.0,
            blue,
        });
    }

    if settings.vibrance != 0.0 || settings.exposure != 0.0 || settings.shadows != 0.0 {
        let exposure = 1.0 + settings.exposure / 100.0;
        let shadows = 1.0 + settings.shadows / TONE_DIVISOR;
        steps.push(Adjustment::Modulate {
            brightness: exposure * shadows,
            saturation: 1.0 + settings.vibrance / 100.0,
        });
    }

    if settings.highlights != 0.0 {
        let (multiplier, offset) = contrast_remap(1.0 + settings.highlights / TONE_DIVISOR);
        steps.push(Adjustment::Linear { multiplier, offset });
    }

    steps
}

pub fn color_balance(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    settings: &ColorSettings,
) -> Result<Outcome> {
    // Identify even though the format is fixed, so unreadable sources fail here.
    backend.identify(source)?;
    let params = AdjustParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        adjustments: plan_color_balance(settings),
        encoding: Encoding {
            format: OutputFormat::Jpeg,
            quality: settings.quality,
        },
    };
    debug!(?settings, steps = params.adjustments.len(), "color balance planned");
    backend.adjust(&params)?;

    info!(output = %output.display(), "color balance adjusted");
    Ok(Outcome::new("Color balance adjusted", output))
}

// ============================================================================
// Convert
// ============================================================================

pub fn plan_convert(source: &Path, output: &Path, settings: &ConvertSettings) -> Result<AdjustParams> {
    let format = OutputFormat::parse_target(&settings.target)
        .ok_or_else(|| PipelineError::UnsupportedTargetFormat(settings.target.clone()))?;
    Ok(AdjustParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        adjustments: Vec::new(),
        encoding: Encoding {
            format,
            quality: settings.quality,
        },
    })
}

pub fn convert(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    settings: &ConvertSettings,
) -> Result<Outcome> {
    let params = plan_convert(source, output, settings)?;
    let info = backend.identify(source)?;
    debug!(from = %info.format, to = %params.encoding.format, "convert planned");
    backend.adjust(&params)?;

    info!(output = %output.display(), format = %params.encoding.format, "image converted");
    Ok(Outcome::new(
        format!("Image converted from {} to {}", info.format, params.encoding.format),
        output,
    ))
}

// ============================================================================
// Thumbnail
// ============================================================================

pub fn plan_thumbnail(
    source: &Path,
    output: &Path,
    info: &ImageInfo,
    settings: &ThumbnailSettings,
) -> ResizeParams {
    let (width, height) = fit_within((info.width, info.height), (settings.width, settings.height));
    ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        kernel: ResampleKernel::Lanczos3,
        adjustments: Vec::new(),
        encoding: Encoding {
            format: OutputFormat::Jpeg,
            quality: settings.quality,
        },
    }
}

pub fn thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    settings: &ThumbnailSettings,
) -> Result<Outcome> {
    let info = backend.identify(source)?;
    let params = plan_thumbnail(source, output, &info, settings);
    let new = backend.resize(&params)?;

    let summary = ResizeSummary {
        original: info.dimensions(),
        new,
        scale_factor: None,
    };
    info!(output = %output.display(), size = %summary.new, "thumbnail created");
    Ok(Outcome::new(format!("Thumbnail created ({})", summary.new), output).with_resize(summary))
}
