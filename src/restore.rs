//! Restoration: upscale then enhance, as one operation.
//!
//! ```text
//! validate ──► normalize ──► plan
//!                              │
//!              scale ≤ 1 ──────┼──────► enhance(source → output)
//!                              │
//!              scale > 1 ──────┴──────► upscale(source → intermediate)
//!                                          │
//!                                          ▼
//!                                       enhance(intermediate → output)
//!                                          │
//!                                          ▼
//!                                       intermediate removed (every path)
//! ```
//!
//! The intermediate artifact sits next to the output as
//! `<output-stem>_temp_upscaled_<random>.<source-ext>`. The name is reserved
//! by creating the file exclusively, so it can never alias the source, the
//! output or an unrelated file already in that directory. An
//! [`IntermediateArtifact`] guard owns it and removes it when the call
//! returns, whichever stage failed. The upscale stage runs without its own
//! post-enhance because the enhance stage follows.

use crate::config::EngineConfig;
use crate::imaging::ImageBackend;
use crate::imaging::calculations::format_scale_factor;
use crate::imaging::operations::{Result, enhance, upscale};
use crate::normalize::{RawOptions, RestoreSettings};
use crate::types::{Outcome, PipelineError};
use crate::validate::validate_input_file;
use std::io;
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, info, instrument, warn};

/// Which stages a restoration runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestorationPlan {
    /// Requested scale ≤ 1: enhance straight from source to output.
    EnhanceOnly,
    /// Upscale by `scale` (already clamped) into an intermediate, then enhance.
    TwoStage { scale: f64 },
}

impl RestorationPlan {
    pub fn from_settings(settings: &RestoreSettings) -> Self {
        if settings.requested_scale > 1.0 {
            Self::TwoStage {
                scale: settings.upscale.scale,
            }
        } else {
            Self::EnhanceOnly
        }
    }
}

/// A uniquely named transient file deleted when the guard drops.
///
/// Deletion is best-effort: a file already gone is fine, any other failure is
/// logged and swallowed.
#[derive(Debug)]
pub struct IntermediateArtifact {
    path: Option<TempPath>,
}

impl IntermediateArtifact {
    /// Reserve a fresh file beside `output`, tagged, with the source's
    /// extension (the upscale stage keeps the source container).
    pub fn create(source: &Path, output: &Path) -> io::Result<Self> {
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let suffix = source
            .extension()
            .or_else(|| output.extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let file = tempfile::Builder::new()
            .prefix(&format!("{stem}_temp_upscaled_"))
            .suffix(&suffix)
            .tempfile_in(dir)?;
        let path = file.into_temp_path();
        debug!(path = %path.display(), "intermediate artifact reserved");
        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }
}

impl Drop for IntermediateArtifact {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let shown = path.display().to_string();
        match path.close() {
            Ok(()) => debug!(path = %shown, "intermediate artifact removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %shown,
                error = %e,
                "failed to remove intermediate artifact"
            ),
        }
    }
}

/// Full restoration from raw options: validate, normalize, run the plan.
#[instrument(skip_all, fields(source = %source.display(), output = %output.display()))]
pub fn restore_image(
    backend: &impl ImageBackend,
    config: &EngineConfig,
    source: &Path,
    output: &Path,
    raw: &RawOptions,
) -> Result<Outcome> {
    validate_input_file(source, config.limits.max_file_size_bytes)?;
    let settings = RestoreSettings::normalize(raw, config);
    restore(backend, source, output, &settings)
}

/// Run a restoration with canonical settings. The source must already be validated.
pub fn restore(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    settings: &RestoreSettings,
) -> Result<Outcome> {
    let plan = RestorationPlan::from_settings(settings);
    debug!(?plan, requested_scale = settings.requested_scale, "restoration planned");

    match plan {
        RestorationPlan::EnhanceOnly => {
            enhance(backend, source, output, &settings.enhance)?;
            info!("image restored without upscaling");
            Ok(Outcome::new(
                "Image restored (enhanced without upscaling)",
                output,
            ))
        }
        RestorationPlan::TwoStage { scale } => {
            let artifact = IntermediateArtifact::create(source, output).map_err(|e| {
                PipelineError::ProcessingFailure(format!(
                    "Failed to create intermediate file: {e}"
                ))
            })?;
            let upscaled = upscale(backend, source, artifact.path(), &settings.upscale)?;
            enhance(backend, artifact.path(), output, &settings.enhance)?;

            let message = match upscaled.resize {
                Some(summary) => format!(
                    "Image restored: upscaled {} → {} ({}) and enhanced",
                    summary.original,
                    summary.new,
                    format_scale_factor(scale)
                ),
                None => "Image restored: upscaled and enhanced".to_string(),
            };
            info!(%message, "image restored");
            let mut outcome = Outcome::new(message, output);
            outcome.resize = upscaled.resize;
            Ok(outcome)
        }
    }
}
