//! Uniform dispatch over the single-operation transformers.
//!
//! [`OperationKind`] names a transformer (and parses from the names a batch
//! runner or CLI would use); [`Operation`] is that transformer together with
//! its canonical settings, ready to [`apply`](Operation::apply).

use crate::config::EngineConfig;
use crate::imaging::ImageBackend;
use crate::imaging::operations::{
    Result, color_balance, convert, denoise, enhance, thumbnail, upscale,
};
use crate::normalize::{
    ColorSettings, ConvertSettings, DenoiseSettings, EnhanceSettings, RawOptions,
    ThumbnailSettings, UpscaleSettings,
};
use crate::types::Outcome;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Enhance,
    Upscale,
    Denoise,
    ColorBalance,
    Convert,
    Thumbnail,
}

impl OperationKind {
    pub const ALL: [Self; 6] = [
        Self::Enhance,
        Self::Upscale,
        Self::Denoise,
        Self::ColorBalance,
        Self::Convert,
        Self::Thumbnail,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Enhance => "enhance",
            Self::Upscale => "upscale",
            Self::Denoise => "denoise",
            Self::ColorBalance => "color-balance",
            Self::Convert => "convert",
            Self::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enhance" => Ok(Self::Enhance),
            "upscale" => Ok(Self::Upscale),
            "denoise" => Ok(Self::Denoise),
            "color-balance" | "color_balance" | "color" => Ok(Self::ColorBalance),
            "convert" => Ok(Self::Convert),
            "thumbnail" => Ok(Self::Thumbnail),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}

/// A transformer with its canonical settings.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Enhance(EnhanceSettings),
    Upscale(UpscaleSettings),
    Denoise(DenoiseSettings),
    ColorBalance(ColorSettings),
    Convert(ConvertSettings),
    Thumbnail(ThumbnailSettings),
}

impl Operation {
    /// Normalize `raw` with the defaults of the named transformer.
    pub fn normalize(kind: OperationKind, raw: &RawOptions, config: &EngineConfig) -> Self {
        match kind {
            OperationKind::Enhance => Self::Enhance(EnhanceSettings::normalize(raw, config)),
            OperationKind::Upscale => Self::Upscale(UpscaleSettings::normalize(raw, config)),
            OperationKind::Denoise => Self::Denoise(DenoiseSettings::normalize(raw, config)),
            OperationKind::ColorBalance => {
                Self::ColorBalance(ColorSettings::normalize(raw, config))
            }
            OperationKind::Convert => Self::Convert(ConvertSettings::normalize(raw, config)),
            OperationKind::Thumbnail => Self::Thumbnail(ThumbnailSettings::normalize(raw, config)),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Enhance(_) => OperationKind::Enhance,
            Self::Upscale(_) => OperationKind::Upscale,
            Self::Denoise(_) => OperationKind::Denoise,
            Self::ColorBalance(_) => OperationKind::ColorBalance,
            Self::Convert(_) => OperationKind::Convert,
            Self::Thumbnail(_) => OperationKind::Thumbnail,
        }
    }

    /// Run the transformer from `source` into `output`.
    pub fn apply(
        &self,
        backend: &impl ImageBackend,
        source: &Path,
        output: &Path,
    ) -> Result<Outcome> {
        match self {
            Self::Enhance(settings) => enhance(backend, source, output, settings),
            Self::Upscale(settings) => upscale(backend, source, output, settings),
            Self::Denoise(settings) => denoise(backend, source, output, settings),
            Self::ColorBalance(settings) => color_balance(backend, source, output, settings),
            Self::Convert(settings) => convert(backend, source, output, settings),
            Self::Thumbnail(settings) => thumbnail(backend, source, output, settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, info};
    use crate::imaging::format::SourceFormat;

    #[test]
    fn kind_names_roundtrip() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.name().parse::<OperationKind>(), Ok(kind));
        }
        assert_eq!("Color".parse::<OperationKind>(), Ok(OperationKind::ColorBalance));
        assert!("sharpen".parse::<OperationKind>().is_err());
    }

    #[test]
    fn normalize_keeps_kind() {
        let config = EngineConfig::default();
        for kind in OperationKind::ALL {
            assert_eq!(Operation::normalize(kind, &RawOptions::default(), &config).kind(), kind);
        }
    }

    #[test]
    fn apply_dispatches_to_matching_transformer() {
        let config = EngineConfig::default();
        let expectations = [
            (OperationKind::Enhance, false),
            (OperationKind::Upscale, true),
            (OperationKind::Denoise, false),
            (OperationKind::ColorBalance, false),
            (OperationKind::Convert, false),
            (OperationKind::Thumbnail, true),
        ];

        for (kind, resizes) in expectations {
            let backend = MockBackend::with_infos(vec![info(SourceFormat::Png, 640, 480)]);
            let op = Operation::normalize(kind, &RawOptions::default(), &config);
            op.apply(&backend, Path::new("/in.png"), Path::new("/out.png"))
                .unwrap();

            let ops = backend.get_operations();
            let last = ops.last().unwrap();
            assert_eq!(
                matches!(last, RecordedOp::Resize { .. }),
                resizes,
                "{kind} made {last:?}"
            );
        }
    }
}
