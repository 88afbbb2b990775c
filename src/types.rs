//! Shared result and error types.
//!
//! Every public pipeline operation ends in a [`ResultRecord`]: either a fully
//! populated [`Outcome`] or a [`PipelineError`]. Internally operations return
//! `Result<Outcome, PipelineError>` and propagate with `?`; the conversion to a
//! record happens once, at the [`Pipeline`](crate::pipeline::Pipeline) boundary.
//!
//! The JSON shape of a record is the contract the CLI and any server layer
//! depend on:
//!
//! ```text
//! {"success": true,  "message": "...", "outputPath": "...", "originalSize": "400x300", "newSize": "800x600", "scaleFactor": "2.0x"}
//! {"success": false, "error": "File not found: /tmp/missing.jpg"}
//! ```

use crate::imaging::calculations::format_scale_factor;
use crate::imaging::format::SourceFormat;
use crate::imaging::{BackendError, Dimensions};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy shared by the validator, transformers and orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Unsupported target format: {0} (expected jpeg, png, webp or avif)")]
    UnsupportedTargetFormat(String),
    #[error("Unreadable image file: {}", .0.display())]
    Unreadable(PathBuf),
    #[error("Processing failed: {0}")]
    ProcessingFailure(String),
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Io(e) => Self::ProcessingFailure(format!("I/O error: {e}")),
            BackendError::ProcessingFailed(msg) => Self::ProcessingFailure(msg),
        }
    }
}

/// Before/after dimensions of an operation that changed the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSummary {
    pub original: Dimensions,
    pub new: Dimensions,
    /// Requested scale factor, when the resize was driven by one.
    pub scale_factor: Option<f64>,
}

/// A successful operation. There is no partially-populated success: the
/// message and output path are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub message: String,
    pub output_path: PathBuf,
    pub resize: Option<ResizeSummary>,
}

impl Outcome {
    pub fn new(message: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            message: message.into(),
            output_path: output_path.into(),
            resize: None,
        }
    }

    pub fn with_resize(mut self, resize: ResizeSummary) -> Self {
        self.resize = Some(resize);
        self
    }
}

/// Tagged outcome of one pipeline call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRecord {
    Success(Outcome),
    Failure(PipelineError),
}

impl ResultRecord {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            Self::Success(outcome) => Some(outcome),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }
}

impl From<Result<Outcome, PipelineError>> for ResultRecord {
    fn from(result: Result<Outcome, PipelineError>) -> Self {
        match result {
            Ok(outcome) => Self::Success(outcome),
            Err(err) => Self::Failure(err),
        }
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(outcome) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("message", &outcome.message)?;
                map.serialize_entry("outputPath", &outcome.output_path)?;
                if let Some(resize) = &outcome.resize {
                    map.serialize_entry("originalSize", &resize.original.to_string())?;
                    map.serialize_entry("newSize", &resize.new.to_string())?;
                    if let Some(scale) = resize.scale_factor {
                        map.serialize_entry("scaleFactor", &format_scale_factor(scale))?;
                    }
                }
                map.end()
            }
            Self::Failure(err) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", &err.to_string())?;
                map.end()
            }
        }
    }
}

/// Metadata of a source image, read without running any transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: SourceFormat,
    pub channels: u8,
    pub has_alpha: bool,
    pub colorspace: String,
    pub file_size_bytes: u64,
}

impl ImageInfo {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

/// Result of `get_image_info`: `{success, info}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoRecord {
    Success(ImageInfo),
    Failure(PipelineError),
}

impl From<Result<ImageInfo, PipelineError>> for InfoRecord {
    fn from(result: Result<ImageInfo, PipelineError>) -> Self {
        match result {
            Ok(info) => Self::Success(info),
            Err(err) => Self::Failure(err),
        }
    }
}

impl Serialize for InfoRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Self::Success(info) => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("info", info)?;
            }
            Self::Failure(err) => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", &err.to_string())?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn success_record_serializes_size_strings() {
        let record = ResultRecord::Success(
            Outcome::new("Image upscaled", "/out/photo.png").with_resize(ResizeSummary {
                original: dims(400, 300),
                new: dims(800, 600),
                scale_factor: Some(2.0),
            }),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Image upscaled");
        assert_eq!(json["outputPath"], "/out/photo.png");
        assert_eq!(json["originalSize"], "400x300");
        assert_eq!(json["newSize"], "800x600");
        assert_eq!(json["scaleFactor"], "2.0x");
    }

    #[test]
    fn success_record_without_resize_omits_size_keys() {
        let record = ResultRecord::Success(Outcome::new("Image enhanced", "/out/a.jpg"));
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("originalSize"));
        assert!(!obj.contains_key("newSize"));
        assert!(!obj.contains_key("scaleFactor"));
        assert!(!obj.contains_key("error"));
    }

    #[test]
    fn failure_record_has_only_success_and_error() {
        let record = ResultRecord::Failure(PipelineError::NotFound("/missing.jpg".into()));
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "File not found: /missing.jpg");
    }

    #[test]
    fn backend_processing_error_maps_without_double_prefix() {
        let err: PipelineError = BackendError::ProcessingFailed("decode failed".into()).into();
        assert_eq!(err.to_string(), "Processing failed: decode failed");
    }

    #[test]
    fn record_from_result() {
        let ok: ResultRecord = Ok(Outcome::new("done", "/o.png")).into();
        assert!(ok.is_success());
        assert_eq!(ok.outcome().unwrap().message, "done");

        let err: ResultRecord = Err(PipelineError::Unreadable("/x".into())).into();
        assert!(!err.is_success());
        assert!(matches!(err.error(), Some(PipelineError::Unreadable(_))));
    }

    #[test]
    fn info_record_serializes_camel_case() {
        let record = InfoRecord::Success(ImageInfo {
            width: 10,
            height: 20,
            format: SourceFormat::Png,
            channels: 4,
            has_alpha: true,
            colorspace: "srgb".into(),
            file_size_bytes: 123,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["info"]["format"], "png");
        assert_eq!(json["info"]["hasAlpha"], true);
        assert_eq!(json["info"]["fileSizeBytes"], 123);
    }
}
