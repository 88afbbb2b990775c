//! Input validation: runs before any transformer and writes nothing.
//!
//! Checks, in order:
//!
//! 1. The path resolves to a regular file we can open → else `NotFound`.
//! 2. Its size is within the configured ceiling → else `TooLarge`.
//! 3. Its header names a supported container → `Valid`. A header naming any
//!    other image format is `UnsupportedFormat`.
//! 4. An unrecognized header falls back to the extension table; no match is
//!    `Unreadable`.
//!
//! The header is authoritative: a PNG saved as `photo.dat` is valid, a text
//! file saved as `photo.gif` is not (GIF is absent from the fallback table).

use crate::imaging::format::{Probe, SourceFormat, format_from_extension, probe_file};
use crate::types::PipelineError;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Validate a candidate source file, returning its container format.
pub fn validate_input_file(path: &Path, max_file_size: u64) -> Result<SourceFormat, PipelineError> {
    let not_found = || PipelineError::NotFound(path.to_path_buf());

    let metadata = std::fs::metadata(path).map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }
    if metadata.len() > max_file_size {
        return Err(PipelineError::TooLarge {
            size: metadata.len(),
            limit: max_file_size,
        });
    }

    let format = match probe_file(path).map_err(|_| not_found())? {
        Probe::Supported(format) => format,
        Probe::Unsupported(name) => return Err(PipelineError::UnsupportedFormat(name)),
        Probe::Unknown => format_from_extension(path)
            .ok_or_else(|| PipelineError::Unreadable(path.to_path_buf()))?,
    };
    debug!(path = %path.display(), %format, "input validated");
    Ok(format)
}

/// Serializable validation outcome: `{"valid": true}` or `{"valid": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Result<T, PipelineError>> for ValidationReport {
    fn from(result: Result<T, PipelineError>) -> Self {
        match result {
            Ok(_) => Self {
                valid: true,
                error: None,
            },
            Err(err) => Self {
                valid: false,
                error: Some(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_FILE_SIZE;
    use crate::test_helpers::create_test_png;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_found() {
        let err = validate_input_file(Path::new("/no/such/photo.jpg"), DEFAULT_MAX_FILE_SIZE)
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn directory_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = validate_input_file(tmp.path(), DEFAULT_MAX_FILE_SIZE).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn oversized_file_is_rejected_before_probing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.png");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let err = validate_input_file(&path, 1024).unwrap_err();
        assert_eq!(
            err,
            PipelineError::TooLarge {
                size: 2048,
                limit: 1024
            }
        );
    }

    #[test]
    fn header_beats_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.dat");
        create_test_png(&path, 20, 10);

        assert_eq!(
            validate_input_file(&path, DEFAULT_MAX_FILE_SIZE),
            Ok(SourceFormat::Png)
        );
    }

    #[test]
    fn recognized_but_unsupported_format() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.png");
        let mut bytes = b"BM".to_vec();
        bytes.extend_from_slice(&[0u8; 62]);
        std::fs::write(&path, bytes).unwrap();

        let err = validate_input_file(&path, DEFAULT_MAX_FILE_SIZE).unwrap_err();
        assert_eq!(err, PipelineError::UnsupportedFormat("bmp".into()));
    }

    #[test]
    fn unknown_header_falls_back_to_extension() {
        let tmp = TempDir::new().unwrap();
        let jpg = tmp.path().join("scan.JPG");
        std::fs::write(&jpg, b"not really an image").unwrap();
        assert_eq!(
            validate_input_file(&jpg, DEFAULT_MAX_FILE_SIZE),
            Ok(SourceFormat::Jpeg)
        );

        let gif = tmp.path().join("scan.gif");
        std::fs::write(&gif, b"not really an image").unwrap();
        assert!(matches!(
            validate_input_file(&gif, DEFAULT_MAX_FILE_SIZE),
            Err(PipelineError::Unreadable(_))
        ));
    }

    #[test]
    fn report_shapes() {
        let ok: ValidationReport = Ok::<_, PipelineError>(SourceFormat::Png).into();
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"valid":true}"#);

        let bad: ValidationReport =
            Err::<SourceFormat, _>(PipelineError::NotFound("/x.jpg".into())).into();
        assert!(!bad.valid);
        assert_eq!(bad.error.as_deref(), Some("File not found: /x.jpg"));
    }
}
