//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three primitives every transformer
//! is built from: identify, resize (then adjust), and adjust. Transformers in
//! [`operations`](super::operations) only plan parameters and call these.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` and
//! `imageproc` crates. Everything is statically linked into the binary.

use super::params::{AdjustParams, ResizeParams};
use crate::types::ImageInfo;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Implementations must be read-only on `source` and write only to `output`.
/// Each call opens the source afresh; nothing is cached between calls.
pub trait ImageBackend: Sync {
    /// Read format, dimensions and color layout without decoding pixels where possible.
    fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError>;

    /// Resize to exact dimensions, apply adjustments, encode. Returns the
    /// dimensions written.
    fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError>;

    /// Apply adjustments at the original size and encode. Returns the
    /// dimensions written.
    fn adjust(&self, params: &AdjustParams) -> Result<Dimensions, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::format::SourceFormat;
    use crate::imaging::params::{Adjustment, Encoding, Quality, ResampleKernel};
    use crate::imaging::format::OutputFormat;
    use std::sync::Mutex;

    /// Mock backend that records operations without decoding anything.
    /// Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<ImageInfo>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Write an empty file at every output path, like a real encoder would.
        pub touch_outputs: bool,
        /// Fail the named primitive (`"resize"` or `"adjust"`) after recording it.
        pub fail_on: Option<&'static str>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            kernel: ResampleKernel,
            adjustments: Vec<Adjustment>,
            encoding: Encoding,
        },
        Adjust {
            source: String,
            output: String,
            adjustments: Vec<Adjustment>,
            encoding: Encoding,
        },
    }

    /// Info for a plain RGB image of the given format and size.
    pub fn info(format: SourceFormat, width: u32, height: u32) -> ImageInfo {
        ImageInfo {
            width,
            height,
            format,
            channels: 3,
            has_alpha: false,
            colorspace: "srgb".to_string(),
            file_size_bytes: 1024,
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Results are popped from the end, so list them in reverse call order.
        pub fn with_infos(infos: Vec<ImageInfo>) -> Self {
            Self {
                identify_results: Mutex::new(infos),
                ..Self::default()
            }
        }

        pub fn touching_outputs(mut self) -> Self {
            self.touch_outputs = true;
            self
        }

        pub fn failing_on(mut self, primitive: &'static str) -> Self {
            self.fail_on = Some(primitive);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn finish(&self, primitive: &str, output: &Path) -> Result<(), BackendError> {
            if self.touch_outputs {
                std::fs::write(output, b"")?;
            }
            if self.fail_on == Some(primitive) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock {primitive} failure"
                )));
            }
            Ok(())
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock image info".to_string()))
        }

        fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                kernel: params.kernel,
                adjustments: params.adjustments.clone(),
                encoding: params.encoding,
            });
            self.finish("resize", &params.output)?;
            Ok(Dimensions {
                width: params.width,
                height: params.height,
            })
        }

        fn adjust(&self, params: &AdjustParams) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Adjust {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                adjustments: params.adjustments.clone(),
                encoding: params.encoding,
            });
            self.finish("adjust", &params.output)?;
            Ok(Dimensions {
                width: 0,
                height: 0,
            })
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_infos(vec![info(SourceFormat::Jpeg, 800, 600)]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_identify_without_results_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/x.png")).is_err());
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();

        let dims = backend
            .resize(&ResizeParams {
                source: "/source.jpg".into(),
                output: "/output.jpg".into(),
                width: 800,
                height: 600,
                kernel: ResampleKernel::Lanczos3,
                adjustments: vec![],
                encoding: Encoding {
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(95),
                },
            })
            .unwrap();
        assert_eq!(dims.to_string(), "800x600");

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 800,
                height: 600,
                kernel: ResampleKernel::Lanczos3,
                ..
            }
        ));
    }

    #[test]
    fn mock_failure_still_touches_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.png");
        let backend = MockBackend::new().touching_outputs().failing_on("adjust");

        let result = backend.adjust(&AdjustParams {
            source: "/source.png".into(),
            output: output.clone(),
            adjustments: vec![],
            encoding: Encoding {
                format: OutputFormat::Png,
                quality: Quality::default(),
            },
        });

        assert!(result.is_err());
        assert!(output.exists());
    }

    #[test]
    fn dimensions_display() {
        let dims: Dimensions = (400, 300).into();
        assert_eq!(dims.to_string(), "400x300");
    }
}
