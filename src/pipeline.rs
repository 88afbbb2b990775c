//! The library boundary.
//!
//! A [`Pipeline`] pairs a backend with an [`EngineConfig`] and exposes every
//! operation as a method returning a serializable record. Nothing crosses this
//! boundary as an `Err` or a panic: validation failures, unsupported targets
//! and codec errors all come back as `{"success": false, "error": ...}`.
//!
//! Every operation validates its input before anything is written, so a
//! rejected source never leaves a partial output behind.
//!
//! ```no_run
//! use retouch::config::EngineConfig;
//! use retouch::normalize::RawOptions;
//! use retouch::pipeline::Pipeline;
//! use std::path::Path;
//!
//! let pipeline = Pipeline::new(EngineConfig::default());
//! let record = pipeline.upscale_image(
//!     Path::new("scan.jpg"),
//!     Path::new("scan_upscaled.jpg"),
//!     &RawOptions { scale: Some(2.0), ..RawOptions::default() },
//! );
//! println!("{}", serde_json::to_string(&record).unwrap());
//! ```

use crate::config::EngineConfig;
use crate::imaging::operations::image_info;
use crate::imaging::{ImageBackend, RustBackend};
use crate::normalize::RawOptions;
use crate::operation::{Operation, OperationKind};
use crate::restore;
use crate::types::{InfoRecord, PipelineError, ResultRecord};
use crate::validate::{self, ValidationReport};
use std::path::Path;
use tracing::{info, warn};

pub struct Pipeline<B: ImageBackend = RustBackend> {
    backend: B,
    config: EngineConfig,
}

impl Pipeline<RustBackend> {
    /// Pipeline on the pure-Rust backend.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl<B: ImageBackend> Pipeline<B> {
    pub fn with_backend(backend: B, config: EngineConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validate_input_file(&self, path: &Path) -> ValidationReport {
        validate::validate_input_file(path, self.config.limits.max_file_size_bytes).into()
    }

    pub fn get_image_info(&self, path: &Path) -> InfoRecord {
        validate::validate_input_file(path, self.config.limits.max_file_size_bytes)
            .and_then(|_| image_info(&self.backend, path))
            .into()
    }

    /// Upscale then enhance, or enhance alone when the requested scale is ≤ 1.
    pub fn restore_image(&self, input: &Path, output: &Path, raw: &RawOptions) -> ResultRecord {
        let result = restore::restore_image(&self.backend, &self.config, input, output, raw);
        log_result("restore", &result);
        result.into()
    }

    pub fn enhance_image(&self, input: &Path, output: &Path, raw: &RawOptions) -> ResultRecord {
        self.apply(OperationKind::Enhance, input, output, raw)
    }

    pub fn upscale_image(&self, input: &Path, output: &Path, raw: &RawOptions) -> ResultRecord {
        self.apply(OperationKind::Upscale, input, output, raw)
    }

    pub fn remove_noise(&self, input: &Path, output: &Path, raw: &RawOptions) -> ResultRecord {
        self.apply(OperationKind::Denoise, input, output, raw)
    }

    pub fn adjust_color_balance(
        &self,
        input: &Path,
        output: &Path,
        raw: &RawOptions,
    ) -> ResultRecord {
        self.apply(OperationKind::ColorBalance, input, output, raw)
    }

    pub fn convert_format(&self, input: &Path, output: &Path, raw: &RawOptions) -> ResultRecord {
        self.apply(OperationKind::Convert, input, output, raw)
    }

    pub fn create_thumbnail(&self, input: &Path, output: &Path, raw: &RawOptions) -> ResultRecord {
        self.apply(OperationKind::Thumbnail, input, output, raw)
    }

    /// Validate, normalize with the transformer's defaults, run it.
    pub fn apply(
        &self,
        kind: OperationKind,
        input: &Path,
        output: &Path,
        raw: &RawOptions,
    ) -> ResultRecord {
        let result = validate::validate_input_file(input, self.config.limits.max_file_size_bytes)
            .and_then(|_| {
                Operation::normalize(kind, raw, &self.config).apply(&self.backend, input, output)
            });
        log_result(kind.name(), &result);
        result.into()
    }
}

fn log_result<T>(operation: &str, result: &Result<T, PipelineError>) {
    match result {
        Ok(_) => info!(operation, "operation succeeded"),
        Err(e) => warn!(operation, error = %e, "operation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, info};
    use crate::imaging::format::SourceFormat;
    use crate::test_helpers::create_test_png;
    use tempfile::TempDir;

    fn mock_pipeline(backend: MockBackend) -> Pipeline<MockBackend> {
        Pipeline::with_backend(backend, EngineConfig::default())
    }

    /// A real PNG on disk so validation passes; the mock does the processing.
    fn source_png(tmp: &TempDir) -> std::path::PathBuf {
        let path = tmp.path().join("photo.png");
        create_test_png(&path, 40, 30);
        path
    }

    #[test]
    fn missing_input_is_reported_not_raised() {
        let pipeline = mock_pipeline(MockBackend::new());
        assert_eq!(pipeline.config(), &EngineConfig::default());
        let missing = Path::new("/no/such/photo.jpg");

        assert!(!pipeline.validate_input_file(missing).valid);
        assert!(matches!(
            pipeline.get_image_info(missing),
            InfoRecord::Failure(PipelineError::NotFound(_))
        ));

        let record =
            pipeline.enhance_image(missing, Path::new("/tmp/out.jpg"), &RawOptions::default());
        assert!(matches!(record, ResultRecord::Failure(PipelineError::NotFound(_))));
        assert!(pipeline.backend.get_operations().is_empty());
    }

    #[test]
    fn image_info_comes_from_backend_after_validation() {
        let tmp = TempDir::new().unwrap();
        let source = source_png(&tmp);
        let pipeline = mock_pipeline(MockBackend::with_infos(vec![info(SourceFormat::Png, 40, 30)]));

        match pipeline.get_image_info(&source) {
            InfoRecord::Success(info) => assert_eq!((info.width, info.height), (40, 30)),
            other => panic!("expected info, got {other:?}"),
        }
    }

    #[test]
    fn each_method_routes_to_its_transformer() {
        let tmp = TempDir::new().unwrap();
        let source = source_png(&tmp);
        let output = tmp.path().join("out.png");
        let raw = RawOptions::default();

        type Mocked = Pipeline<MockBackend>;
        type Method = fn(&Mocked, &Path, &Path, &RawOptions) -> ResultRecord;
        let cases: [(Method, &str, bool); 6] = [
            (Mocked::enhance_image, "Image enhanced", false),
            (Mocked::upscale_image, "Image upscaled", true),
            (Mocked::remove_noise, "Noise removed", false),
            (Mocked::adjust_color_balance, "Color balance adjusted", false),
            (Mocked::convert_format, "Image converted", false),
            (Mocked::create_thumbnail, "Thumbnail created", true),
        ];

        for (method, prefix, resizes) in cases {
            let pipeline =
                mock_pipeline(MockBackend::with_infos(vec![info(SourceFormat::Png, 40, 30)]));
            let record = method(&pipeline, &source, &output, &raw);

            let outcome = record.outcome().unwrap_or_else(|| panic!("{prefix}: {record:?}"));
            assert!(outcome.message.starts_with(prefix), "{}", outcome.message);
            let ops = pipeline.backend.get_operations();
            assert_eq!(matches!(ops.last(), Some(RecordedOp::Resize { .. })), resizes);
        }
    }

    #[test]
    fn backend_failure_becomes_failure_record() {
        let tmp = TempDir::new().unwrap();
        let source = source_png(&tmp);
        let pipeline = mock_pipeline(
            MockBackend::with_infos(vec![info(SourceFormat::Png, 40, 30)]).failing_on("adjust"),
        );

        let record = pipeline.remove_noise(&source, &tmp.path().join("o.png"), &RawOptions::default());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Processing failed: mock adjust failure");
    }

    #[test]
    fn unsupported_convert_target_fails_before_backend() {
        let tmp = TempDir::new().unwrap();
        let source = source_png(&tmp);
        let pipeline = mock_pipeline(MockBackend::new());

        let record = pipeline.convert_format(
            &source,
            &tmp.path().join("o.bmp"),
            &RawOptions {
                format: Some("bmp".into()),
                ..RawOptions::default()
            },
        );

        assert!(matches!(
            record,
            ResultRecord::Failure(PipelineError::UnsupportedTargetFormat(_))
        ));
        assert!(pipeline.backend.get_operations().is_empty());
    }

    #[test]
    fn restore_goes_through_orchestrator() {
        let tmp = TempDir::new().unwrap();
        let source = source_png(&tmp);
        let pipeline = mock_pipeline(
            MockBackend::with_infos(vec![
                info(SourceFormat::Png, 60, 45),
                info(SourceFormat::Png, 40, 30),
            ])
            .touching_outputs(),
        );

        let record = pipeline.restore_image(
            &source,
            &tmp.path().join("photo_restored.png"),
            &RawOptions::default(),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["originalSize"], "40x30");
        assert_eq!(json["newSize"], "60x45");
        let leftovers = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("_temp_upscaled"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
