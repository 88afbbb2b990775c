//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Primitive | Crate / function |
//! |---|---|
//! | Identify | [`codec::read_info`](super::codec::read_info) |
//! | Decode / encode | [`codec`](super::codec) (`image`, `avif-parse`, `rav1d`) |
//! | Resize | `DynamicImage::resize_exact` with the requested kernel |
//! | Tone steps | lookup tables in [`adjust`](super::adjust) |
//! | Sharpen / blur | `image::imageops::unsharpen`, `image::imageops::blur` |
//! | Median | `imageproc::filter::median_filter` |

use super::adjust::apply_adjustments;
use super::backend::{BackendError, Dimensions, ImageBackend};
use super::codec::{load_image, read_info, save_image};
use super::params::{AdjustParams, ResizeParams};
use crate::types::ImageInfo;
use std::path::Path;
use tracing::debug;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-primitive mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        read_info(path)
    }

    fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        debug!(
            source = %params.source.display(),
            from = %Dimensions::from((img.width(), img.height())),
            to = %Dimensions::from((params.width, params.height)),
            kernel = %params.kernel,
            "resizing"
        );
        let resized = img.resize_exact(params.width, params.height, params.kernel.filter());
        let adjusted = apply_adjustments(resized, &params.adjustments);
        save_image(&adjusted, &params.output, params.encoding)?;
        Ok(Dimensions {
            width: adjusted.width(),
            height: adjusted.height(),
        })
    }

    fn adjust(&self, params: &AdjustParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        debug!(
            source = %params.source.display(),
            steps = params.adjustments.len(),
            format = %params.encoding.format,
            "adjusting"
        );
        let adjusted = apply_adjustments(img, &params.adjustments);
        save_image(&adjusted, &params.output, params.encoding)?;
        Ok(Dimensions {
            width: adjusted.width(),
            height: adjusted.height(),
        })
    }
}
