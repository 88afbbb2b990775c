//! Shared fixtures for unit tests: small synthetic images written to disk.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = tmp.path().join("photo.png");
//! create_test_png(&path, 400, 300);
//! ```

use image::{ImageBuffer, Luma, Rgb, RgbImage};
use std::path::Path;

/// RGB gradient so resamplers and filters have something to work on.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            128,
        ])
    })
}

pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

pub fn create_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Single-value grayscale PNG.
pub fn create_uniform_png(path: &Path, width: u32, height: u32, value: u8) {
    ImageBuffer::from_pixel(width, height, Luma([value]))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}
