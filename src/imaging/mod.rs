//! Image processing: pure Rust, no system libraries.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | **Probe** | magic bytes, extension fallback ([`format`]) |
//! | **Decode** | `image` readers, `rav1d` for AVIF |
//! | **Resample** | `resize_exact` with a chosen [`ResampleKernel`](params::ResampleKernel) |
//! | **Tone / color / sharpen** | lookup tables + `imageops::unsharpen` ([`adjust`]) |
//! | **Median** | `imageproc::filter::median_filter` |
//! | **Encode** | JPEG, PNG, WebP (lossless), AVIF, TIFF, GIF |
//!
//! The module is split into:
//! - **Calculations**: pure functions for dimension and tone math (unit testable)
//! - **Parameters**: data structures describing what a backend call should do
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: the transformers, which plan parameters and call a backend

pub mod adjust;
pub mod backend;
pub mod calculations;
pub mod codec;
pub mod format;
pub mod operations;
pub mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use rust_backend::RustBackend;
