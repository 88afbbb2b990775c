//! # Retouch
//!
//! A deterministic photo restoration pipeline. Give it a scan or an old
//! photo and it validates the file, then enhances, upscales, denoises,
//! color-balances, converts or thumbnails it into a new output path. The
//! source is never modified.
//!
//! # Architecture: Validate, Normalize, Transform
//!
//! Every call follows the same three steps:
//!
//! ```text
//! 1. Validate    path         →  SourceFormat      (existence, size, header probe)
//! 2. Normalize   RawOptions   →  *Settings         (defaults filled, ranges clamped)
//! 3. Transform   Settings     →  Outcome           (plan backend params, one backend call)
//! ```
//!
//! Restoration is the one composite operation: an upscale into an
//! intermediate file followed by an enhance into the final output, with the
//! intermediate removed on every exit path.
//!
//! Errors propagate internally as `Result<_, PipelineError>` and become a
//! serializable [`types::ResultRecord`] only at the [`pipeline::Pipeline`]
//! boundary. Nothing crosses that boundary as a panic or an `Err`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | The public boundary: one method per operation, each returning a record |
//! | [`validate`] | Input checks run before anything is written |
//! | [`normalize`] | Raw caller options → typed, clamped settings per operation |
//! | [`operation`] | Enum dispatch over the single-operation transformers |
//! | [`restore`] | Two-stage restoration with scoped intermediate cleanup |
//! | [`imaging`] | Pure-Rust pixel work: probe, decode, resample, filter, encode |
//! | [`presets`] | Suggested restore settings from image size and use case |
//! | [`config`] | `retouch.toml` loading over stock defaults, validation |
//! | [`types`] | Shared records and the error taxonomy |
//! | [`naming`] | Output path derivation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Backend Behind a Trait
//!
//! Transformers never touch pixels themselves. They compute a
//! [`ResizeParams`](imaging::params::ResizeParams) or
//! [`AdjustParams`](imaging::params::AdjustParams) and hand it to an
//! [`ImageBackend`](imaging::ImageBackend). Planning is pure and tested
//! against a recording mock; the production [`RustBackend`](imaging::RustBackend)
//! is tested separately against real files.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding use the `image` crate, AVIF decoding uses `rav1d`,
//! median filtering uses `imageproc`. There are no system libraries to
//! install, so the binary runs anywhere it is copied.
//!
//! ## Header Over Extension
//!
//! The validator trusts magic bytes. A PNG named `photo.dat` is accepted; the
//! extension only matters when the header is not recognized at all.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod normalize;
pub mod operation;
pub mod output;
pub mod pipeline;
pub mod presets;
pub mod restore;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
