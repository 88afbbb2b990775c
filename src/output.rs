//! CLI output formatting.
//!
//! Every record has a one-line headline followed by indented context lines,
//! so a run over several files reads as an inventory:
//!
//! ## Operation result
//!
//! ```text
//! Image upscaled from 400x300 to 800x600 (2.0x)
//!     Output: scans/photo_upscale.jpg
//!     Size: 400x300 → 800x600
//!     Scale: 2.0x
//! ```
//!
//! ## Image info
//!
//! ```text
//! scans/photo.jpg
//!     Format: jpeg
//!     Dimensions: 400x300
//!     Channels: 3
//!     Colorspace: srgb
//!     File size: 48.2 KB
//! ```
//!
//! ## Optimal settings
//!
//! ```text
//! Optimal settings for 400x300 (0.12 MP, general)
//!     Scale: 2.0x
//!     Sharpen: yes
//!     Denoise: yes
//!     Quality: 95
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and is pure; the `print_*`
//! wrappers write to stdout. `--json` output bypasses this module and prints
//! the serialized record instead.

use crate::imaging::calculations::format_scale_factor;
use crate::presets::ParameterPreset;
use crate::types::{InfoRecord, ResultRecord};
use crate::validate::ValidationReport;
use std::path::Path;

fn indent(line: impl AsRef<str>) -> String {
    format!("    {}", line.as_ref())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Byte count with a binary-prefixed unit, one decimal above 1 KB.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

// ============================================================================
// Operation results
// ============================================================================

pub fn format_result(record: &ResultRecord) -> Vec<String> {
    match record {
        ResultRecord::Success(outcome) => {
            let mut lines = vec![
                outcome.message.clone(),
                indent(format!("Output: {}", outcome.output_path.display())),
            ];
            if let Some(resize) = &outcome.resize {
                lines.push(indent(format!("Size: {} → {}", resize.original, resize.new)));
                if let Some(scale) = resize.scale_factor {
                    lines.push(indent(format!("Scale: {}", format_scale_factor(scale))));
                }
            }
            lines
        }
        ResultRecord::Failure(err) => vec![format!("Error: {err}")],
    }
}

pub fn print_result(record: &ResultRecord) {
    for line in format_result(record) {
        println!("{}", line);
    }
}

// ============================================================================
// Info and validation
// ============================================================================

pub fn format_info(path: &Path, record: &InfoRecord) -> Vec<String> {
    match record {
        InfoRecord::Success(info) => {
            let alpha = if info.has_alpha { " (with alpha)" } else { "" };
            vec![
                path.display().to_string(),
                indent(format!("Format: {}", info.format)),
                indent(format!("Dimensions: {}", info.dimensions())),
                indent(format!("Channels: {}{alpha}", info.channels)),
                indent(format!("Colorspace: {}", info.colorspace)),
                indent(format!("File size: {}", human_size(info.file_size_bytes))),
            ]
        }
        InfoRecord::Failure(err) => vec![path.display().to_string(), indent(format!("Error: {err}"))],
    }
}

pub fn print_info(path: &Path, record: &InfoRecord) {
    for line in format_info(path, record) {
        println!("{}", line);
    }
}

pub fn format_validation(path: &Path, report: &ValidationReport) -> Vec<String> {
    match &report.error {
        None => vec![format!("{}: valid", path.display())],
        Some(error) => vec![format!("{}: invalid", path.display()), indent(error)],
    }
}

pub fn print_validation(path: &Path, report: &ValidationReport) {
    for line in format_validation(path, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Presets
// ============================================================================

pub fn format_preset(width: u32, height: u32, preset: &ParameterPreset) -> Vec<String> {
    vec![
        format!(
            "Optimal settings for {width}x{height} ({:.2} MP, {})",
            preset.megapixels, preset.use_case
        ),
        indent(format!("Scale: {}", format_scale_factor(preset.scale))),
        indent(format!("Sharpen: {}", yes_no(preset.sharpen))),
        indent(format!("Denoise: {}", yes_no(preset.denoise))),
        indent(format!("Quality: {}", preset.quality)),
    ]
}

pub fn print_preset(width: u32, height: u32, preset: &ParameterPreset) {
    for line in format_preset(width, height, preset) {
        println!("{}", line);
    }
}
