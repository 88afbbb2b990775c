//! Output path naming.
//!
//! Derived paths stay next to their input:
//! - `generate_output_path("/a/photo.jpg", "_enhanced")` → `/a/photo_enhanced.jpg`
//! - `with_format_extension("/a/photo_convert.jpg", Webp)` → `/a/photo_convert.webp`

use crate::imaging::format::OutputFormat;
use std::path::{Path, PathBuf};

/// Same directory, same extension, `suffix` appended to the file stem.
///
/// Deterministic: the same input and suffix always give the same path. A
/// dotfile such as `.hidden` keeps its name as the stem.
pub fn generate_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    input.with_file_name(name)
}

/// Replace the extension with the canonical one for `format`.
pub fn with_format_extension(path: &Path, format: OutputFormat) -> PathBuf {
    path.with_extension(format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(
            generate_output_path(Path::new("/photos/beach.jpg"), "_enhanced"),
            PathBuf::from("/photos/beach_enhanced.jpg")
        );
    }

    #[test]
    fn only_last_extension_is_kept_after_suffix() {
        assert_eq!(
            generate_output_path(Path::new("/photos/archive.tar.png"), "_x"),
            PathBuf::from("/photos/archive.tar_x.png")
        );
    }

    #[test]
    fn no_extension() {
        assert_eq!(
            generate_output_path(Path::new("scan"), "_restored"),
            PathBuf::from("scan_restored")
        );
    }

    #[test]
    fn relative_path_stays_relative() {
        assert_eq!(
            generate_output_path(Path::new("in/a.PNG"), "_thumb"),
            PathBuf::from("in/a_thumb.PNG")
        );
    }

    #[test]
    fn deterministic() {
        let input = Path::new("/x/y.webp");
        assert_eq!(
            generate_output_path(input, "_s"),
            generate_output_path(input, "_s")
        );
    }

    #[test]
    fn format_extension_swap() {
        assert_eq!(
            with_format_extension(Path::new("/a/photo_convert.png"), OutputFormat::Jpeg),
            PathBuf::from("/a/photo_convert.jpg")
        );
        assert_eq!(
            with_format_extension(Path::new("/a/photo"), OutputFormat::WebP),
            PathBuf::from("/a/photo.webp")
        );
    }
}
