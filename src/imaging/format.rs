//! Container formats: what we accept, what we write, and how we tell them apart.
//!
//! Source formats are identified from the file header, never from the name.
//! Most formats are recognized by `image::guess_format`; the ISO-BMFF family
//! (AVIF, HEIF) shares the `ftyp` box, so those are told apart by brand.
//!
//! | Format | Probed | Extension fallback | Decoded | Written |
//! |---|---|---|---|---|
//! | JPEG | yes | `jpg`, `jpeg` | yes | yes |
//! | PNG | yes | `png` | yes | yes |
//! | WebP | yes | `webp` | yes | yes (lossless) |
//! | TIFF | yes | `tif`, `tiff` | yes | yes |
//! | GIF | yes | no | yes | yes |
//! | AVIF | yes | `avif` | yes (rav1d) | yes (rav1e) |
//! | HEIF | yes | no | no | no |

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Number of header bytes read when probing a file.
pub const PROBE_LEN: usize = 64;

const AVIF_BRANDS: [&[u8]; 2] = [b"avif", b"avis"];
const HEIF_BRANDS: [&[u8]; 6] = [b"heic", b"heix", b"hevc", b"hevx", b"mif1", b"msf1"];

/// Extensions consulted only when the header is not recognized.
///
/// GIF and HEIF are absent: a GIF always carries its magic bytes, and a HEIF
/// that cannot be identified by brand cannot be decoded either.
const EXTENSION_FALLBACK: &[(&str, SourceFormat)] = &[
    ("jpg", SourceFormat::Jpeg),
    ("jpeg", SourceFormat::Jpeg),
    ("png", SourceFormat::Png),
    ("webp", SourceFormat::WebP),
    ("tif", SourceFormat::Tiff),
    ("tiff", SourceFormat::Tiff),
    ("avif", SourceFormat::Avif),
];

/// A container format accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
    Gif,
    Avif,
    Heif,
}

impl SourceFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
            Self::Avif => "avif",
            Self::Heif => "heif",
        }
    }

    /// Canonical file extension, used when naming intermediate artifacts.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Heif => "heic",
            other => other.name(),
        }
    }

    /// The encoder that writes this container, if one is compiled in.
    pub fn output_format(self) -> Option<OutputFormat> {
        match self {
            Self::Jpeg => Some(OutputFormat::Jpeg),
            Self::Png => Some(OutputFormat::Png),
            Self::WebP => Some(OutputFormat::WebP),
            Self::Tiff => Some(OutputFormat::Tiff),
            Self::Gif => Some(OutputFormat::Gif),
            Self::Avif => Some(OutputFormat::Avif),
            Self::Heif => None,
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Tiff => Some(Self::Tiff),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Avif => Some(Self::Avif),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A container format we can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
    Gif,
    Avif,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
            Self::Avif => "avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            other => other.name(),
        }
    }

    /// Parse an explicit conversion target. Only JPEG, PNG, WebP and AVIF are
    /// valid targets; TIFF and GIF are written only to preserve a source format.
    pub fn parse_target(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the header of a file says about its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// One of the accepted source formats.
    Supported(SourceFormat),
    /// A recognized image format outside the accepted set (e.g. `"bmp"`).
    Unsupported(String),
    /// Nothing recognizable in the header.
    Unknown,
}

/// Identify a format from the leading bytes of a file.
pub fn probe_header(bytes: &[u8]) -> Probe {
    if let Some(format) = probe_ftyp(bytes) {
        return Probe::Supported(format);
    }
    match image::guess_format(bytes) {
        Ok(format) => match SourceFormat::from_image_format(format) {
            Some(source) => Probe::Supported(source),
            None => Probe::Unsupported(
                format
                    .extensions_str()
                    .first()
                    .map(|ext| ext.to_string())
                    .unwrap_or_else(|| format!("{format:?}").to_lowercase()),
            ),
        },
        Err(_) => Probe::Unknown,
    }
}

/// Read the first [`PROBE_LEN`] bytes of `path` and probe them.
pub fn probe_file(path: &Path) -> std::io::Result<Probe> {
    let mut header = Vec::with_capacity(PROBE_LEN);
    std::fs::File::open(path)?
        .take(PROBE_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(probe_header(&header))
}

/// Look up the extension fallback table (case-insensitive).
pub fn format_from_extension(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?;
    EXTENSION_FALLBACK
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
}

/// Extensions the fallback table accepts.
pub fn fallback_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSION_FALLBACK.iter().map(|(ext, _)| *ext)
}

/// Classify an ISO-BMFF `ftyp` box by its major and compatible brands.
/// AVIF wins over HEIF because AVIF files commonly also list `mif1`.
fn probe_ftyp(bytes: &[u8]) -> Option<SourceFormat> {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return None;
    }
    let box_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let end = box_len.min(bytes.len());

    let mut brands: Vec<&[u8]> = vec![&bytes[8..12]];
    let mut offset = 16;
    while offset + 4 <= end {
        brands.push(&bytes[offset..offset + 4]);
        offset += 4;
    }

    if brands.iter().any(|brand| AVIF_BRANDS.contains(brand)) {
        Some(SourceFormat::Avif)
    } else if brands.iter().any(|brand| HEIF_BRANDS.contains(brand)) {
        Some(SourceFormat::Heif)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ftyp(major: &[u8; 4], compatible: &[&[u8; 4]]) -> Vec<u8> {
        let len = 16 + 4 * compatible.len();
        let mut bytes = (len as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(major);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        for brand in compatible {
            bytes.extend_from_slice(*brand);
        }
        bytes
    }

    #[test]
    fn probes_png_magic() {
        let header = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(probe_header(header), Probe::Supported(SourceFormat::Png));
    }

    #[test]
    fn probes_jpeg_magic() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];
        assert_eq!(probe_header(&header), Probe::Supported(SourceFormat::Jpeg));
    }

    #[test]
    fn probes_gif_magic() {
        assert_eq!(
            probe_header(b"GIF89a\x01\x00\x01\x00"),
            Probe::Supported(SourceFormat::Gif)
        );
    }

    #[test]
    fn bmp_is_recognized_but_unsupported() {
        let header = b"BM\x3a\0\0\0\0\0\0\0\x36\0\0\0";
        assert_eq!(probe_header(header), Probe::Unsupported("bmp".into()));
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(probe_header(b"hello, world"), Probe::Unknown);
        assert_eq!(probe_header(b""), Probe::Unknown);
    }

    #[test]
    fn avif_brand_beats_mif1() {
        let header = ftyp(b"mif1", &[b"avif", b"miaf"]);
        assert_eq!(probe_header(&header), Probe::Supported(SourceFormat::Avif));
    }

    #[test]
    fn heic_major_brand_is_heif() {
        let header = ftyp(b"heic", &[b"mif1", b"heic"]);
        assert_eq!(probe_header(&header), Probe::Supported(SourceFormat::Heif));
    }

    #[test]
    fn unrelated_ftyp_is_unknown() {
        let header = ftyp(b"isom", &[b"iso2", b"mp41"]);
        assert_eq!(probe_ftyp(&header), None);
    }

    #[test]
    fn extension_fallback_is_case_insensitive() {
        assert_eq!(
            format_from_extension(Path::new("/a/photo.JPG")),
            Some(SourceFormat::Jpeg)
        );
        assert_eq!(
            format_from_extension(Path::new("scan.tif")),
            Some(SourceFormat::Tiff)
        );
    }

    #[test]
    fn extension_fallback_excludes_gif_and_heif() {
        assert_eq!(format_from_extension(Path::new("a.gif")), None);
        assert_eq!(format_from_extension(Path::new("a.heic")), None);
        assert_eq!(format_from_extension(Path::new("noext")), None);
        assert!(!fallback_extensions().any(|e| e == "gif"));
    }

    #[test]
    fn parse_target_accepts_only_convert_targets() {
        assert_eq!(OutputFormat::parse_target("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse_target("webp"), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::parse_target(" avif "), Some(OutputFormat::Avif));
        assert_eq!(OutputFormat::parse_target("bmp"), None);
        assert_eq!(OutputFormat::parse_target("tiff"), None);
    }

    #[test]
    fn heif_has_no_encoder() {
        assert_eq!(SourceFormat::Heif.output_format(), None);
        assert_eq!(SourceFormat::Jpeg.output_format(), Some(OutputFormat::Jpeg));
        assert_eq!(SourceFormat::Jpeg.extension(), "jpg");
    }
}
