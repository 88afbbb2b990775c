//! Decoding, encoding and metadata reads.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image::ImageReader` with header-guessed format |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1 decode) + BT.601 YUV→RGB |
//! | Identify | `image::ImageDecoder` header read; `avif-parse` metadata for AVIF |
//! | Encode JPEG / PNG / WebP | `JpegEncoder` (quality), `PngEncoder` (adaptive filter), `WebPEncoder` (lossless) |
//! | Encode AVIF | `AvifEncoder` (rav1e, speed 6) |
//! | Encode TIFF / GIF | `DynamicImage::write_to` |
//!
//! HEIF is recognized by the prober but no decoder is compiled in, so every
//! attempt to read its pixels fails with a processing error.

use super::backend::BackendError;
use super::format::{OutputFormat, Probe, SourceFormat, format_from_extension, probe_file};
use super::params::Encoding;
use crate::types::ImageInfo;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Resolve the container format of a file from its header, falling back to
/// the extension table when the header says nothing.
pub fn source_format(path: &Path) -> Result<SourceFormat, BackendError> {
    match probe_file(path)? {
        Probe::Supported(format) => Ok(format),
        Probe::Unsupported(name) => Err(BackendError::ProcessingFailed(format!(
            "Unsupported image format: {name}"
        ))),
        Probe::Unknown => format_from_extension(path).ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Unrecognized image data: {}", path.display()))
        }),
    }
}

fn heif_unsupported(path: &Path) -> BackendError {
    BackendError::ProcessingFailed(format!(
        "HEIF decoding is not available: {}",
        path.display()
    ))
}

/// Load and decode an image from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    match source_format(path)? {
        SourceFormat::Avif => decode_avif(path),
        SourceFormat::Heif => Err(heif_unsupported(path)),
        _ => ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            }),
    }
}

/// Read format, dimensions and color layout. Only the header is decoded.
pub fn read_info(path: &Path) -> Result<ImageInfo, BackendError> {
    let file_size_bytes = std::fs::metadata(path)?.len();
    let format = source_format(path)?;

    let (width, height, color) = match format {
        SourceFormat::Avif => identify_avif(path)?,
        SourceFormat::Heif => return Err(heif_unsupported(path)),
        _ => {
            let decoder = ImageReader::open(path)?
                .with_guessed_format()?
                .into_decoder()
                .map_err(|e| {
                    BackendError::ProcessingFailed(format!(
                        "Failed to read header of {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            let (width, height) = decoder.dimensions();
            (width, height, decoder.color_type())
        }
    };

    Ok(ImageInfo {
        width,
        height,
        format,
        channels: color.channel_count(),
        has_alpha: color.has_alpha(),
        colorspace: if color.has_color() { "srgb" } else { "b-w" }.to_string(),
        file_size_bytes,
    })
}

/// Dimensions and an equivalent color type from AVIF container metadata.
fn identify_avif(path: &Path) -> Result<(u32, u32, ColorType), BackendError> {
    let file_data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    let color = if avif.alpha_item.is_some() {
        ColorType::Rgba8
    } else {
        ColorType::Rgb8
    };
    Ok((
        meta.max_frame_width.get(),
        meta.max_frame_height.get(),
        color,
    ))
}

/// Decode the primary item of an AVIF file with rav1d.
///
/// The `image` crate's `"avif"` feature only provides the encoder; its decoder
/// needs the C library dav1d, so the pure Rust port is driven directly here.
/// The alpha item, if any, is not decoded.
fn decode_avif(path: &Path) -> Result<DynamicImage, BackendError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use rav1d::src::lib as dav1d;
    use std::mem::MaybeUninit;
    use std::ptr::NonNull;

    let file_data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })?;
    let av1_bytes: &[u8] = &avif.primary_item;

    let mut settings = MaybeUninit::<Dav1dSettings>::uninit();
    unsafe { dav1d::dav1d_default_settings(NonNull::from(&mut settings).cast()) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc = unsafe { dav1d::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d open failed ({})",
            rc.0
        )));
    }

    // Everything between open and close; the context is closed on every path.
    let decode = || -> Result<(u32, u32, Vec<u8>), BackendError> {
        let mut data = Dav1dData::default();
        let buf = unsafe { dav1d::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
        if buf.is_null() {
            return Err(BackendError::ProcessingFailed(
                "rav1d data_create failed".into(),
            ));
        }
        unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf, av1_bytes.len()) };

        let rc = unsafe { dav1d::dav1d_send_data(ctx, NonNull::new(&mut data)) };
        if rc.0 != 0 {
            unsafe { dav1d::dav1d_data_unref(NonNull::new(&mut data)) };
            return Err(BackendError::ProcessingFailed(format!(
                "rav1d send_data failed ({})",
                rc.0
            )));
        }

        let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
        let rc = unsafe { dav1d::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
        if rc.0 != 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "rav1d get_picture failed ({})",
                rc.0
            )));
        }

        let converted = picture_to_rgb(&pic);
        unsafe { dav1d::dav1d_picture_unref(NonNull::new(&mut pic)) };
        converted
    };
    let decoded = decode();
    unsafe { dav1d::dav1d_close(NonNull::new(&mut ctx)) };

    let (w, h, rgb) = decoded?;
    image::RgbImage::from_raw(w, h, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| {
            BackendError::ProcessingFailed("Failed to create image from decoded AVIF data".into())
        })
}

/// Convert a decoded rav1d picture into interleaved RGB8.
fn picture_to_rgb(
    pic: &rav1d::include::dav1d::picture::Dav1dPicture,
) -> Result<(u32, u32, Vec<u8>), BackendError> {
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };

    let plane = |index: usize| -> Result<*const u8, BackendError> {
        pic.data[index]
            .map(|ptr| ptr.as_ptr() as *const u8)
            .ok_or_else(|| {
                BackendError::ProcessingFailed(format!("rav1d picture missing plane {index}"))
            })
    };

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let bpc = pic.p.bpc as u32;
    let layout = pic.p.layout;
    let y_ptr = plane(0)?;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y_ptr,
            u_ptr: y_ptr,
            v_ptr: y_ptr,
            y_stride: pic.stride[0],
            uv_stride: 0,
            width,
            height,
            bpc,
            ss_x: false,
            ss_y: false,
            monochrome: true,
        }
    } else {
        let (ss_x, ss_y) = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            _ => {
                return Err(BackendError::ProcessingFailed(format!(
                    "Unsupported AVIF pixel layout: {layout}"
                )));
            }
        };
        YuvPlanes {
            y_ptr,
            u_ptr: plane(1)?,
            v_ptr: plane(2)?,
            y_stride: pic.stride[0],
            uv_stride: pic.stride[1],
            width,
            height,
            bpc,
            ss_x,
            ss_y,
            monochrome: false,
        }
    };

    Ok((width, height, planes.to_rgb()))
}

/// Decoded YUV plane data from rav1d, ready for RGB conversion.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// BT.601 YCbCr to RGB, scaled down to 8 bits.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for row in 0..self.height {
            for col in 0..self.width {
                let y = self.sample(self.y_ptr, self.y_stride, col, row);
                let pixel = if self.monochrome {
                    let v = (y * scale).clamp(0.0, 255.0) as u8;
                    [v, v, v]
                } else {
                    let cx = if self.ss_x { col / 2 } else { col };
                    let cy = if self.ss_y { row / 2 } else { row };
                    let cb = self.sample(self.u_ptr, self.uv_stride, cx, cy) - center;
                    let cr = self.sample(self.v_ptr, self.uv_stride, cx, cy) - center;
                    [
                        ((y + 1.402 * cr) * scale).clamp(0.0, 255.0) as u8,
                        ((y - 0.344136 * cb - 0.714136 * cr) * scale).clamp(0.0, 255.0) as u8,
                        ((y + 1.772 * cb) * scale).clamp(0.0, 255.0) as u8,
                    ]
                };
                rgb.extend_from_slice(&pixel);
            }
        }
        rgb
    }

    /// 8-bit samples are bytes; 10- and 12-bit samples are stored as u16.
    #[inline]
    fn sample(&self, ptr: *const u8, stride: isize, x: u32, y: u32) -> f32 {
        if self.bpc <= 8 {
            (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
        } else {
            let byte_offset = y as isize * stride + x as isize * 2;
            (unsafe { (ptr.offset(byte_offset) as *const u16).read_unaligned() }) as f32
        }
    }
}

/// Encode `img` to `path`, creating missing parent directories.
pub fn save_image(img: &DynamicImage, path: &Path, encoding: Encoding) -> Result<(), BackendError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    let quality = encoding.quality.value() as u8;

    let result = match encoding.format {
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality)),
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new_with_quality(
            &mut writer,
            CompressionType::Default,
            PngFilter::Adaptive,
        )),
        OutputFormat::WebP => img.write_with_encoder(WebPEncoder::new_lossless(&mut writer)),
        OutputFormat::Avif => img.write_with_encoder(AvifEncoder::new_with_speed_quality(
            &mut writer,
            6,
            quality,
        )),
        OutputFormat::Tiff => img.write_to(&mut writer, ImageFormat::Tiff),
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut writer, ImageFormat::Gif)
        }
    };

    result.map_err(|e| {
        BackendError::ProcessingFailed(format!("{} encode failed: {}", encoding.format, e))
    })?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::{create_test_jpeg, create_test_png};
    use image::{GrayImage, RgbImage, RgbaImage};

    fn encoding(format: OutputFormat) -> Encoding {
        Encoding {
            format,
            quality: Quality::new(85),
        }
    }

    fn create_test_avif(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        save_image(&DynamicImage::ImageRgb8(img), path, encoding(OutputFormat::Avif)).unwrap();
    }

    #[test]
    fn info_for_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let info = read_info(&path).unwrap();
        assert_eq!((info.width, info.height), (200, 150));
        assert_eq!(info.format, SourceFormat::Jpeg);
        assert_eq!(info.channels, 3);
        assert!(!info.has_alpha);
        assert_eq!(info.colorspace, "srgb");
        assert!(info.file_size_bytes > 0);
    }

    #[test]
    fn info_reports_alpha_and_grayscale() {
        let tmp = tempfile::TempDir::new().unwrap();

        let rgba = tmp.path().join("rgba.png");
        RgbaImage::from_pixel(8, 8, image::Rgba([1, 2, 3, 4]))
            .save(&rgba)
            .unwrap();
        let info = read_info(&rgba).unwrap();
        assert_eq!(info.channels, 4);
        assert!(info.has_alpha);

        let gray = tmp.path().join("gray.png");
        GrayImage::from_pixel(8, 8, image::Luma([90])).save(&gray).unwrap();
        let info = read_info(&gray).unwrap();
        assert_eq!(info.channels, 1);
        assert_eq!(info.colorspace, "b-w");
    }

    #[test]
    fn info_uses_header_not_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photo.dat");
        create_test_png(&path, 40, 30);

        let info = read_info(&path).unwrap();
        assert_eq!(info.format, SourceFormat::Png);
    }

    #[test]
    fn info_for_missing_file_errors() {
        assert!(read_info(Path::new("/nonexistent/image.jpg")).is_err());
    }

    #[test]
    fn heif_header_fails_to_decode() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photo.heic");
        let mut bytes = 24u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"ftypheic\0\0\0\0mif1heic");
        bytes.extend_from_slice(&[0u8; 64]);
        std::fs::write(&path, bytes).unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(err.to_string().contains("HEIF"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("nested/deeper/out.png");
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

        save_image(&img, &output, encoding(OutputFormat::Png)).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn jpeg_drops_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, image::Rgba([200, 10, 10, 128])));

        save_image(&img, &output, encoding(OutputFormat::Jpeg)).unwrap();
        assert_eq!(read_info(&output).unwrap().channels, 3);
    }

    #[test]
    fn every_output_format_probes_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 12, image::Rgb([40, 80, 120])));

        for (format, expected) in [
            (OutputFormat::Jpeg, SourceFormat::Jpeg),
            (OutputFormat::Png, SourceFormat::Png),
            (OutputFormat::WebP, SourceFormat::WebP),
            (OutputFormat::Tiff, SourceFormat::Tiff),
            (OutputFormat::Gif, SourceFormat::Gif),
        ] {
            let path = tmp.path().join(format!("out.{}", format.extension()));
            save_image(&img, &path, encoding(format)).unwrap();
            assert_eq!(
                probe_file(&path).unwrap(),
                Probe::Supported(expected),
                "{format} output should probe as {expected}"
            );
        }
    }

    #[test]
    fn decode_avif_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.avif");
        create_test_avif(&path, 64, 48);

        let decoded = load_image(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn identify_avif_from_container() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.avif");
        create_test_avif(&path, 120, 80);

        let info = read_info(&path).unwrap();
        assert_eq!(info.format, SourceFormat::Avif);
        assert_eq!((info.width, info.height), (120, 80));
        assert!(!info.has_alpha);
    }
}
