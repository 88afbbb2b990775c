//! Pixel steps applied between decode and encode.
//!
//! Every [`Adjustment`] runs on an RGBA8 buffer. Tone steps (modulate,
//! gamma, linear, channel gains) touch only the color channels; filters
//! (sharpen, median, blur) run on all four. Images that arrived without an
//! alpha channel leave without one.

use super::params::Adjustment;
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use imageproc::filter::median_filter;

/// Rec. 709 luma weights used for saturation.
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Apply `steps` in order. An empty list returns the image untouched.
pub fn apply_adjustments(img: DynamicImage, steps: &[Adjustment]) -> DynamicImage {
    if steps.is_empty() {
        return img;
    }
    let has_alpha = img.color().has_alpha();
    let buffer = steps
        .iter()
        .fold(img.into_rgba8(), |buffer, step| apply_step(buffer, step));

    if has_alpha {
        DynamicImage::ImageRgba8(buffer)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(buffer).into_rgb8())
    }
}

fn apply_step(buffer: RgbaImage, step: &Adjustment) -> RgbaImage {
    match *step {
        Adjustment::Modulate {
            brightness,
            saturation,
        } => modulate(buffer, brightness, saturation),
        Adjustment::Gamma(gamma) => {
            let exponent = 1.0 / gamma;
            let table = lut(|v| 255.0 * (v / 255.0).powf(exponent));
            map_channels(buffer, [&table, &table, &table])
        }
        Adjustment::Linear { multiplier, offset } => {
            let table = lut(|v| multiplier * v + offset);
            map_channels(buffer, [&table, &table, &table])
        }
        Adjustment::ChannelGains { red, green, blue } => map_channels(
            buffer,
            [&lut(|v| v * red), &lut(|v| v * green), &lut(|v| v * blue)],
        ),
        Adjustment::Sharpen(sharpening) => {
            imageops::unsharpen(&buffer, sharpening.sigma, sharpening.threshold)
        }
        Adjustment::Median { radius } if radius > 0 => median_filter(&buffer, radius, radius),
        Adjustment::Median { .. } => buffer,
        Adjustment::Blur { sigma } if sigma > 0.0 => imageops::blur(&buffer, sigma),
        Adjustment::Blur { .. } => buffer,
    }
}

/// Precompute a clamped, rounded 8-bit mapping.
fn lut(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = to_u8(f(i as f32));
    }
    table
}

fn map_channels(mut buffer: RgbaImage, tables: [&[u8; 256]; 3]) -> RgbaImage {
    for Rgba(px) in buffer.pixels_mut() {
        for (channel, table) in px.iter_mut().zip(tables) {
            *channel = table[*channel as usize];
        }
    }
    buffer
}

fn modulate(mut buffer: RgbaImage, brightness: f32, saturation: f32) -> RgbaImage {
    for Rgba(px) in buffer.pixels_mut() {
        let scaled = [
            px[0] as f32 * brightness,
            px[1] as f32 * brightness,
            px[2] as f32 * brightness,
        ];
        let luma: f32 = scaled.iter().zip(LUMA).map(|(c, w)| c * w).sum();
        for (channel, value) in px.iter_mut().zip(scaled) {
            *channel = to_u8(luma + (value - luma) * saturation);
        }
    }
    buffer
}

#[inline]
fn to_u8(value: f32) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}
