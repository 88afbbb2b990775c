//! Pure calculation functions for dimensions and pixel-step coefficients.
//!
//! All functions here are pure and testable without any I/O or images.

/// Channel-gain change per unit of color temperature.
pub const TEMPERATURE_MULTIPLIER: f32 = 0.005;

/// Divisor mapping highlights/shadows slider units to contrast/brightness nudges.
pub const TONE_DIVISOR: f32 = 200.0;

/// Calculate the output dimensions of an upscale.
///
/// Each axis is `round(original * scale)`, capped independently at `max`.
/// The result always fills the computed size exactly; when a cap applies the
/// aspect ratio is not preserved.
///
/// # Examples
/// ```
/// # use retouch::imaging::calculations::upscale_dimensions;
/// assert_eq!(upscale_dimensions((400, 300), 2.0, (8000, 8000)), (800, 600));
/// assert_eq!(upscale_dimensions((5000, 1000), 2.0, (8000, 8000)), (8000, 2000));
/// ```
pub fn upscale_dimensions(original: (u32, u32), scale: f64, max: (u32, u32)) -> (u32, u32) {
    let (w, h) = original;
    let (max_w, max_h) = max;
    let scaled = |dim: u32, cap: u32| -> u32 {
        let target = (dim as f64 * scale).round();
        // `as` saturates, so huge products land on u32::MAX before the cap.
        (target as u32).clamp(1, cap.max(1))
    };
    (scaled(w, max_w), scaled(h, max_h))
}

/// Calculate dimensions that fit inside `bounds` while preserving aspect ratio.
///
/// Never enlarges: a source already inside the box keeps its size.
///
/// # Examples
/// ```
/// # use retouch::imaging::calculations::fit_within;
/// assert_eq!(fit_within((800, 600), (300, 300)), (300, 225));
/// assert_eq!(fit_within((200, 100), (300, 300)), (200, 100));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * ratio).round() as u32).max(1);
    let h = ((src_h as f64 * ratio).round() as u32).max(1);
    (w, h)
}

/// Coefficients of the linear contrast remap around mid-gray.
///
/// `output = contrast * input - 128 * contrast + 128`, returned as
/// `(multiplier, offset)` so it can be applied as `multiplier * input + offset`.
pub fn contrast_remap(contrast: f32) -> (f32, f32) {
    (contrast, 128.0 - 128.0 * contrast)
}

/// Red and blue channel gains for a color temperature shift.
///
/// Positive temperature warms (more red, less blue); negative cools.
pub fn temperature_gains(temperature: f32) -> (f32, f32) {
    let shift = temperature * TEMPERATURE_MULTIPLIER;
    ((1.0 + shift).max(0.0), (1.0 - shift).max(0.0))
}

/// Image area in megapixels.
pub fn megapixels(width: u32, height: u32) -> f64 {
    width as f64 * height as f64 / 1_000_000.0
}

/// Display form of a scale factor, e.g. `"1.5x"`.
pub fn format_scale_factor(scale: f64) -> String {
    format!("{scale:.1}x")
}
