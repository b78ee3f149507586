//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::TargetSize;

/// Scale `source` so its height is exactly `height`, keeping the aspect
/// ratio. Width never drops below 1px.
///
/// # Examples
/// ```
/// # use gallerygen::imaging::calculations::fit_height;
/// // 6000x4000 landscape → 384x256
/// assert_eq!(fit_height((6000, 4000), 256), (384, 256));
/// ```
pub fn fit_height(source: (u32, u32), height: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let width = (src_w as f64 * height as f64 / src_h as f64).round() as u32;
    (width.max(1), height)
}

/// Scale `source` down so its width is at most `max_width`, keeping the
/// aspect ratio. Images already narrow enough keep their size.
pub fn fit_max_width(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= max_width {
        return source;
    }
    let height = (src_h as f64 * max_width as f64 / src_w as f64).round() as u32;
    (max_width, height.max(1))
}

/// Output dimensions for `target` given the (orientation-corrected) source.
pub fn target_dimensions(source: (u32, u32), target: TargetSize) -> (u32, u32) {
    match target {
        TargetSize::Height(height) => fit_height(source, height),
        TargetSize::MaxWidth(width) => fit_max_width(source, width),
    }
}
