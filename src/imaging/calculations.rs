//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `original` inside a square of side `edge`, preserving aspect ratio.
///
/// The longer side becomes `edge`; the shorter side is scaled and rounded,
/// never below 1. Images already within bounds are returned unchanged (no
/// upscaling).
///
/// # Examples
/// ```
/// # use gallery_ingest::imaging::fit_within;
/// assert_eq!(fit_within((2000, 1500), 1024), (1024, 768));
/// assert_eq!(fit_within((300, 200), 1024), (300, 200));
/// ```
pub fn fit_within(original: (u32, u32), edge: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);
    if longer_edge <= edge || longer_edge == 0 {
        return original;
    }

    let ratio = edge as f64 / longer_edge as f64;
    if orig_w >= orig_h {
        (edge, ((orig_h as f64 * ratio).round() as u32).max(1))
    } else {
        (((orig_w as f64 * ratio).round() as u32).max(1), edge)
    }
}

/// Side length of the square sampling cells used to place `shapes` ellipses
/// over a `width` x `height` working image.
///
/// Chosen so the grid holds at least `shapes` cells (when the image has that
/// many pixels), and never smaller than one pixel.
pub fn cell_size(width: u32, height: u32, shapes: u32) -> u32 {
    if shapes == 0 {
        return width.max(height).max(1);
    }
    let area = width as f64 * height as f64;
    let side = (area / shapes as f64).sqrt().floor() as u32;
    side.max(1)
}

/// Factor that maps working-image coordinates back onto the original width.
pub fn scale_factor(original_width: u32, working_width: u32) -> f64 {
    if working_width == 0 {
        return 1.0;
    }
    original_width as f64 / working_width as f64
}
