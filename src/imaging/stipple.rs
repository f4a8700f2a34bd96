//! Built-in vectorizer: a fixed grid of ellipses over a downsampled image.
//!
//! 1. Downsample the source so its longer edge is `work_size`.
//! 2. Paint the background with the mean colour of the whole image.
//! 3. Split the working image into square cells and compute each cell's mean colour.
//! 4. Keep the `shapes` cells whose colour differs most from the background,
//!    one half-opaque ellipse per cell, most distinct first.
//!
//! The document is sized like the original and scaled back up via the
//! group transform, the same layout the external `primitive` tool produces.

use super::backend::{BackendError, Vectorizer};
use super::calculations::{cell_size, fit_within, scale_factor};
use super::params::VectorizeParams;
use super::rust_backend::load_image;
use crate::svg::{Ellipse, write_document};
use image::RgbImage;
use image::imageops::FilterType;

const ELLIPSE_OPACITY: f64 = 128.0 / 255.0;

pub struct StippleVectorizer;

impl StippleVectorizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StippleVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

fn hex(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Mean colour of the pixels in `[x0, x1) x [y0, y1)`.
fn mean_color(img: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) -> [u8; 3] {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            let px = img.get_pixel(x, y).0;
            for (acc, channel) in sum.iter_mut().zip(px) {
                *acc += channel as u64;
            }
            count += 1;
        }
    }
    if count == 0 {
        return [0, 0, 0];
    }
    sum.map(|s| (s / count) as u8)
}

fn distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b)
        .map(|(&x, y)| (x as i32 - y as i32).unsigned_abs())
        .sum()
}

/// Compute the background colour and ranked ellipses for a working image.
pub(crate) fn stipple(img: &RgbImage, shapes: u32) -> (String, Vec<Ellipse>) {
    let (width, height) = img.dimensions();
    let background = mean_color(img, 0, 0, width, height);
    let side = cell_size(width, height, shapes);
    let radius = side as f64 / 2.0;

    let mut cells: Vec<(u32, Ellipse)> = Vec::new();
    for row in 0..height.div_ceil(side) {
        for col in 0..width.div_ceil(side) {
            let (x0, y0) = (col * side, row * side);
            let (x1, y1) = ((x0 + side).min(width), (y0 + side).min(height));
            let color = mean_color(img, x0, y0, x1, y1);
            cells.push((
                distance(color, background),
                Ellipse {
                    fill: hex(color),
                    opacity: ELLIPSE_OPACITY,
                    cx: (x0 + x1) as f64 / 2.0,
                    cy: (y0 + y1) as f64 / 2.0,
                    rx: radius,
                    ry: radius,
                },
            ));
        }
    }

    // Stable sort keeps grid order among equally distinct cells.
    cells.sort_by(|a, b| b.0.cmp(&a.0));
    let ellipses = cells
        .into_iter()
        .take(shapes as usize)
        .map(|(_, e)| e)
        .collect();
    (hex(background), ellipses)
}

impl Vectorizer for StippleVectorizer {
    fn vectorize(&self, params: &VectorizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let (orig_w, orig_h) = (img.width(), img.height());
        let (work_w, work_h) = fit_within((orig_w, orig_h), params.work_size);
        let working = img
            .resize_exact(work_w, work_h, FilterType::Triangle)
            .to_rgb8();

        let (background, ellipses) = stipple(&working, params.shapes);
        let document = write_document(
            orig_w,
            orig_h,
            &background,
            scale_factor(orig_w, work_w),
            &ellipses,
        );
        std::fs::write(&params.output, document).map_err(BackendError::Io)
    }
}
