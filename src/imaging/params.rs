//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the pipeline (which decides which files to produce) and
//! the [`backend`](super::backend) implementations (which do the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 80). Clamped on construction.
//! - [`ResizeParams`]: One raster variant: source, output path, longer-edge bound, quality.
//! - [`VectorizeParams`]: One vector rendition: source, output path, shape budget, working size.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for a resize to JPEG.
///
/// `source` and `output` may be the same path: the staged copy is resized in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Longer edge of the result. Images already within bounds keep their size.
    pub edge: u32,
    pub quality: Quality,
}

/// Parameters for turning a raster image into an ellipse-only SVG.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Number of ellipses to draw.
    pub shapes: u32,
    /// Longer edge the source is downsampled to before sampling.
    pub work_size: u32,
}
