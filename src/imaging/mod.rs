//! Image processing: raster resizing and ellipse vectorization.
//!
//! | Operation | Implementation |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Vectorize (stipple)** | built-in grid sampler, pure Rust |
//! | **Vectorize (primitive)** | external `primitive` command |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] and [`Vectorizer`] traits + implementations

pub mod backend;
mod calculations;
mod params;
pub mod primitive;
pub mod rust_backend;
pub mod stipple;

pub use backend::{BackendError, Dimensions, ImageBackend, Vectorizer};
pub use calculations::fit_within;
pub use params::{Quality, ResizeParams, VectorizeParams};
pub use primitive::PrimitiveVectorizer;
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use stipple::StippleVectorizer;

use crate::config::{VectorConfig, VectorEngine};

/// Build the vectorizer selected by `config.engine`.
pub fn vectorizer_for(config: &VectorConfig) -> Box<dyn Vectorizer> {
    match config.engine {
        VectorEngine::Stipple => Box::new(StippleVectorizer::new()),
        VectorEngine::Primitive => Box::new(PrimitiveVectorizer::new(&config.primitive_bin)),
    }
}
