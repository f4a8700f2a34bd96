//! Image processing backend traits and shared types.
//!
//! Two seams separate the pipeline from the pixel work:
//!
//! - [`ImageBackend`]: identify (read dimensions) and resize-to-JPEG.
//! - [`Vectorizer`]: turn one raster image into an ellipse-only SVG.
//!
//! Production implementations are
//! [`RustBackend`](super::rust_backend::RustBackend),
//! [`StippleVectorizer`](super::stipple::StippleVectorizer) and
//! [`PrimitiveVectorizer`](super::primitive::PrimitiveVectorizer). Each call
//! either produces its output file or returns an error; the pipeline never
//! retries.

use super::params::{ResizeParams, VectorizeParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Raster operations the pipeline needs.
///
/// `Sync` so one backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions. Fails if the file is missing or not a decodable image.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize `params.source` and write a JPEG to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}

/// Image-to-SVG conversion.
pub trait Vectorizer: Sync {
    /// Write an ellipse-only SVG rendition of `params.source` to `params.output`.
    fn vectorize(&self, params: &VectorizeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::svg::{Ellipse, write_document};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock backend that records operations without decoding anything.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// `identify` succeeds for any existing file, returning per-filename
    /// dimensions when set and `default_dimensions` otherwise. `resize`
    /// fails for filenames listed in `failing` (matched on the source's
    /// file name).
    pub struct MockBackend {
        pub default_dimensions: Dimensions,
        pub dimensions: Mutex<HashMap<String, Dimensions>>,
        pub failing: Mutex<HashSet<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            edge: u32,
            quality: u32,
        },
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                default_dimensions: Dimensions {
                    width: 640,
                    height: 480,
                },
                dimensions: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
                operations: Mutex::new(Vec::new()),
            }
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(names: &[&str]) -> Self {
            let backend = Self::new();
            backend
                .failing
                .lock()
                .unwrap()
                .extend(names.iter().map(|n| n.to_string()));
            backend
        }

        pub fn with_dimensions(entries: &[(&str, u32, u32)]) -> Self {
            let backend = Self::new();
            backend
                .dimensions
                .lock()
                .unwrap()
                .extend(entries.iter().map(|&(name, width, height)| {
                    (name.to_string(), Dimensions { width, height })
                }));
            backend
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn resize_outputs(&self) -> Vec<String> {
            let mut outputs: Vec<String> = self
                .get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Resize { output, .. } => Some(file_name(&output)),
                    _ => None,
                })
                .collect();
            outputs.sort();
            outputs
        }
    }

    fn file_name(path: &str) -> String {
        Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            if !path.is_file() {
                return Err(BackendError::ProcessingFailed(format!(
                    "No such image: {}",
                    path.display()
                )));
            }
            let name = file_name(&path.to_string_lossy());
            Ok(self
                .dimensions
                .lock()
                .unwrap()
                .get(&name)
                .copied()
                .unwrap_or(self.default_dimensions))
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                edge: params.edge,
                quality: params.quality.value(),
            });
            let output_name = file_name(&params.output.to_string_lossy());
            let failing = self.failing.lock().unwrap();
            let fails = failing.iter().any(|name| {
                let (stem, _) = crate::naming::split_name(name);
                output_name.starts_with(&format!("{stem}--"))
            });
            if fails {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock resize failure: {output_name}"
                )));
            }
            Ok(())
        }
    }

    /// Mock vectorizer that writes a small synthetic SVG and tracks how many
    /// calls are in flight at once.
    pub struct MockVectorizer {
        pub ellipses: usize,
        pub delay: Duration,
        pub failing: HashSet<String>,
        pub calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Default for MockVectorizer {
        fn default() -> Self {
            Self {
                ellipses: 3,
                delay: Duration::ZERO,
                failing: HashSet::new(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    impl MockVectorizer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        /// Fails for sources whose file name is listed.
        pub fn failing_on(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    /// The document [`MockVectorizer`] writes: 100x75 with `count` ellipses.
    pub fn mock_svg(count: usize) -> String {
        let ellipses: Vec<Ellipse> = (0..count)
            .map(|i| Ellipse {
                fill: "#336699".to_string(),
                opacity: 0.5,
                cx: i as f64,
                cy: (i * 2) as f64,
                rx: 3.0,
                ry: 4.0,
            })
            .collect();
        write_document(100, 75, "#000000", 1.0, &ellipses)
    }

    impl Vectorizer for MockVectorizer {
        fn vectorize(&self, params: &VectorizeParams) -> Result<(), BackendError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let source_name = file_name(&params.source.to_string_lossy());
            self.calls.lock().unwrap().push(source_name.clone());
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }

            let result = if self.failing.contains(&source_name) {
                Err(BackendError::ProcessingFailed(format!(
                    "mock vectorize failure: {source_name}"
                )))
            } else {
                std::fs::write(&params.output, mock_svg(self.ellipses)).map_err(BackendError::Io)
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    #[test]
    fn mock_identify_existing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        std::fs::write(&path, "").unwrap();

        let backend = MockBackend::with_dimensions(&[("a.png", 800, 600)]);
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 800, height: 600 });

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p.ends_with("a.png")));
    }

    #[test]
    fn mock_identify_missing_file_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/nonexistent/a.png")).is_err());
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();
        backend
            .resize(&ResizeParams {
                source: "/album/small/a--small.jpg".into(),
                output: "/album/small/a--small.jpg".into(),
                edge: 480,
                quality: super::super::params::Quality::new(70),
            })
            .unwrap();

        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Resize {
                edge: 480,
                quality: 70,
                ..
            }
        ));
    }

    #[test]
    fn mock_resize_failure_by_original_name() {
        let backend = MockBackend::failing_on(&["b.gif"]);
        let result = backend.resize(&ResizeParams {
            source: "/album/tiny/b--tiny.jpg".into(),
            output: "/album/tiny/b--tiny.jpg".into(),
            edge: 64,
            quality: Default::default(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn mock_vectorizer_writes_parseable_svg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("a.svg");
        let vectorizer = MockVectorizer::new();
        vectorizer
            .vectorize(&VectorizeParams {
                source: tmp.path().join("a.png"),
                output: output.clone(),
                shapes: 10,
                work_size: 64,
            })
            .unwrap();

        let parsed = crate::svg::parse_svg_sequence(&std::fs::read_to_string(output).unwrap())
            .unwrap();
        assert_eq!(parsed.sequence.len(), 3);
        assert_eq!(vectorizer.max_in_flight(), 1);
    }
}
