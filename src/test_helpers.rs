//! Shared test utilities for the gallery-ingest test suite.
//!
//! Provides gallery/album fixture builders, small synthetic image writers,
//! and directory-listing assertions.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let gallery = setup_gallery(&[("trip", &["a.png", "a.jpg", "b.gif"])]);
//! let album = gallery.path().join("trip");
//!
//! assert_files(&album.join("originals"), &["a.jpg", "a.png", "b.gif"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::listing::file_names;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> image::RgbImage {
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a small valid PNG with the given dimensions.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write a small valid JPEG with the given dimensions.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

/// Write a small valid single-frame GIF with the given dimensions.
pub fn write_test_gif(path: &Path, width: u32, height: u32) {
    image::DynamicImage::ImageRgb8(gradient(width, height))
        .to_rgba8()
        .save_with_format(path, image::ImageFormat::Gif)
        .unwrap();
}

/// Write a real image matching the file's extension (png, jpg/jpeg, gif).
/// Anything else gets placeholder text.
pub fn write_image_for_name(path: &Path, width: u32, height: u32) {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => write_test_png(path, width, height),
        Some("jpg") | Some("jpeg") => write_test_jpeg(path, width, height),
        Some("gif") => write_test_gif(path, width, height),
        _ => std::fs::write(path, "not an image").unwrap(),
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a gallery root with one album per entry, each holding the listed
/// files in its `originals/` directory.
///
/// Files are placeholders; backends in unit tests are mocks and never decode
/// them.
pub fn setup_gallery(albums: &[(&str, &[&str])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (album, files) in albums {
        add_album(tmp.path(), album, files);
    }
    tmp
}

/// Add an album with placeholder originals under `root`.
pub fn add_album(root: &Path, album: &str, files: &[&str]) {
    let originals = root.join(album).join("originals");
    std::fs::create_dir_all(&originals).unwrap();
    for file in files {
        std::fs::write(originals.join(file), format!("original bytes of {file}")).unwrap();
    }
}

/// Like [`setup_gallery`] but writes real decodable images (64x48).
pub fn setup_gallery_with_images(albums: &[(&str, &[&str])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (album, files) in albums {
        let originals = tmp.path().join(album).join("originals");
        std::fs::create_dir_all(&originals).unwrap();
        for file in *files {
            write_image_for_name(&originals.join(file), 64, 48);
        }
    }
    tmp
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert the regular files directly inside `dir` are exactly `expected` (any order).
pub fn assert_files(dir: &Path, expected: &[&str]) {
    let mut actual =
        file_names(dir).unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()));
    actual.sort();
    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(actual, expected, "unexpected files in {}", dir.display());
}
