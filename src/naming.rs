//! Centralized filename rules for every file the pipeline derives.
//!
//! Every output name is computed from the original's filename by swapping its
//! extension for a marker:
//!
//! - `photo.png` → `photo--small.jpg` (raster size variant)
//! - `photo.png` → `photo.svg` (vector rendition)
//! - `photo.svg` → `photo.jpg` (candidate original when hydrating)
//!
//! Extensions are compared case-sensitively: `photo.PNG` is not acceptable
//! under the default allow-list.

use std::path::Path;

/// Replace the last occurrence of `target` in `name` with `replacement`,
/// or append `replacement` if `target` does not occur.
///
/// - `("photo.png", ".png", "--tiny.jpg")` → `"photo--tiny.jpg"`
/// - `("photo", ".png", ".svg")` → `"photo.svg"`
pub fn replace_last_or_add(name: &str, target: &str, replacement: &str) -> String {
    match name.rfind(target) {
        Some(pos) if !target.is_empty() => {
            let mut out = String::with_capacity(name.len() + replacement.len());
            out.push_str(&name[..pos]);
            out.push_str(replacement);
            out.push_str(&name[pos + target.len()..]);
            out
        }
        _ => format!("{name}{replacement}"),
    }
}

/// Split a filename into (stem, extension-with-dot).
///
/// Follows `Path::file_stem` semantics: the extension is everything after the
/// last dot, dotfiles have no extension.
///
/// - `"a.b.jpg"` → `("a.b", ".jpg")`
/// - `".hidden"` → `(".hidden", "")`
pub fn split_name(name: &str) -> (String, String) {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

/// Whether `name` carries one of the acceptable extensions (no dot, exact case).
pub fn is_acceptable(name: &str, extensions: &[String]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
}

/// Output filename of a raster variant: `photo.png` + `small` → `photo--small.jpg`.
pub fn sized_file_name(original: &str, size: &str) -> String {
    let (_, ext) = split_name(original);
    replace_last_or_add(original, &ext, &format!("--{size}.jpg"))
}

/// Output filename of the vector rendition: `photo.png` → `photo.svg`.
pub fn vector_file_name(original: &str) -> String {
    let (_, ext) = split_name(original);
    replace_last_or_add(original, &ext, ".svg")
}

/// Candidate original for a vector file: `photo.svg` + `jpeg` → `photo.jpeg`.
pub fn original_candidate(vector_file: &str, extension: &str) -> String {
    let (_, ext) = split_name(vector_file);
    replace_last_or_add(vector_file, &ext, &format!(".{extension}"))
}
