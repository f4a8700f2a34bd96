//! Single-level directory listing.
//!
//! Every stage enumerates exactly one directory level (gallery root, an
//! album's originals, an output directory). Entries come back sorted by
//! filename so runs are reproducible regardless of filesystem order.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One entry directly inside a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// List the entries directly inside `dir`, sorted by name.
pub fn list_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path().to_path_buf(),
            is_dir: entry.file_type().is_dir(),
        });
    }
    Ok(entries)
}

/// Names of the regular files directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> io::Result<Vec<String>> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lists_sorted_single_level() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.png"), "").unwrap();
        fs::write(tmp.path().join("a.png"), "").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/deep.png"), "").unwrap();

        let entries = list_entries(tmp.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "nested"]);
        assert!(entries[2].is_dir);
    }

    #[test]
    fn file_names_skips_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.png"), "").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        assert_eq!(file_names(tmp.path()).unwrap(), vec!["a.png"]);
    }

    #[test]
    fn missing_directory_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(list_entries(&tmp.path().join("nope")).is_err());
    }
}
