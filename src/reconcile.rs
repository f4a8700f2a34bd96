//! Album survey and output-directory reconciliation.
//!
//! Before an album is touched, [`survey_album`] checks that it is processable:
//! the originals directory exists and holds at least one acceptable image.
//! Only then does [`reconcile_outputs`] bring every output directory into a
//! known state:
//!
//! | Output dir state | Action |
//! |---|---|
//! | absent | create it |
//! | present | delete every entry directly inside it, keep the directory |
//!
//! The originals directory is never modified here. Running reconciliation
//! twice in a row leaves the same result: every output directory present
//! and empty.

use crate::config::PipelineConfig;
use crate::listing::{file_names, list_entries};
use crate::naming::is_acceptable;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No originals directory found: {0}")]
    MissingOriginals(PathBuf),
    #[error("No acceptable images found in: {0}")]
    NoImages(PathBuf),
}

/// Result of surveying an album's originals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survey {
    pub originals: PathBuf,
    /// Every regular file in originals, sorted by name.
    pub files: Vec<String>,
    /// Number of those files with an acceptable extension.
    pub acceptable: usize,
}

/// Check that `album` has an originals directory with at least one acceptable image.
pub fn survey_album(album: &Path, config: &PipelineConfig) -> Result<Survey, ReconcileError> {
    let originals = album.join(&config.originals_dir);
    if !originals.is_dir() {
        return Err(ReconcileError::MissingOriginals(originals));
    }

    let files = file_names(&originals)?;
    let acceptable = files
        .iter()
        .filter(|name| is_acceptable(name, &config.extensions))
        .count();
    if acceptable == 0 {
        return Err(ReconcileError::NoImages(originals));
    }

    Ok(Survey {
        originals,
        files,
        acceptable,
    })
}

/// Ensure every output directory of `album` exists and is empty.
///
/// Returns the reconciled directories in config order.
pub fn reconcile_outputs(
    album: &Path,
    config: &PipelineConfig,
) -> Result<Vec<PathBuf>, ReconcileError> {
    let mut dirs = Vec::new();
    for name in config.output_dirs() {
        let dir = album.join(name);
        if dir.is_dir() {
            clear_directory(&dir)?;
        } else {
            fs::create_dir_all(&dir)?;
        }
        dirs.push(dir);
    }
    Ok(dirs)
}

/// Remove every entry directly inside `dir`, leaving `dir` itself in place.
fn clear_directory(dir: &Path) -> std::io::Result<()> {
    for entry in list_entries(dir)? {
        if entry.is_dir {
            fs::remove_dir_all(&entry.path)?;
        } else {
            fs::remove_file(&entry.path)?;
        }
    }
    Ok(())
}
