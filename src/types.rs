//! Report types shared by the pipeline, hydration and the gallery runner.

use std::fmt;

use crate::collision::Rename;

/// Pipeline stage a per-file problem happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageId {
    /// A raster size, by name.
    Raster(String),
    Vector,
    Metadata,
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageId::Raster(size) => write!(f, "{size}"),
            StageId::Vector => write!(f, "vector"),
            StageId::Metadata => write!(f, "metadata"),
        }
    }
}

/// A file that produced no output in some stage, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub file: String,
    pub stage: StageId,
    pub reason: String,
}

impl SkippedFile {
    pub fn new(file: impl Into<String>, stage: StageId, reason: impl fmt::Display) -> Self {
        Self {
            file: file.into(),
            stage,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every stage produced every output.
    Complete,
    /// All stages ran but some files were skipped.
    Partial,
    /// The album was abandoned; no further stage ran.
    Fatal(String),
}

/// Result of processing one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumReport {
    pub album: String,
    pub outcome: Outcome,
    /// Acceptable originals found by the survey (0 when the survey failed).
    pub image_count: usize,
    pub renamed: Vec<Rename>,
    pub skipped: Vec<SkippedFile>,
}

impl AlbumReport {
    pub fn fatal(album: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            album: album.into(),
            outcome: Outcome::Fatal(reason.to_string()),
            image_count: 0,
            renamed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Report for an album whose stages all ran; partial iff anything was skipped.
    pub fn finished(
        album: impl Into<String>,
        image_count: usize,
        renamed: Vec<Rename>,
        skipped: Vec<SkippedFile>,
    ) -> Self {
        let outcome = if skipped.is_empty() {
            Outcome::Complete
        } else {
            Outcome::Partial
        };
        Self {
            album: album.into(),
            outcome,
            image_count,
            renamed,
            skipped,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.outcome, Outcome::Fatal(_))
    }
}

/// Result of one gallery run, albums in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryReport {
    pub albums: Vec<AlbumReport>,
}

impl GalleryReport {
    pub fn has_fatal(&self) -> bool {
        self.albums.iter().any(AlbumReport::is_fatal)
    }

    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.albums.iter().filter(|a| pred(&a.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display() {
        assert_eq!(StageId::Raster("tiny".into()).to_string(), "tiny");
        assert_eq!(StageId::Vector.to_string(), "vector");
        assert_eq!(StageId::Metadata.to_string(), "metadata");
    }

    #[test]
    fn finished_without_skips_is_complete() {
        let report = AlbumReport::finished("trip", 3, Vec::new(), Vec::new());
        assert_eq!(report.outcome, Outcome::Complete);
        assert!(!report.is_fatal());
    }

    #[test]
    fn finished_with_skips_is_partial() {
        let skipped = vec![SkippedFile::new("b.gif", StageId::Vector, "boom")];
        let report = AlbumReport::finished("trip", 3, Vec::new(), skipped);
        assert_eq!(report.outcome, Outcome::Partial);
    }

    #[test]
    fn gallery_reports_fatal_albums() {
        let report = GalleryReport {
            albums: vec![
                AlbumReport::finished("a", 1, Vec::new(), Vec::new()),
                AlbumReport::fatal("b", "No originals directory found"),
            ],
        };
        assert!(report.has_fatal());
        assert_eq!(report.count(|o| matches!(o, Outcome::Complete)), 1);
    }
}
