//! CLI output formatting.
//!
//! # Album-First Display
//!
//! Progress is grouped under the album it belongs to. Each album opens with
//! a header line (name and photo count); stages, files and the metadata write
//! follow as indented context, so a run reads as an inventory of what
//! happened to each album.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! trip (3 photos)
//!     Renamed a.jpg → a-A.jpg
//!     tiny (3 files)
//!         001 a-A.jpg
//!         002 a.png
//!         003 b.gif: failed (copy failed: No such file or directory)
//!     tiny: 2 done, 1 failed
//!     ...
//!     Metadata: 3 images → album-1-to-10.json, album-11-plus.json
//! ```
//!
//! ## Summary
//!
//! ```text
//! Summary
//! 001 trip: partial (3 photos)
//!     b.gif [tiny]: copy failed: No such file or directory
//! 002 empty: failed
//!     No acceptable images found in: empty/originals
//! 2 albums: 0 complete, 1 partial, 1 failed
//! ```
//!
//! # Architecture
//!
//! Every `format_*` function is pure and returns `Vec<String>` for
//! testability; `print_*` wrappers write to stdout.

use crate::pipeline::PipelineEvent;
use crate::types::{AlbumReport, GalleryReport, Outcome};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Progress events
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::AlbumStarted { album, image_count } => {
            vec![format!("{} ({})", album, plural(*image_count, "photo", "photos"))]
        }
        PipelineEvent::AlbumSkipped { album, reason } => {
            vec![format!("Skipped {}: {}", album, reason)]
        }
        PipelineEvent::FileRenamed { from, to, .. } => {
            vec![format!("{}Renamed {} \u{2192} {}", indent(1), from, to)]
        }
        PipelineEvent::StageStarted { stage, total, .. } => {
            vec![format!(
                "{}{} ({})",
                indent(1),
                stage,
                plural(*total, "file", "files")
            )]
        }
        PipelineEvent::FileDone { file, done, .. } => {
            vec![format!("{}{} {}", indent(2), format_index(*done), file)]
        }
        PipelineEvent::FileFailed {
            file, reason, done, ..
        } => vec![format!(
            "{}{} {}: failed ({})",
            indent(2),
            format_index(*done),
            file,
            reason
        )],
        PipelineEvent::MetadataSkipped { file, reason, .. } => {
            vec![format!("{}Skipped {}: {}", indent(1), file, reason)]
        }
        PipelineEvent::StageComplete {
            stage,
            succeeded,
            failed,
            ..
        } => vec![format!(
            "{}{}: {} done, {} failed",
            indent(1),
            stage,
            succeeded,
            failed
        )],
        PipelineEvent::MetadataSaved {
            image_count, pages, ..
        } => {
            let names: Vec<String> = pages.iter().map(|p| file_name(p)).collect();
            vec![format!(
                "{}Metadata: {} \u{2192} {}",
                indent(1),
                plural(*image_count, "image", "images"),
                names.join(", ")
            )]
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Complete => "complete",
        Outcome::Partial => "partial",
        Outcome::Fatal(_) => "failed",
    }
}

fn format_album_report(index: usize, album: &AlbumReport) -> Vec<String> {
    let mut lines = Vec::new();
    match &album.outcome {
        Outcome::Fatal(reason) => {
            lines.push(format!("{} {}: failed", format_index(index), album.album));
            lines.push(format!("{}{}", indent(1), reason));
        }
        outcome => {
            lines.push(format!(
                "{} {}: {} ({})",
                format_index(index),
                album.album,
                outcome_label(outcome),
                plural(album.image_count, "photo", "photos")
            ));
            for skip in &album.skipped {
                lines.push(format!(
                    "{}{} [{}]: {}",
                    indent(1),
                    skip.file,
                    skip.stage,
                    skip.reason
                ));
            }
        }
    }
    lines
}

fn totals_line(report: &GalleryReport) -> String {
    format!(
        "{}: {} complete, {} partial, {} failed",
        plural(report.albums.len(), "album", "albums"),
        report.count(|o| matches!(o, Outcome::Complete)),
        report.count(|o| matches!(o, Outcome::Partial)),
        report.count(|o| matches!(o, Outcome::Fatal(_))),
    )
}

/// Format the end-of-run summary for `run` and `hydrate`.
pub fn format_gallery_report(report: &GalleryReport) -> Vec<String> {
    let mut lines = vec!["Summary".to_string()];
    for (i, album) in report.albums.iter().enumerate() {
        lines.extend(format_album_report(i + 1, album));
    }
    lines.push(totals_line(report));
    lines
}

/// Format the result of `check`: planned renames instead of skipped files.
pub fn format_check_report(report: &GalleryReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, album) in report.albums.iter().enumerate() {
        match &album.outcome {
            Outcome::Fatal(reason) => {
                lines.push(format!("{} {}", format_index(i + 1), album.album));
                lines.push(format!("{}Error: {}", indent(1), reason));
            }
            _ => {
                lines.push(format!(
                    "{} {} ({})",
                    format_index(i + 1),
                    album.album,
                    plural(album.image_count, "photo", "photos")
                ));
                for rename in &album.renamed {
                    lines.push(format!(
                        "{}Would rename {} \u{2192} {}",
                        indent(1),
                        rename.from,
                        rename.to
                    ));
                }
            }
        }
    }
    lines
}

/// Print the end-of-run summary to stdout.
pub fn print_gallery_report(report: &GalleryReport) {
    for line in format_gallery_report(report) {
        println!("{}", line);
    }
}

/// Print the check result to stdout.
pub fn print_check_report(report: &GalleryReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}
