//! Album metadata hydration: fold the vector output into the album record.
//!
//! For every entry of the album's vector directory, in name order:
//!
//! 1. Directories are passed over.
//! 2. The file is parsed into an ellipse sequence ([`parse_svg_sequence`]).
//! 3. The original is found by swapping the extension for each of
//!    `metadata.original_lookup` in turn, until the backend can read the
//!    dimensions of that file in originals.
//! 4. The record is updated: an existing image gets fresh dimensions, a new
//!    image is appended with `title = fileName` and an empty description.
//!    The sequence entry is always replaced.
//!
//! A file failing step 2 or 3 is skipped and reported; the others still go
//! in. The record is then paginated and written, even when nothing was
//! found, so both pages always exist after a run.

use crate::album_meta::{
    AlbumMeta, ImageMeta, MetaError, MetaSource, album_url, load_album_meta, save_album_meta,
};
use crate::config::PipelineConfig;
use crate::imaging::{Dimensions, ImageBackend};
use crate::listing::list_entries;
use crate::naming::original_candidate;
use crate::pipeline::{PipelineEvent, emit};
use crate::svg::{SvgSequence, parse_svg_sequence};
use crate::types::{SkippedFile, StageId};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrateReport {
    /// Where the pre-existing record came from.
    pub source: MetaSource,
    /// Images in the saved record.
    pub image_count: usize,
    /// Vector files folded in (updated + added).
    pub hydrated: usize,
    /// Of those, images new to the record.
    pub added: usize,
    pub skipped: Vec<SkippedFile>,
    pub pages: [PathBuf; 2],
}

/// Find the original matching `vector_file` and read its dimensions.
fn resolve_original(
    backend: &dyn ImageBackend,
    originals: &Path,
    vector_file: &str,
    lookup: &[String],
) -> Option<(String, Dimensions)> {
    lookup.iter().find_map(|ext| {
        let candidate = original_candidate(vector_file, ext);
        backend
            .identify(&originals.join(&candidate))
            .ok()
            .map(|dims| (candidate, dims))
    })
}

/// Merge one parsed vector file into the record. Returns true when the image is new.
fn merge_image(meta: &mut AlbumMeta, file_name: &str, dims: Dimensions, svg: SvgSequence) -> bool {
    let SvgSequence {
        width,
        height,
        sequence,
    } = svg;
    meta.svg_sequences.insert(file_name.to_string(), sequence);

    if let Some(image) = meta.image_mut(file_name) {
        image.width = dims.width;
        image.height = dims.height;
        image.svg_width = width;
        image.svg_height = height;
        return false;
    }

    meta.images.push(ImageMeta {
        file_name: file_name.to_string(),
        width: dims.width,
        height: dims.height,
        title: file_name.to_string(),
        description: String::new(),
        svg_width: width,
        svg_height: height,
        ..Default::default()
    });
    true
}

/// Hydrate and persist the metadata record of `album`.
pub fn hydrate_album(
    backend: &dyn ImageBackend,
    album: &Path,
    config: &PipelineConfig,
    events: Option<&Sender<PipelineEvent>>,
) -> Result<HydrateReport, MetaError> {
    let album_name = album_url(album);
    let (mut meta, source) = load_album_meta(album, &config.metadata)?;

    let vector_dir = album.join(&config.vector.dir);
    let originals = album.join(&config.originals_dir);
    let entries = if vector_dir.is_dir() {
        list_entries(&vector_dir)?
    } else {
        Vec::new()
    };

    let mut skipped = Vec::new();
    let mut hydrated = 0;
    let mut added = 0;
    let mut skip = |file: &str, reason: String| {
        emit(
            events,
            PipelineEvent::MetadataSkipped {
                album: album_name.clone(),
                file: file.to_string(),
                reason: reason.clone(),
            },
        );
        skipped.push(SkippedFile::new(file, StageId::Metadata, reason));
    };

    for entry in entries.iter().filter(|e| !e.is_dir) {
        let svg = match fs::read_to_string(&entry.path)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_svg_sequence(&text).map_err(|e| e.to_string()))
        {
            Ok(svg) => svg,
            Err(reason) => {
                skip(&entry.name, reason);
                continue;
            }
        };

        let Some((original, dims)) = resolve_original(
            backend,
            &originals,
            &entry.name,
            &config.metadata.original_lookup,
        ) else {
            skip(&entry.name, "no original found".to_string());
            continue;
        };

        if merge_image(&mut meta, &original, dims, svg) {
            added += 1;
        }
        hydrated += 1;
    }

    let pages = save_album_meta(album, &meta, &config.metadata)?;
    emit(
        events,
        PipelineEvent::MetadataSaved {
            album: album_name,
            image_count: meta.images.len(),
            pages: pages.to_vec(),
        },
    );

    Ok(HydrateReport {
        source,
        image_count: meta.images.len(),
        hydrated,
        added,
        skipped,
        pages,
    })
}
