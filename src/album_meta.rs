//! Album metadata records: the JSON the front end reads.
//!
//! One logical record per album, persisted as two pages with the same shape:
//!
//! ```text
//! album-1-to-10.json   first `page_size` images
//! album-11-plus.json   the remainder (possibly empty)
//! ```
//!
//! ```json
//! { "url": "trip", "section": "1-to-10", "imageCount": 12,
//!   "images": [ { "fileName": "a.png", "width": 640, "height": 480,
//!                 "title": "a.png", "description": "",
//!                 "svgWidth": "640", "svgHeight": "480" } ],
//!   "svgSequences": { "a.png": ["#336699,0.502,8,8,4,4"] } }
//! ```
//!
//! Loading prefers an older unsplit `album-meta.json` when one exists, then
//! the page pair, then an empty record. When the page size changes, pages
//! written under the old size are read once and replaced by the new pair.
//! Fields this crate does not know about are kept and written back unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::MetadataConfig;
use crate::listing::file_names;

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid metadata in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One album's metadata (or one page of it).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumMeta {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<ImageMeta>,
    /// Encoded ellipse sequence per image, keyed by original file name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub svg_sequences: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    pub file_name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Set once on creation; hand edits survive re-hydration.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub svg_width: String,
    #[serde(default)]
    pub svg_height: String,
    /// Older records embedded the sequence per image. Read, never written.
    #[serde(default, skip_serializing)]
    pub svg_sequence: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Older records carry `null` where a collection is expected.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AlbumMeta {
    pub fn image_mut(&mut self, file_name: &str) -> Option<&mut ImageMeta> {
        self.images.iter_mut().find(|i| i.file_name == file_name)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.images.iter().any(|i| i.file_name == file_name)
    }

    /// Move embedded per-image sequences into the top-level map.
    pub fn migrate_embedded_sequences(&mut self) {
        for image in &mut self.images {
            if let Some(sequence) = image.svg_sequence.take() {
                self.svg_sequences.insert(image.file_name.clone(), sequence);
            }
        }
    }

    /// Append the images of a second page that are not already present.
    fn absorb_page(&mut self, page: AlbumMeta) {
        let AlbumMeta {
            images,
            mut svg_sequences,
            ..
        } = page;
        for mut image in images {
            if self.contains(&image.file_name) {
                continue;
            }
            image.svg_sequence = None;
            if let Some(sequence) = svg_sequences.remove(&image.file_name) {
                self.svg_sequences.insert(image.file_name.clone(), sequence);
            }
            self.images.push(image);
        }
    }
}

// =============================================================================
// Page naming
// =============================================================================

/// File names of the two pages for a given first-page size.
pub fn page_file_names(page_size: usize) -> (String, String) {
    (
        format!("album-1-to-{page_size}.json"),
        format!("album-{}-plus.json", page_size + 1),
    )
}

/// Page size encoded in a page file name, and whether it is the first page.
///
/// `album-1-to-10.json` → `(10, true)`, `album-11-plus.json` → `(10, false)`.
fn parse_page_name(name: &str) -> Option<(usize, bool)> {
    if let Some(size) = name
        .strip_prefix("album-1-to-")
        .and_then(|rest| rest.strip_suffix(".json"))
    {
        return size.parse().ok().filter(|n| *n > 0).map(|n| (n, true));
    }
    name.strip_prefix("album-")
        .and_then(|rest| rest.strip_suffix("-plus.json"))
        .and_then(|start| start.parse::<usize>().ok())
        .filter(|start| *start > 1)
        .map(|start| (start - 1, false))
}

/// Page sizes of every page file present in `album`, sorted, deduplicated.
fn page_sizes_on_disk(album: &Path) -> Result<Vec<usize>, MetaError> {
    let mut sizes: Vec<usize> = file_names(album)?
        .iter()
        .filter_map(|name| parse_page_name(name))
        .map(|(size, _)| size)
        .collect();
    sizes.sort_unstable();
    sizes.dedup();
    Ok(sizes)
}

/// `section` values of the two pages.
pub fn section_names(page_size: usize) -> (String, String) {
    (format!("1-to-{page_size}"), format!("{}-plus", page_size + 1))
}

// =============================================================================
// Load
// =============================================================================

fn read_record(path: &Path) -> Result<Option<AlbumMeta>, MetaError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| MetaError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Where an album's existing record was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaSource {
    Legacy,
    Pages,
    Empty,
}

/// Load the album's current record, migrated, with `url` set to the album
/// directory name.
pub fn load_album_meta(
    album: &Path,
    config: &MetadataConfig,
) -> Result<(AlbumMeta, MetaSource), MetaError> {
    let (first_name, second_name) = page_file_names(config.page_size);

    let (mut meta, source) = if let Some(legacy) = read_record(&album.join(&config.legacy_file))? {
        (legacy, MetaSource::Legacy)
    } else {
        let mut first = read_record(&album.join(&first_name))?;
        let mut second = read_record(&album.join(&second_name))?;
        if first.is_none() && second.is_none() {
            // Pages written under an earlier page size.
            if let Some(size) = page_sizes_on_disk(album)?.into_iter().next() {
                let (old_first, old_second) = page_file_names(size);
                first = read_record(&album.join(old_first))?;
                second = read_record(&album.join(old_second))?;
            }
        }
        match (first, second) {
            (None, None) => (AlbumMeta::default(), MetaSource::Empty),
            (first, second) => {
                let mut meta = first.unwrap_or_default();
                meta.migrate_embedded_sequences();
                if let Some(page) = second {
                    meta.absorb_page(page);
                }
                (meta, MetaSource::Pages)
            }
        }
    };

    meta.migrate_embedded_sequences();
    meta.url = album_url(album);
    Ok((meta, source))
}

/// The album's base directory name.
pub fn album_url(album: &Path) -> String {
    album
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// =============================================================================
// Paginate + save
// =============================================================================

/// Split a record into its two pages.
///
/// Both pages carry every top-level field of `meta`, the section name, and
/// the total image count. Each image's sequence travels with it.
pub fn paginate(meta: &AlbumMeta, page_size: usize) -> (AlbumMeta, AlbumMeta) {
    let (first_section, second_section) = section_names(page_size);
    let empty_page = |section: String| AlbumMeta {
        url: meta.url.clone(),
        section: Some(section),
        image_count: Some(meta.images.len()),
        images: Vec::new(),
        svg_sequences: BTreeMap::new(),
        extra: meta.extra.clone(),
    };

    let mut first = empty_page(first_section);
    let mut second = empty_page(second_section);
    for (index, image) in meta.images.iter().enumerate() {
        let page = if index < page_size {
            &mut first
        } else {
            &mut second
        };
        if let Some(sequence) = meta.svg_sequences.get(&image.file_name) {
            page.svg_sequences
                .insert(image.file_name.clone(), sequence.clone());
        }
        page.images.push(image.clone());
    }
    (first, second)
}

/// Write both pages into `album`, returning their paths.
pub fn save_album_meta(
    album: &Path,
    meta: &AlbumMeta,
    config: &MetadataConfig,
) -> Result<[PathBuf; 2], MetaError> {
    let (first, second) = paginate(meta, config.page_size);
    let (first_name, second_name) = page_file_names(config.page_size);
    let first_path = album.join(first_name);
    let second_path = album.join(second_name);

    fs::write(&first_path, serde_json::to_string(&first)?)?;
    fs::write(&second_path, serde_json::to_string(&second)?)?;

    for size in page_sizes_on_disk(album)? {
        if size != config.page_size {
            let (stale_first, stale_second) = page_file_names(size);
            remove_if_present(&album.join(stale_first))?;
            remove_if_present(&album.join(stale_second))?;
        }
    }
    Ok([first_path, second_path])
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
