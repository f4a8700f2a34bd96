//! Gallery-level orchestration.
//!
//! A gallery root holds one directory per album. Albums are processed one at
//! a time, in name order, each going through:
//!
//! ```text
//! survey → resolve duplicate stems → reconcile output dirs → stages → hydrate
//! ```
//!
//! Anything that makes an album unprocessable (no originals, no acceptable
//! images, rename suffixes exhausted, an unreadable metadata record) ends that
//! album with a fatal outcome; the next album still runs. Per-file failures
//! only make the album partial.

use crate::album_meta::album_url;
use crate::collision::{discovery_order, plan_renames, resolve_collisions};
use crate::config::PipelineConfig;
use crate::hydrate::hydrate_album;
use crate::imaging::{ImageBackend, Vectorizer, supported_input_extensions};
use crate::listing::{file_names, list_entries};
use crate::naming::is_acceptable;
use crate::pipeline::{AlbumPipeline, PipelineError, PipelineEvent, emit};
use crate::reconcile::{reconcile_outputs, survey_album};
use crate::types::{AlbumReport, GalleryReport};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Gallery root not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Album not found: {0}")]
    UnknownAlbum(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Album directories under `root`, sorted by name.
///
/// Hidden entries and `skip_dirs` are left out. With `only`, returns just
/// that album (which must exist).
pub fn discover_albums(
    root: &Path,
    config: &PipelineConfig,
    only: Option<&str>,
) -> Result<Vec<PathBuf>, GalleryError> {
    if !root.is_dir() {
        return Err(GalleryError::MissingRoot(root.to_path_buf()));
    }

    if let Some(name) = only {
        let album = root.join(name);
        if !album.is_dir() {
            return Err(GalleryError::UnknownAlbum(name.to_string()));
        }
        return Ok(vec![album]);
    }

    Ok(list_entries(root)?
        .into_iter()
        .filter(|e| e.is_dir)
        .filter(|e| !e.name.starts_with('.'))
        .filter(|e| !config.skip_dirs.contains(&e.name))
        .map(|e| e.path)
        .collect())
}

fn acceptable_files(dir: &Path, config: &PipelineConfig) -> std::io::Result<Vec<String>> {
    Ok(file_names(dir)?
        .into_iter()
        .filter(|name| is_acceptable(name, &config.extensions))
        .collect())
}

/// Run the full conversion of one album.
pub fn process_album(pipeline: &AlbumPipeline<'_>, album: &Path) -> AlbumReport {
    let name = album_url(album);
    let config = pipeline.config();
    let events = pipeline.events();
    let fatal = |reason: String| {
        emit(
            events,
            PipelineEvent::AlbumSkipped {
                album: name.clone(),
                reason: reason.clone(),
            },
        );
        AlbumReport::fatal(name.clone(), reason)
    };

    let survey = match survey_album(album, config) {
        Ok(survey) => survey,
        Err(e) => return fatal(e.to_string()),
    };

    emit(
        events,
        PipelineEvent::AlbumStarted {
            album: name.clone(),
            image_count: survey.acceptable,
        },
    );

    let order = discovery_order(&survey.files, &config.extensions);
    let renamed = match resolve_collisions(&survey.originals, &order) {
        Ok(renamed) => renamed,
        Err(e) => return fatal(e.to_string()),
    };
    for rename in &renamed {
        emit(
            events,
            PipelineEvent::FileRenamed {
                album: name.clone(),
                from: rename.from.clone(),
                to: rename.to.clone(),
            },
        );
    }

    let files = match acceptable_files(&survey.originals, config) {
        Ok(files) => files,
        Err(e) => return fatal(e.to_string()),
    };
    if let Err(e) = reconcile_outputs(album, config) {
        return fatal(e.to_string());
    }

    let mut skipped: Vec<_> = pipeline
        .run(album, &files)
        .into_iter()
        .flat_map(|report| report.skipped)
        .collect();

    match hydrate_album(pipeline.backend(), album, config, events) {
        Ok(report) => skipped.extend(report.skipped),
        Err(e) => return fatal(e.to_string()),
    }

    AlbumReport::finished(name.clone(), files.len(), renamed, skipped)
}

/// Run the full pipeline over every album (or just `only`).
pub fn run_gallery(
    backend: &dyn ImageBackend,
    vectorizer: &dyn Vectorizer,
    root: &Path,
    config: &PipelineConfig,
    only: Option<&str>,
    events: Option<Sender<PipelineEvent>>,
) -> Result<GalleryReport, GalleryError> {
    let albums = discover_albums(root, config, only)?;
    let pipeline = AlbumPipeline::new(backend, vectorizer, config, events)?;
    Ok(GalleryReport {
        albums: albums
            .iter()
            .map(|album| process_album(&pipeline, album))
            .collect(),
    })
}

/// Re-hydrate metadata from existing vector output, without converting anything.
pub fn hydrate_gallery(
    backend: &dyn ImageBackend,
    root: &Path,
    config: &PipelineConfig,
    only: Option<&str>,
    events: Option<Sender<PipelineEvent>>,
) -> Result<GalleryReport, GalleryError> {
    let events = events.as_ref();
    let albums = discover_albums(root, config, only)?;
    let reports = albums
        .iter()
        .map(|album| {
            let name = album_url(album);
            match hydrate_album(backend, album, config, events) {
                Ok(report) => {
                    AlbumReport::finished(name, report.image_count, Vec::new(), report.skipped)
                }
                Err(e) => {
                    emit(
                        events,
                        PipelineEvent::AlbumSkipped {
                            album: name.clone(),
                            reason: e.to_string(),
                        },
                    );
                    AlbumReport::fatal(name, e)
                }
            }
        })
        .collect();
    Ok(GalleryReport { albums: reports })
}

/// Configured extensions the pure-Rust backend has no decoder for.
pub fn undecodable_extensions(config: &PipelineConfig) -> Vec<String> {
    let supported = supported_input_extensions();
    config
        .extensions
        .iter()
        .filter(|ext| !supported.contains(&ext.as_str()))
        .cloned()
        .collect()
}

/// Survey albums and plan duplicate renames without writing anything.
pub fn check_gallery(
    root: &Path,
    config: &PipelineConfig,
    only: Option<&str>,
) -> Result<GalleryReport, GalleryError> {
    let albums = discover_albums(root, config, only)?;
    let reports = albums
        .iter()
        .map(|album| {
            let name = album_url(album);
            let survey = match survey_album(album, config) {
                Ok(survey) => survey,
                Err(e) => return AlbumReport::fatal(name, e),
            };
            match plan_renames(&discovery_order(&survey.files, &config.extensions)) {
                Ok(planned) => AlbumReport::finished(name, survey.acceptable, planned, Vec::new()),
                Err(e) => AlbumReport::fatal(name, e),
            }
        })
        .collect();
    Ok(GalleryReport { albums: reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album_meta::load_album_meta;
    use crate::imaging::backend::tests::{MockBackend, MockVectorizer};
    use crate::imaging::{RustBackend, StippleVectorizer};
    use crate::test_helpers::{add_album, assert_files, setup_gallery, setup_gallery_with_images};
    use crate::types::{Outcome, StageId};
    use std::fs;
    use std::sync::mpsc;

    // =========================================================================
    // discover_albums
    // =========================================================================

    #[test]
    fn discovers_album_dirs_sorted_skipping_app_and_hidden() {
        let gallery = setup_gallery(&[("zoo", &["a.png"]), ("beach", &["a.png"])]);
        fs::create_dir_all(gallery.path().join("app")).unwrap();
        fs::create_dir_all(gallery.path().join(".cache")).unwrap();
        fs::write(gallery.path().join("README.txt"), "").unwrap();

        let albums = discover_albums(gallery.path(), &PipelineConfig::default(), None).unwrap();
        let names: Vec<String> = albums.iter().map(|a| album_url(a)).collect();
        assert_eq!(names, vec!["beach", "zoo"]);
    }

    #[test]
    fn discover_single_album() {
        let gallery = setup_gallery(&[("zoo", &["a.png"]), ("beach", &["a.png"])]);
        let albums =
            discover_albums(gallery.path(), &PipelineConfig::default(), Some("zoo")).unwrap();
        assert_eq!(albums, vec![gallery.path().join("zoo")]);
    }

    #[test]
    fn discover_unknown_album_errors() {
        let gallery = setup_gallery(&[("zoo", &["a.png"])]);
        let result = discover_albums(gallery.path(), &PipelineConfig::default(), Some("nope"));
        assert!(matches!(result, Err(GalleryError::UnknownAlbum(name)) if name == "nope"));
    }

    #[test]
    fn discover_missing_root_errors() {
        let result = discover_albums(
            Path::new("/nonexistent/gallery"),
            &PipelineConfig::default(),
            None,
        );
        assert!(matches!(result, Err(GalleryError::MissingRoot(_))));
    }

    // =========================================================================
    // run_gallery
    // =========================================================================

    #[test]
    fn scenario_duplicate_stems() {
        let gallery = setup_gallery(&[("trip", &["a.png", "a.jpg", "b.gif"])]);
        let backend = MockBackend::new();
        let vectorizer = MockVectorizer::new();

        let report = run_gallery(
            &backend,
            &vectorizer,
            gallery.path(),
            &PipelineConfig::default(),
            None,
            None,
        )
        .unwrap();

        let album = gallery.path().join("trip");
        assert_eq!(report.albums[0].outcome, Outcome::Complete);
        assert_eq!(report.albums[0].image_count, 3);
        assert_files(&album.join("originals"), &["a.png", "a-A.jpg", "b.gif"]);
        for size in ["tiny", "small", "medium", "large"] {
            let expected: Vec<String> = ["a", "a-A", "b"]
                .iter()
                .map(|stem| format!("{stem}--{size}.jpg"))
                .collect();
            let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
            assert_files(&album.join(size), &expected);
        }
        assert_files(&album.join("svg"), &["a.svg", "a-A.svg", "b.svg"]);
        assert!(album.join("album-1-to-10.json").is_file());
        assert!(album.join("album-11-plus.json").is_file());
    }

    #[test]
    fn fatal_album_does_not_stop_later_albums() {
        let gallery = setup_gallery(&[("b-good", &["a.png"])]);
        fs::create_dir_all(gallery.path().join("a-empty/originals")).unwrap();
        fs::create_dir_all(gallery.path().join("c-no-originals")).unwrap();

        let report = run_gallery(
            &MockBackend::new(),
            &MockVectorizer::new(),
            gallery.path(),
            &PipelineConfig::default(),
            None,
            None,
        )
        .unwrap();

        let outcomes: Vec<(&str, bool)> = report
            .albums
            .iter()
            .map(|a| (a.album.as_str(), a.is_fatal()))
            .collect();
        assert_eq!(
            outcomes,
            vec![("a-empty", true), ("b-good", false), ("c-no-originals", true)]
        );
        assert!(report.has_fatal());
        // Nothing was written for the fatal albums.
        assert!(!gallery.path().join("a-empty/tiny").exists());
        assert!(!gallery.path().join("c-no-originals/svg").exists());
    }

    #[test]
    fn per_file_failures_make_album_partial() {
        let gallery = setup_gallery(&[("trip", &["a.png", "b.gif"])]);
        let backend = MockBackend::failing_on(&["b.gif"]);
        let vectorizer = MockVectorizer::new();

        let report = run_gallery(
            &backend,
            &vectorizer,
            gallery.path(),
            &PipelineConfig::default(),
            None,
            None,
        )
        .unwrap();

        let album = &report.albums[0];
        assert_eq!(album.outcome, Outcome::Partial);
        let stages: Vec<StageId> = album.skipped.iter().map(|s| s.stage.clone()).collect();
        assert_eq!(
            stages,
            vec![
                StageId::Raster("tiny".into()),
                StageId::Raster("small".into()),
                StageId::Raster("medium".into()),
                StageId::Raster("large".into()),
            ]
        );
    }

    #[test]
    fn rerun_clears_stale_outputs() {
        let gallery = setup_gallery(&[("trip", &["a.png"])]);
        let stale = gallery.path().join("trip/tiny/old--tiny.jpg");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        run_gallery(
            &MockBackend::new(),
            &MockVectorizer::new(),
            gallery.path(),
            &PipelineConfig::default(),
            None,
            None,
        )
        .unwrap();

        assert!(!stale.exists());
        assert_files(&gallery.path().join("trip/tiny"), &["a--tiny.jpg"]);
    }

    #[test]
    fn run_emits_album_and_rename_events() {
        let gallery = setup_gallery(&[("trip", &["a.png", "a.jpg"])]);
        let (tx, rx) = mpsc::channel();

        run_gallery(
            &MockBackend::new(),
            &MockVectorizer::new(),
            gallery.path(),
            &PipelineConfig::default(),
            None,
            Some(tx),
        )
        .unwrap();
        let events: Vec<PipelineEvent> = rx.iter().collect();

        assert_eq!(
            events[0],
            PipelineEvent::AlbumStarted {
                album: "trip".into(),
                image_count: 2,
            }
        );
        assert_eq!(
            events[1],
            PipelineEvent::FileRenamed {
                album: "trip".into(),
                from: "a.jpg".into(),
                to: "a-A.jpg".into(),
            }
        );
        assert!(matches!(events.last(), Some(PipelineEvent::MetadataSaved { .. })));
    }

    #[test]
    fn real_backend_run_records_original_dimensions() {
        let gallery = setup_gallery_with_images(&[("trip", &["a.png", "b.jpg"])]);
        let mut config = PipelineConfig::default();
        config.vector.shapes = 12;
        config.vector.work_size = 32;

        let report = run_gallery(
            &RustBackend::new(),
            &StippleVectorizer::new(),
            gallery.path(),
            &config,
            Some("trip"),
            None,
        )
        .unwrap();
        assert_eq!(report.albums[0].outcome, Outcome::Complete);

        let (meta, _) =
            load_album_meta(&gallery.path().join("trip"), &config.metadata).unwrap();
        let dims: Vec<(&str, u32, u32)> = meta
            .images
            .iter()
            .map(|i| (i.file_name.as_str(), i.width, i.height))
            .collect();
        assert_eq!(dims, vec![("a.png", 64, 48), ("b.jpg", 64, 48)]);
        assert_eq!(meta.svg_sequences["a.png"].len(), 12);
    }

    // =========================================================================
    // hydrate_gallery / check_gallery
    // =========================================================================

    #[test]
    fn hydrate_gallery_reports_bad_record_as_fatal() {
        let gallery = setup_gallery(&[("trip", &["a.png"])]);
        fs::write(gallery.path().join("trip/album-meta.json"), "{broken").unwrap();

        let report = hydrate_gallery(
            &MockBackend::new(),
            gallery.path(),
            &PipelineConfig::default(),
            None,
            None,
        )
        .unwrap();
        assert!(report.albums[0].is_fatal());
    }

    #[test]
    fn undecodable_extensions_flags_unknown_types() {
        let mut config = PipelineConfig::default();
        assert!(undecodable_extensions(&config).is_empty());

        config.extensions.push("heic".to_string());
        assert_eq!(undecodable_extensions(&config), vec!["heic"]);
    }

    #[test]
    fn check_plans_renames_without_touching_disk() {
        let gallery = setup_gallery(&[("trip", &["a.png", "a.jpg"])]);
        add_album(gallery.path(), "empty", &[]);

        let report = check_gallery(gallery.path(), &PipelineConfig::default(), None).unwrap();

        assert!(report.albums[0].is_fatal());
        let trip = &report.albums[1];
        assert_eq!(trip.renamed.len(), 1);
        assert_eq!(trip.renamed[0].to, "a-A.jpg");
        assert_files(&gallery.path().join("trip/originals"), &["a.jpg", "a.png"]);
        assert!(!gallery.path().join("trip/tiny").exists());
    }
}
