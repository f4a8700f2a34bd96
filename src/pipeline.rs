//! Per-album conversion stages.
//!
//! An album's pipeline is an explicit, ordered list of [`Stage`]s: one raster
//! batch per configured size (in config order), then vectorization. Stages run
//! strictly one after another; each returns only when every file it was
//! given has reported back.
//!
//! ## Raster batch
//!
//! For one size, every acceptable original is copied into the size directory
//! under its output name (`a.png` → `small/a--small.jpg`) and then resized
//! in place to a JPEG. Files run in parallel on a rayon pool sized by
//! `processing.max_processes`. A failure at either step counts the file as
//! done and leaves no file behind.
//!
//! ## Vectorization
//!
//! Every acceptable original is converted to `svg/<stem>.svg` on a separate
//! pool with exactly `vector.concurrency` threads, so at most that many
//! conversions are in flight (default 1: strictly sequential).
//!
//! ## Progress
//!
//! Both stages send [`PipelineEvent`]s over an optional channel: a start
//! event, one event per finished file carrying the running count, and one
//! completion event after the last file.

use crate::config::{PipelineConfig, SizeConfig, effective_threads};
use crate::imaging::{ImageBackend, Quality, ResizeParams, VectorizeParams, Vectorizer};
use crate::naming::{sized_file_name, vector_file_name};
use crate::types::{SkippedFile, StageId};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Progress events, in the order a run produces them.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    AlbumStarted {
        album: String,
        image_count: usize,
    },
    /// The album was abandoned before or during processing.
    AlbumSkipped {
        album: String,
        reason: String,
    },
    FileRenamed {
        album: String,
        from: String,
        to: String,
    },
    StageStarted {
        album: String,
        stage: StageId,
        total: usize,
    },
    FileDone {
        album: String,
        stage: StageId,
        file: String,
        done: usize,
        total: usize,
    },
    FileFailed {
        album: String,
        stage: StageId,
        file: String,
        reason: String,
        done: usize,
        total: usize,
    },
    /// A vector file left out of the metadata record.
    MetadataSkipped {
        album: String,
        file: String,
        reason: String,
    },
    /// Sent exactly once per stage, after every file has reported.
    StageComplete {
        album: String,
        stage: StageId,
        succeeded: usize,
        failed: usize,
    },
    MetadataSaved {
        album: String,
        image_count: usize,
        pages: Vec<PathBuf>,
    },
}

pub(crate) fn emit(events: Option<&Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}

/// One step of an album's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Raster(SizeConfig),
    Vectorize,
}

impl Stage {
    pub fn id(&self) -> StageId {
        match self {
            Stage::Raster(size) => StageId::Raster(size.name.clone()),
            Stage::Vectorize => StageId::Vector,
        }
    }
}

/// The ordered stage list for `config`: raster sizes, then vectorization.
pub fn stages(config: &PipelineConfig) -> Vec<Stage> {
    config
        .sizes
        .iter()
        .cloned()
        .map(Stage::Raster)
        .chain(std::iter::once(Stage::Vectorize))
        .collect()
}

/// Outcome of one stage over one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: StageId,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Runs the stage list over albums, sharing pools and the event channel.
pub struct AlbumPipeline<'a> {
    backend: &'a dyn ImageBackend,
    vectorizer: &'a dyn Vectorizer,
    config: &'a PipelineConfig,
    raster_pool: ThreadPool,
    vector_pool: ThreadPool,
    events: Option<Sender<PipelineEvent>>,
}

impl<'a> AlbumPipeline<'a> {
    pub fn new(
        backend: &'a dyn ImageBackend,
        vectorizer: &'a dyn Vectorizer,
        config: &'a PipelineConfig,
        events: Option<Sender<PipelineEvent>>,
    ) -> Result<Self, PipelineError> {
        let raster_pool = ThreadPoolBuilder::new()
            .num_threads(effective_threads(&config.processing))
            .build()?;
        let vector_pool = ThreadPoolBuilder::new()
            .num_threads(config.vector.concurrency.max(1))
            .build()?;
        Ok(Self {
            backend,
            vectorizer,
            config,
            raster_pool,
            vector_pool,
            events,
        })
    }

    pub fn backend(&self) -> &'a dyn ImageBackend {
        self.backend
    }

    pub fn config(&self) -> &'a PipelineConfig {
        self.config
    }

    pub fn events(&self) -> Option<&Sender<PipelineEvent>> {
        self.events.as_ref()
    }

    /// Run every stage, in order, over the acceptable originals `files` of `album`.
    pub fn run(&self, album: &Path, files: &[String]) -> Vec<StageReport> {
        stages(self.config)
            .iter()
            .map(|stage| self.run_stage(stage, album, files))
            .collect()
    }

    pub fn run_stage(&self, stage: &Stage, album: &Path, files: &[String]) -> StageReport {
        match stage {
            Stage::Raster(size) => self.raster_pool.install(|| {
                run_size_batch(
                    self.backend,
                    album,
                    files,
                    size,
                    self.config,
                    self.events(),
                )
            }),
            Stage::Vectorize => self.vector_pool.install(|| {
                run_vectorization(self.vectorizer, album, files, self.config, self.events())
            }),
        }
    }
}

/// Run `work` for every file in parallel on the current pool, counting
/// every completion, and report the stage.
fn run_counted<F>(
    album: &Path,
    files: &[String],
    stage: StageId,
    events: Option<&Sender<PipelineEvent>>,
    work: F,
) -> StageReport
where
    F: Fn(&str) -> Result<(), String> + Sync,
{
    let album_name = crate::album_meta::album_url(album);
    let total = files.len();
    emit(
        events,
        PipelineEvent::StageStarted {
            album: album_name.clone(),
            stage: stage.clone(),
            total,
        },
    );

    let done = AtomicUsize::new(0);
    let skipped: Vec<SkippedFile> = files
        .par_iter()
        .filter_map(|file| {
            let result = work(file.as_str());
            let done = done.fetch_add(1, Ordering::SeqCst) + 1;
            match result {
                Ok(()) => {
                    emit(
                        events,
                        PipelineEvent::FileDone {
                            album: album_name.clone(),
                            stage: stage.clone(),
                            file: file.clone(),
                            done,
                            total,
                        },
                    );
                    None
                }
                Err(reason) => {
                    emit(
                        events,
                        PipelineEvent::FileFailed {
                            album: album_name.clone(),
                            stage: stage.clone(),
                            file: file.clone(),
                            reason: reason.clone(),
                            done,
                            total,
                        },
                    );
                    Some(SkippedFile::new(file.as_str(), stage.clone(), reason))
                }
            }
        })
        .collect();

    debug_assert_eq!(done.load(Ordering::SeqCst), total);
    let succeeded = total - skipped.len();
    emit(
        events,
        PipelineEvent::StageComplete {
            album: album_name,
            stage: stage.clone(),
            succeeded,
            failed: skipped.len(),
        },
    );

    StageReport {
        stage,
        total,
        succeeded,
        skipped,
    }
}

/// Produce one raster size for every file. Runs on the caller's rayon pool.
pub fn run_size_batch(
    backend: &dyn ImageBackend,
    album: &Path,
    files: &[String],
    size: &SizeConfig,
    config: &PipelineConfig,
    events: Option<&Sender<PipelineEvent>>,
) -> StageReport {
    let originals = album.join(&config.originals_dir);
    let size_dir = album.join(&size.name);
    let quality = Quality::new(config.images.quality);

    run_counted(
        album,
        files,
        StageId::Raster(size.name.clone()),
        events,
        |file| {
            let staged = size_dir.join(sized_file_name(file, &size.name));
            fs::copy(originals.join(file), &staged)
                .map_err(|e| format!("copy failed: {e}"))?;
            backend
                .resize(&ResizeParams {
                    source: staged.clone(),
                    output: staged.clone(),
                    edge: size.edge,
                    quality,
                })
                .map_err(|e| {
                    let _ = fs::remove_file(&staged);
                    e.to_string()
                })
        },
    )
}

/// Vectorize every file. Runs on the caller's rayon pool, whose thread
/// count bounds how many conversions are in flight.
pub fn run_vectorization(
    vectorizer: &dyn Vectorizer,
    album: &Path,
    files: &[String],
    config: &PipelineConfig,
    events: Option<&Sender<PipelineEvent>>,
) -> StageReport {
    let originals = album.join(&config.originals_dir);
    let vector_dir = album.join(&config.vector.dir);

    run_counted(album, files, StageId::Vector, events, |file| {
        let output = vector_dir.join(vector_file_name(file));
        vectorizer
            .vectorize(&VectorizeParams {
                source: originals.join(file),
                output: output.clone(),
                shapes: config.vector.shapes,
                work_size: config.vector.work_size,
            })
            .map_err(|e| {
                let _ = fs::remove_file(&output);
                e.to_string()
            })
    })
}
