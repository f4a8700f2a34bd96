//! # Gallery Ingest
//!
//! Batch conversion for photo-gallery albums. A gallery root holds one
//! directory per album; each album keeps its photos in `originals/`. The
//! pipeline turns those into resized JPEG variants, an ellipse-only SVG
//! rendering per photo, and a paginated JSON metadata record the gallery
//! site reads.
//!
//! # Architecture: Per-Album Pipeline
//!
//! ```text
//! 1. Survey     originals/  →  acceptable image count (fatal if none)
//! 2. Collide    a.png a.jpg →  a.png a-A.jpg          (unique stems)
//! 3. Reconcile  tiny/ ... svg/ emptied and recreated
//! 4. Raster     originals/  →  tiny/ small/ medium/ large/   (parallel per size)
//! 5. Vectorize  originals/  →  svg/                          (bounded pool)
//! 6. Hydrate    svg/        →  album-1-to-10.json, album-11-plus.json
//! ```
//!
//! Sizes run strictly in configured order and all of them finish before
//! vectorization starts. Albums run one at a time; a fatal problem in one
//! album never stops the next.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gallery`] | Album discovery and the per-album orchestration above |
//! | [`pipeline`] | Raster size batches, vectorization, progress events |
//! | [`hydrate`] | Merges parsed SVG sequences into the album metadata |
//! | [`album_meta`] | Metadata record model, legacy/paged loading, pagination |
//! | [`svg`] | Ellipse SVG dialect: parser and writer |
//! | [`collision`] | Duplicate-stem detection and suffix renames |
//! | [`reconcile`] | Album survey and output directory reset |
//! | [`naming`] | Filename helpers (extension swap, size variants) |
//! | [`listing`] | Sorted single-level directory listing |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`imaging`] | Image backend and vectorizer traits with pure-Rust implementations |
//! | [`types`] | Album and gallery reports |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Outputs Are Disposable
//!
//! Every output directory is wiped at the start of an album run, so a run
//! never mixes fresh and stale variants. The metadata record is the
//! exception: hydration merges into it, which is what lets hand-written
//! titles and descriptions survive regeneration.
//!
//! ## Pure-Rust Imaging
//!
//! Resizing and the default stipple vectorizer use the `image` crate only.
//! The `primitive` engine shells out to an external binary when better
//! shape fitting is wanted; it sits behind the same [`imaging::Vectorizer`]
//! trait, as does the recording mock the tests use.

pub mod album_meta;
pub mod collision;
pub mod config;
pub mod gallery;
pub mod hydrate;
pub mod imaging;
pub mod listing;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod svg;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
