//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging the gallery's `config.toml`. Stock
//! defaults are overridden by an optional `config.toml` placed in the gallery
//! root. Every component receives the resolved [`PipelineConfig`] explicitly,
//! so tests can hand in small synthetic configurations.
//!
//! ## Config File Location
//!
//! ```text
//! gallery/
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── app/                     # Skipped (see `skip_dirs`)
//! ├── italy-2019/              # Album
//! │   └── originals/
//! └── winter/                  # Album
//!     └── originals/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! originals_dir = "originals"           # Source images inside each album
//! skip_dirs = ["app"]                   # Gallery entries that are never albums
//! extensions = ["png", "jpg", "jpeg", "gif"]  # Acceptable types (case-sensitive)
//!
//! [[sizes]]                             # Raster sizes, processed in this order
//! name = "tiny"
//! edge = 64                             # Longer edge in pixels
//!
//! [images]
//! quality = 80                          # JPEG quality (1-100)
//!
//! [vector]
//! dir = "svg"                           # Vector output directory name
//! engine = "stipple"                    # "stipple" (built in) or "primitive"
//! shapes = 200                          # Ellipses per image
//! work_size = 256                       # Longer edge the vectorizer samples at
//! concurrency = 1                       # Max vectorizations in flight
//! primitive_bin = "primitive"           # Binary used by the primitive engine
//!
//! [metadata]
//! page_size = 10                        # Images in the first page
//! legacy_file = "album-meta.json"       # Unsplit record from older runs
//! original_lookup = ["jpg", "jpeg", "png", "gif"]
//!
//! [processing]
//! max_processes = 4                     # Omit for auto = CPU cores
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory inside each album holding the source images.
    pub originals_dir: String,
    /// Gallery root entries that are never treated as albums.
    pub skip_dirs: Vec<String>,
    /// Acceptable image extensions, without the dot. Matched case-sensitively.
    pub extensions: Vec<String>,
    /// Raster sizes in processing order.
    pub sizes: Vec<SizeConfig>,
    /// Raster encoding settings.
    pub images: ImagesConfig,
    /// Vectorization settings.
    pub vector: VectorConfig,
    /// Metadata record settings.
    pub metadata: MetadataConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            originals_dir: "originals".to_string(),
            skip_dirs: vec!["app".to_string()],
            extensions: ["png", "jpg", "jpeg", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
            sizes: vec![
                SizeConfig::new("tiny", 64),
                SizeConfig::new("small", 480),
                SizeConfig::new("medium", 1024),
                SizeConfig::new("large", 1920),
            ],
            images: ImagesConfig::default(),
            vector: VectorConfig::default(),
            metadata: MetadataConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sizes.is_empty() {
            return Err(ConfigError::Validation("sizes must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for size in &self.sizes {
            if size.name.is_empty() {
                return Err(ConfigError::Validation("size names must not be empty".into()));
            }
            if !seen.insert(size.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate size name: {}",
                    size.name
                )));
            }
            if size.name == self.originals_dir || size.name == self.vector.dir {
                return Err(ConfigError::Validation(format!(
                    "size name '{}' collides with another album directory",
                    size.name
                )));
            }
            if size.edge == 0 {
                return Err(ConfigError::Validation(format!(
                    "sizes.{}.edge must be non-zero",
                    size.name
                )));
            }
        }
        if self.originals_dir.is_empty() || self.vector.dir.is_empty() {
            return Err(ConfigError::Validation(
                "originals_dir and vector.dir must not be empty".into(),
            ));
        }
        if self.originals_dir == self.vector.dir {
            return Err(ConfigError::Validation(
                "originals_dir and vector.dir must differ".into(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        if self.metadata.original_lookup.is_empty() {
            return Err(ConfigError::Validation(
                "metadata.original_lookup must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.vector.concurrency == 0 {
            return Err(ConfigError::Validation(
                "vector.concurrency must be at least 1".into(),
            ));
        }
        if self.vector.shapes == 0 || self.vector.work_size == 0 {
            return Err(ConfigError::Validation(
                "vector.shapes and vector.work_size must be non-zero".into(),
            ));
        }
        if self.metadata.page_size == 0 {
            return Err(ConfigError::Validation(
                "metadata.page_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Names of every output directory the reconciler manages, raster sizes
    /// first, then the vector directory.
    pub fn output_dirs(&self) -> Vec<&str> {
        self.sizes
            .iter()
            .map(|s| s.name.as_str())
            .chain(std::iter::once(self.vector.dir.as_str()))
            .collect()
    }
}

/// One raster breakpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeConfig {
    /// Identifier, also the output directory name and filename marker.
    pub name: String,
    /// Longer edge of the output in pixels. Smaller originals are not upscaled.
    pub edge: u32,
}

impl SizeConfig {
    pub fn new(name: &str, edge: u32) -> Self {
        Self {
            name: name.to_string(),
            edge,
        }
    }
}

/// Raster encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

/// Which vectorizer turns originals into SVG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorEngine {
    /// Built-in dot-stipple vectorizer.
    Stipple,
    /// External `primitive` binary in ellipse mode.
    Primitive,
}

/// Vectorization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VectorConfig {
    pub dir: String,
    pub engine: VectorEngine,
    /// Number of ellipses drawn per image.
    pub shapes: u32,
    /// Longer edge the source is downsampled to before sampling.
    pub work_size: u32,
    /// Maximum vectorizations running at once.
    pub concurrency: usize,
    pub primitive_bin: String,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            dir: "svg".to_string(),
            engine: VectorEngine::Stipple,
            shapes: 200,
            work_size: 256,
            concurrency: 1,
            primitive_bin: "primitive".to_string(),
        }
    }
}

/// Metadata record settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Number of images in the first page; the rest go to the second.
    pub page_size: usize,
    /// Unsplit record written by older versions. Read if present, never written.
    pub legacy_file: String,
    /// Extensions tried, in order, when matching a vector file to its original.
    pub original_lookup: Vec<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            legacy_file: "album-meta.json".to_string(),
            original_lookup: ["jpg", "jpeg", "png", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so an
///   overlay `[[sizes]]` list replaces the whole default list.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the gallery root.
pub fn load_config(root: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Ingest Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file in the gallery root.
# Unknown keys will cause an error.

# Directory inside each album that holds the source images.
originals_dir = "originals"

# Gallery root entries that are never treated as albums.
skip_dirs = ["app"]

# Acceptable image extensions (case-sensitive, without the dot).
extensions = ["png", "jpg", "jpeg", "gif"]

# ---------------------------------------------------------------------------
# Raster sizes
# ---------------------------------------------------------------------------
# Processed in the order listed. Each name is both the output directory and
# the filename marker: photo.png -> <album>/small/photo--small.jpg
# edge is the longer edge in pixels; smaller originals are not upscaled.
# Listing [[sizes]] replaces the whole default list.

[[sizes]]
name = "tiny"
edge = 64

[[sizes]]
name = "small"
edge = 480

[[sizes]]
name = "medium"
edge = 1024

[[sizes]]
name = "large"
edge = 1920

# ---------------------------------------------------------------------------
# Raster encoding
# ---------------------------------------------------------------------------
[images]
# JPEG quality (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Vectorization
# ---------------------------------------------------------------------------
[vector]
# Output directory for <stem>.svg files.
dir = "svg"

# "stipple" uses the built-in dot-stipple vectorizer.
# "primitive" runs the external `primitive` binary in ellipse mode.
engine = "stipple"

# Ellipses drawn per image.
shapes = 200

# Longer edge (px) the source is downsampled to before sampling.
work_size = 256

# Vectorizations running at once. Vectorizing is CPU heavy; keep this low.
concurrency = 1

# Binary used by the primitive engine.
primitive_bin = "primitive"

# ---------------------------------------------------------------------------
# Metadata
# ---------------------------------------------------------------------------
[metadata]
# Images in the first page (album-1-to-N.json); the rest go to
# album-(N+1)-plus.json.
page_size = 10

# Unsplit record from older runs. Read when present, never written.
legacy_file = "album-meta.json"

# Extensions tried, in order, when matching <stem>.svg back to its original.
original_lookup = ["jpg", "jpeg", "png", "gif"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel resize workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
