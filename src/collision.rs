//! Duplicate-stem resolution for an album's originals.
//!
//! Output files are named after the original's stem (`a.png` and `a.jpg`
//! would both produce `a--tiny.jpg` and `a.svg`), so stems must be unique
//! within one originals directory before any output is written.
//!
//! The first file seen with a stem keeps its name. Every later file with the
//! same stem is renamed to `stem-SUFFIX.ext`, taking the first suffix from
//! the sequence below whose resulting stem is not already in use:
//!
//! ```text
//! A B C … Z   AA BB … ZZ   AAA BBB … ZZZ   AAAA … ZZZZ
//! ```
//!
//! That is 104 suffixes per stem; needing a 105th is an error. The full plan
//! is computed before any rename so exhaustion leaves the directory untouched.
//!
//! Which file counts as "first" is decided by [`discovery_order`]: files are
//! ranked by the position of their extension in the allow-list, then by
//! name, so `a.png` keeps its name over `a.jpg` under the default
//! `["png", "jpg", "jpeg", "gif"]`.

use crate::naming::split_name;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollisionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Ran out of rename suffixes for stem '{0}'")]
    SuffixesExhausted(String),
}

/// A planned rename within one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// The ordered rename suffix sequence (104 entries).
pub fn suffixes() -> Vec<String> {
    (1..=4)
        .flat_map(|repeat| {
            ('A'..='Z').map(move |letter| letter.to_string().repeat(repeat))
        })
        .collect()
}

/// Order `names` for collision resolution.
///
/// Stable: names with the same extension rank keep their relative order.
/// Extensions outside the allow-list rank after every listed one.
pub fn discovery_order(names: &[String], extensions: &[String]) -> Vec<String> {
    let rank = |name: &String| {
        let (_, ext) = split_name(name);
        let ext = ext.strip_prefix('.').unwrap_or_default();
        extensions
            .iter()
            .position(|allowed| allowed == ext)
            .unwrap_or(extensions.len())
    };
    let mut ordered = names.to_vec();
    ordered.sort_by_key(rank);
    ordered
}

/// Plan the renames needed to make every stem in `names` unique.
///
/// `names` is taken in the given order; the first occurrence of each stem is
/// canonical. Pure: touches nothing on disk.
pub fn plan_renames(names: &[String]) -> Result<Vec<Rename>, CollisionError> {
    let mut known: HashSet<String> = HashSet::new();
    let mut dupes = Vec::new();

    for name in names {
        let (stem, ext) = split_name(name);
        if !known.insert(stem.clone()) {
            dupes.push((name, stem, ext));
        }
    }

    let suffixes = suffixes();
    let mut renames = Vec::with_capacity(dupes.len());
    for (name, stem, ext) in dupes {
        let replacement = suffixes
            .iter()
            .map(|suffix| format!("{stem}-{suffix}"))
            .find(|candidate| !known.contains(candidate))
            .ok_or_else(|| CollisionError::SuffixesExhausted(stem.clone()))?;
        known.insert(replacement.clone());
        renames.push(Rename {
            from: name.clone(),
            to: format!("{replacement}{ext}"),
        });
    }

    Ok(renames)
}

/// Resolve stem collisions among `names` inside `dir`, renaming on disk.
///
/// Returns the renames performed, in the order they were applied.
pub fn resolve_collisions(dir: &Path, names: &[String]) -> Result<Vec<Rename>, CollisionError> {
    let renames = plan_renames(names)?;
    for rename in &renames {
        std::fs::rename(dir.join(&rename.from), dir.join(&rename.to))?;
    }
    Ok(renames)
}
