// src/cache.rs

use crate::model::RevisionHistogram;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Cache format version - bump when the entry schema changes.
const CACHE_VERSION: u32 = 1;

/// One persisted revision histogram.
#[derive(Debug, Serialize, Deserialize)]
struct CachedRevision {
    version: u32,
    tag: String,
    files: RevisionHistogram,
}

/// Durable store of aggregated revision histograms, one JSON file per
/// tag so a write for one revision can never corrupt another's entry.
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create cache directory {:?}", dir))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn entry_path(&self, tag: &str) -> PathBuf {
        // Tag names may contain path separators (e.g. release/v1.0).
        let safe = tag.replace(['/', '\\'], "_");
        self.dir.join(format!("{}.json", safe))
    }

    /// Load a revision's histogram. A missing, unparsable or
    /// version-mismatched entry is a miss; the caller re-aggregates and
    /// overwrites it.
    pub fn load(&self, tag: &str) -> Option<RevisionHistogram> {
        let data = fs::read_to_string(self.entry_path(tag)).ok()?;
        let entry: CachedRevision = match serde_json::from_str(&data) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(tag = %tag, "discarding corrupt cache entry: {e}");
                return None;
            }
        };
        if entry.version != CACHE_VERSION {
            warn!(
                tag = %tag,
                "cache version mismatch (got {}, expected {}), re-annotating",
                entry.version,
                CACHE_VERSION
            );
            return None;
        }
        Some(entry.files)
    }

    /// Persist a revision's histogram. Serialized to a temp file and
    /// renamed into place so a later run never observes a torn entry.
    pub fn save(&self, tag: &str, files: &RevisionHistogram) -> Result<()> {
        let entry = CachedRevision {
            version: CACHE_VERSION,
            tag: tag.to_string(),
            files: files.clone(),
        };
        let data = serde_json::to_string(&entry)?;

        let path = self.entry_path(tag);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)
            .with_context(|| format!("failed to write cache entry for {}", tag))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to store cache entry for {}", tag))?;
        Ok(())
    }
}
