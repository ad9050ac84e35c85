// src/aggregate.rs

use crate::annotate;
use crate::cache::CacheStore;
use crate::gateway::Gateway;
use crate::model::{total_lines, RevisionHistogram};
use anyhow::Result;
use git2::Repository;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Produce the full per-line age histogram for one tag.
///
/// A cached histogram is returned unchanged without any annotation
/// calls. Otherwise every file in the tag's tree is annotated across
/// the rayon pool, the per-file results are merged (each path appears
/// exactly once, so the union has no collisions) and the result is
/// persisted before returning.
pub fn aggregate_revision(
    gateway: &Gateway,
    cache: &CacheStore,
    tag: &str,
) -> Result<RevisionHistogram> {
    if let Some(histogram) = cache.load(tag) {
        debug!(tag = %tag, "cache hit");
        return Ok(histogram);
    }

    let files = gateway.list_files(tag)?;
    debug!(tag = %tag, files = files.len(), "annotating");

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_message(format!("Annotating {}", tag));

    let repo_path = gateway.path().to_path_buf();
    let histogram: RevisionHistogram = files
        .par_iter()
        .progress_with(bar)
        .map(|file| {
            // Each worker opens its own handle; Repository is not Sync.
            let hist = Repository::open(&repo_path)
                .map_err(anyhow::Error::from)
                .and_then(|repo| annotate::annotate_file(&repo, tag, file))
                .unwrap_or_else(|e| {
                    // Binary and otherwise unannotatable files degrade to
                    // an empty histogram instead of aborting the revision.
                    debug!(tag = %tag, file = %file, "annotation failed: {e:#}");
                    Default::default()
                });
            (file.clone(), hist)
        })
        .collect();

    debug!(tag = %tag, lines = total_lines(&histogram), "aggregation complete");

    // A failed write is not fatal: the in-memory histogram still feeds
    // this run's report row, the next run just re-annotates.
    if let Err(e) = cache.save(tag, &histogram) {
        warn!(tag = %tag, "failed to persist histogram: {e:#}");
    }
    Ok(histogram)
}
