// src/tags.rs

use anyhow::{bail, Context, Result};
use chrono::{Datelike, TimeZone, Utc};

/// Tags that look like releases but are known to be bogus.
const SKIP_TAGS: &[&str] = &["v2.6.11"];

/// Numeric components of a release tag. `None` for anything that is
/// not a plain dotted-number tag.
fn version_components(tag: &str) -> Option<Vec<u64>> {
    tag.strip_prefix('v')?
        .split('.')
        .map(|part| part.parse().ok())
        .collect()
}

/// Whether a tag marks a genuine release: `vX.Y` mainline releases plus
/// the historical three-component `v2.6.Z` line. Anything with a `-`
/// (release candidates) and three-component stable point releases are
/// dropped.
fn is_release_tag(tag: &str) -> bool {
    if !tag.starts_with('v') || tag.contains('-') || SKIP_TAGS.contains(&tag) {
        return false;
    }
    let Some(components) = version_components(tag) else {
        return false;
    };
    components.len() == 2
        || (components.len() == 3 && components[0] == 2 && components[1] == 6)
}

/// Filter the raw tag list down to release tags, ordered by numeric
/// version precedence (v2.6.9 sorts before v2.6.10, unlike text order).
pub fn select_releases(tags: &[String]) -> Vec<String> {
    let mut releases: Vec<String> = tags
        .iter()
        .filter(|tag| is_release_tag(tag))
        .cloned()
        .collect();
    releases.sort_by_key(|tag| version_components(tag).unwrap_or_default());
    releases
}

/// Yearly reporting cutoffs spanning the selected releases: one per
/// calendar year from the year after the first release's commit through
/// the year after the last one's, as (year, epoch seconds of Jan 1 UTC).
pub fn year_cutoffs(first_stamp: i64, last_stamp: i64) -> Result<Vec<(i32, i64)>> {
    let first_year = year_of(first_stamp)? + 1;
    let last_year = year_of(last_stamp)? + 1;
    if last_year < first_year {
        bail!("release timestamps out of order ({first_stamp} after {last_stamp})");
    }
    (first_year..=last_year)
        .map(|year| {
            let instant = Utc
                .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
                .single()
                .with_context(|| format!("invalid cutoff year {year}"))?;
            Ok((year, instant.timestamp()))
        })
        .collect()
}

fn year_of(stamp: i64) -> Result<i32> {
    Ok(Utc
        .timestamp_opt(stamp, 0)
        .single()
        .context("commit timestamp out of range")?
        .year())
}
