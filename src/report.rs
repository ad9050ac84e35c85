// src/report.rs

use crate::model::{FileHistogram, ReportRow, RevisionHistogram};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;

/// Compile exclusion patterns up front. A malformed pattern would
/// silently change every report row, so this must fail before any
/// revision is processed.
pub fn compile_excludes(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .with_context(|| format!("invalid exclude pattern {:?}", pattern))
        })
        .collect()
}

fn excluded(path: &str, excludes: &[Regex]) -> bool {
    excludes.iter().any(|re| re.is_match(path))
}

/// Lines last modified strictly before a single cutoff instant.
fn lines_before(hist: &FileHistogram, cutoff: i64) -> u64 {
    hist.range(..cutoff).map(|(_, &count)| count).sum()
}

/// For each cutoff, the number of non-excluded lines older than it.
/// Pure function of its inputs: exclusion or cutoff changes take
/// effect without re-annotating anything.
pub fn count_lines_before(
    histogram: &RevisionHistogram,
    excludes: &[Regex],
    cutoffs: &[i64],
) -> Vec<u64> {
    let mut counts = vec![0u64; cutoffs.len()];
    for (path, hist) in histogram {
        if excluded(path, excludes) {
            continue;
        }
        for (i, &cutoff) in cutoffs.iter().enumerate() {
            counts[i] += lines_before(hist, cutoff);
        }
    }
    counts
}

/// Build the report row for one revision.
pub fn report_revision(
    histogram: &RevisionHistogram,
    excludes: &[Regex],
    cutoffs: &[(i32, i64)],
    date: NaiveDate,
) -> ReportRow {
    let instants: Vec<i64> = cutoffs.iter().map(|&(_, instant)| instant).collect();
    ReportRow {
        date,
        counts: count_lines_before(histogram, excludes, &instants),
    }
}

/// Header row naming the cutoff years, matching the row format.
pub fn header(cutoffs: &[(i32, i64)]) -> String {
    let mut row = String::from("date");
    for &(year, _) in cutoffs {
        row.push_str(&format!(";{}", year));
    }
    row
}
