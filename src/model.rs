// src/model.rs

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// Maps a committer timestamp (epoch seconds) to the number of lines in
/// one file that were last modified by a commit with that timestamp.
pub type FileHistogram = BTreeMap<i64, u64>;

/// The complete per-line age information for one revision: every file
/// present in the tag's tree maps to its timestamp histogram.
pub type RevisionHistogram = BTreeMap<String, FileHistogram>;

/// One emitted record: a revision's as-of date plus one line count per
/// configured year cutoff. Rebuilt on every run, never cached, so
/// exclusion-rule and cutoff changes take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub counts: Vec<u64>,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))?;
        for count in &self.counts {
            write!(f, ";{}", count)?;
        }
        Ok(())
    }
}

/// Total line count across every file in a revision histogram.
pub fn total_lines(histogram: &RevisionHistogram) -> u64 {
    histogram.values().flat_map(|hist| hist.values()).sum()
}
