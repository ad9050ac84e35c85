// src/annotate.rs

use crate::gateway;
use crate::model::FileHistogram;
use anyhow::Result;
use git2::Repository;

/// Tally per-line modification timestamps for one file at one tag.
/// Pure apart from the blame query itself, so many files of the same
/// revision can be annotated concurrently.
pub fn annotate_file(repo: &Repository, tag: &str, file: &str) -> Result<FileHistogram> {
    let mut hist = FileHistogram::new();
    for stamp in gateway::annotate_lines(repo, tag, file)? {
        *hist.entry(stamp).or_insert(0) += 1;
    }
    Ok(hist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{commit_file, init_repo, tag_head};

    #[test]
    fn tallies_lines_by_timestamp() -> Result<()> {
        let (_dir, repo) = init_repo()?;
        commit_file(&repo, "a.c", "one\ntwo\nthree\n", 1_000_000)?;
        commit_file(&repo, "a.c", "one\ntwo\nthree\nfour\nfive\n", 2_000_000)?;
        tag_head(&repo, "v1.0")?;

        let hist = annotate_file(&repo, "v1.0", "a.c")?;
        assert_eq!(hist.get(&1_000_000), Some(&3));
        assert_eq!(hist.get(&2_000_000), Some(&2));
        Ok(())
    }

    #[test]
    fn empty_file_yields_empty_histogram() -> Result<()> {
        let (_dir, repo) = init_repo()?;
        commit_file(&repo, "empty.c", "", 1_000_000)?;
        tag_head(&repo, "v1.0")?;

        let hist = annotate_file(&repo, "v1.0", "empty.c")?;
        assert!(hist.is_empty());
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() -> Result<()> {
        let (_dir, repo) = init_repo()?;
        commit_file(&repo, "a.c", "one\n", 1_000_000)?;
        tag_head(&repo, "v1.0")?;

        assert!(annotate_file(&repo, "v1.0", "missing.c").is_err());
        Ok(())
    }
}
