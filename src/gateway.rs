// src/gateway.rs

use anyhow::{Context, Result};
use git2::{BlameOptions, ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only queries against one git repository. Nothing here mutates
/// the repository or holds shared mutable state.
pub struct Gateway {
    repo: Repository,
    repo_path: PathBuf,
}

impl Gateway {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("failed to open git repository at {:?}", path))?;
        let repo_path = repo.workdir().unwrap_or(repo.path()).to_path_buf();
        Ok(Self { repo, repo_path })
    }

    /// Discovered repository path, for workers that open their own
    /// handles (`Repository` is not `Sync`).
    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    /// All tag names, in no particular order.
    pub fn list_tags(&self) -> Result<Vec<String>> {
        let names = self.repo.tag_names(None)?;
        Ok(names.iter().flatten().map(String::from).collect())
    }

    /// Author timestamp (epoch seconds) of the commit a tag points at.
    /// This is the tag's as-of instant; per-line ages use committer
    /// times instead, matching what blame attributes.
    pub fn commit_timestamp(&self, tag: &str) -> Result<i64> {
        let commit = self
            .repo
            .revparse_single(tag)
            .with_context(|| format!("cannot resolve {}", tag))?
            .peel_to_commit()
            .with_context(|| format!("{} does not point at a commit", tag))?;
        let seconds = commit.author().when().seconds();
        Ok(seconds)
    }

    /// Every blob path in the tag's tree.
    pub fn list_files(&self, tag: &str) -> Result<Vec<String>> {
        let commit = self
            .repo
            .revparse_single(tag)
            .with_context(|| format!("cannot resolve {}", tag))?
            .peel_to_commit()
            .with_context(|| format!("{} does not point at a commit", tag))?;
        let tree = commit.tree()?;

        let mut files = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    files.push(format!("{}{}", root, name));
                }
            }
            TreeWalkResult::Ok
        })?;
        Ok(files)
    }

    /// Per-line committer timestamps for one file as it exists at a tag.
    pub fn annotate_lines(&self, tag: &str, file: &str) -> Result<Vec<i64>> {
        annotate_lines(&self.repo, tag, file)
    }
}

/// Blame one file at one tag with a caller-provided repository handle,
/// so parallel workers can each bring their own. Returns one committer
/// timestamp per line; lines whose commit cannot be resolved (partial
/// history, boundary commits) carry no timestamp and are skipped.
/// Binary blobs yield an empty sequence, matching git annotate.
pub fn annotate_lines(repo: &Repository, tag: &str, file: &str) -> Result<Vec<i64>> {
    let commit = repo
        .revparse_single(tag)
        .with_context(|| format!("cannot resolve {}", tag))?
        .peel_to_commit()
        .with_context(|| format!("{} does not point at a commit", tag))?;

    let blob = commit
        .tree()?
        .get_path(Path::new(file))
        .with_context(|| format!("{} is not present at {}", file, tag))?
        .to_object(repo)?
        .peel_to_blob()
        .with_context(|| format!("{} is not a regular file at {}", file, tag))?;
    if blob.is_binary() {
        debug!(file = %file, "binary file, no annotations");
        return Ok(Vec::new());
    }

    let mut opts = BlameOptions::new();
    opts.newest_commit(commit.id());
    let blame = repo
        .blame_file(Path::new(file), Some(&mut opts))
        .with_context(|| format!("failed to blame {} at {}", file, tag))?;

    let mut stamps = Vec::new();
    for hunk in blame.iter() {
        let lines = hunk.lines_in_hunk();
        match repo.find_commit(hunk.final_commit_id()) {
            Ok(commit) => {
                stamps.extend(std::iter::repeat(commit.time().seconds()).take(lines));
            }
            Err(_) => debug!(file = %file, lines, "skipping unattributable lines"),
        }
    }
    Ok(stamps)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use git2::{Signature, Time};
    use std::fs;
    use tempfile::TempDir;

    pub(crate) fn init_repo() -> Result<(TempDir, Repository)> {
        let dir = TempDir::new()?;
        let repo = Repository::init(dir.path())?;
        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;
        Ok((dir, repo))
    }

    pub(crate) fn commit_file(
        repo: &Repository,
        name: &str,
        content: &str,
        epoch: i64,
    ) -> Result<()> {
        let workdir = repo.workdir().context("bare test repo")?;
        if let Some(parent) = Path::new(name).parent() {
            fs::create_dir_all(workdir.join(parent))?;
        }
        fs::write(workdir.join(name), content)?;

        let sig = Signature::new("Test User", "test@example.com", &Time::new(epoch, 0))?;
        let tree_id = {
            let mut index = repo.index()?;
            index.add_path(Path::new(name))?;
            index.write()?;
            index.write_tree()?
        };
        let tree = repo.find_tree(tree_id)?;
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, &format!("add {}", name), &tree, &parents)?;
        Ok(())
    }

    pub(crate) fn tag_head(repo: &Repository, name: &str) -> Result<()> {
        let head = repo.revparse_single("HEAD")?;
        repo.tag_lightweight(name, &head, false)?;
        Ok(())
    }

    #[test]
    fn lists_created_tags() -> Result<()> {
        let (dir, repo) = init_repo()?;
        commit_file(&repo, "a.c", "one\n", 1_000_000)?;
        tag_head(&repo, "v1.0")?;
        commit_file(&repo, "b.c", "two\n", 2_000_000)?;
        tag_head(&repo, "v2.0")?;

        let gateway = Gateway::open(dir.path())?;
        let mut tags = gateway.list_tags()?;
        tags.sort();
        assert_eq!(tags, vec!["v1.0", "v2.0"]);
        Ok(())
    }

    #[test]
    fn commit_timestamp_is_the_author_time() -> Result<()> {
        let (dir, repo) = init_repo()?;
        commit_file(&repo, "a.c", "one\n", 1_000_000)?;
        // Author and committer times diverge, e.g. after a rebase; the
        // as-of date follows the author.
        let author = Signature::new("Test User", "test@example.com", &Time::new(1_234_567, 0))?;
        let committer = Signature::new("Test User", "test@example.com", &Time::new(9_999_999, 0))?;
        let parent = repo.head()?.peel_to_commit()?;
        let tree = parent.tree()?;
        repo.commit(Some("HEAD"), &author, &committer, "rebased", &tree, &[&parent])?;
        tag_head(&repo, "v1.0")?;

        let gateway = Gateway::open(dir.path())?;
        assert_eq!(gateway.commit_timestamp("v1.0")?, 1_234_567);
        assert!(gateway.commit_timestamp("v9.9").is_err());
        Ok(())
    }

    #[test]
    fn lists_files_at_the_tagged_tree() -> Result<()> {
        let (dir, repo) = init_repo()?;
        commit_file(&repo, "a.c", "one\n", 1_000_000)?;
        commit_file(&repo, "sub/b.c", "two\n", 1_000_100)?;
        tag_head(&repo, "v1.0")?;
        // Added after the tag; must not show up at v1.0.
        commit_file(&repo, "later.c", "three\n", 2_000_000)?;

        let gateway = Gateway::open(dir.path())?;
        let mut files = gateway.list_files("v1.0")?;
        files.sort();
        assert_eq!(files, vec!["a.c", "sub/b.c"]);
        Ok(())
    }

    #[test]
    fn annotates_one_timestamp_per_line() -> Result<()> {
        let (dir, repo) = init_repo()?;
        commit_file(&repo, "a.c", "one\ntwo\nthree\n", 1_000_000)?;
        tag_head(&repo, "v1.0")?;

        let gateway = Gateway::open(dir.path())?;
        let stamps = gateway.annotate_lines("v1.0", "a.c")?;
        assert_eq!(stamps, vec![1_000_000, 1_000_000, 1_000_000]);
        Ok(())
    }

    #[test]
    fn annotates_at_the_tag_not_at_head() -> Result<()> {
        let (dir, repo) = init_repo()?;
        commit_file(&repo, "a.c", "one\ntwo\n", 1_000_000)?;
        tag_head(&repo, "v1.0")?;
        commit_file(&repo, "a.c", "one\ntwo\nthree\nfour\n", 2_000_000)?;

        let gateway = Gateway::open(dir.path())?;
        assert_eq!(gateway.annotate_lines("v1.0", "a.c")?.len(), 2);
        assert_eq!(gateway.annotate_lines("HEAD", "a.c")?.len(), 4);
        Ok(())
    }

    #[test]
    fn binary_files_yield_no_annotations() -> Result<()> {
        let (dir, repo) = init_repo()?;
        commit_file(&repo, "blob.bin", "a\0b\0c\n", 1_000_000)?;
        tag_head(&repo, "v1.0")?;

        let gateway = Gateway::open(dir.path())?;
        assert_eq!(gateway.annotate_lines("v1.0", "blob.bin")?, Vec::<i64>::new());
        Ok(())
    }

    #[test]
    fn annotating_a_missing_file_fails() -> Result<()> {
        let (dir, repo) = init_repo()?;
        commit_file(&repo, "a.c", "one\n", 1_000_000)?;
        tag_head(&repo, "v1.0")?;

        let gateway = Gateway::open(dir.path())?;
        assert!(gateway.annotate_lines("v1.0", "nope.c").is_err());
        Ok(())
    }
}
