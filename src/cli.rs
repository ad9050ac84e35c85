// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to analyze
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// Directory holding the per-revision histogram cache
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Regex matched against file paths; matching files are excluded
    /// from the report (repeatable)
    #[arg(short = 'x', long = "exclude")]
    pub excludes: Vec<String>,

    /// Print a header row naming the cutoff years
    #[arg(long)]
    pub header: bool,

    /// Report additional debugging while processing
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Cache directory, defaulting to ~/.cache/codeage.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("codeage")
        })
    }
}
