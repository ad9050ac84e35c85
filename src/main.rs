// src/main.rs

mod aggregate;
mod annotate;
mod cache;
mod cli;
mod gateway;
mod model;
mod report;
mod tags;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::Parser;
use cli::Args;
use regex::Regex;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("codeage=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let excludes = report::compile_excludes(&args.excludes)?;
    let gateway = gateway::Gateway::open(&args.repo)?;
    let cache = cache::CacheStore::open(&args.cache_path())?;

    let releases = tags::select_releases(&gateway.list_tags()?);
    let (Some(first), Some(last)) = (releases.first(), releases.last()) else {
        bail!("no release tags found in {:?}", args.repo);
    };
    let cutoffs = tags::year_cutoffs(
        gateway.commit_timestamp(first)?,
        gateway.commit_timestamp(last)?,
    )?;

    if args.header {
        println!("{}", report::header(&cutoffs));
    }

    // Revisions are independent; one failing to resolve or list must not
    // take down the rest of the run.
    for tag in &releases {
        match process_revision(&gateway, &cache, tag, &excludes, &cutoffs) {
            Ok(row) => println!("{}", row),
            Err(e) => error!(tag = %tag, "skipping revision: {e:#}"),
        }
    }
    Ok(())
}

/// Resolve one tag's as-of date, aggregate its histogram (cached or
/// fresh) and derive its report row.
fn process_revision(
    gateway: &gateway::Gateway,
    cache: &cache::CacheStore,
    tag: &str,
    excludes: &[Regex],
    cutoffs: &[(i32, i64)],
) -> Result<model::ReportRow> {
    let stamp = gateway.commit_timestamp(tag)?;
    let date = Utc
        .timestamp_opt(stamp, 0)
        .single()
        .with_context(|| format!("bad commit timestamp for {}", tag))?
        .date_naive();

    let histogram = aggregate::aggregate_revision(gateway, cache, tag)?;
    Ok(report::report_revision(&histogram, excludes, cutoffs, date))
}
