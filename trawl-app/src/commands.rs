//! CLI surface and subcommand implementations.
//!
//! Everything here is thin wiring: load config, construct the client, call
//! into the library crates, tally outcomes. Unknown feed names fail before
//! any network activity; per-page failures are logged and skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::seq::SliceRandom;
use tracing::{info, warn};

use trawl_common::CandidatePage;
use trawl_config::FeedConfigLoader;
use trawl_http::HttpClient;
use trawl_store::{PageStore, StoreOutcome, MANIFEST_FILENAME};

/// Fetch recent article pages from a curated collection of RSS/Atom feeds
/// and store their HTML and extracted metadata on disk.
#[derive(Parser, Debug)]
#[command(name = "trawl", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Harvest candidate pages from the configured feeds.
    Harvest(HarvestArgs),
    /// Fetch previously harvested pages and store HTML + metadata pairs.
    Fetch(FetchArgs),
    /// Harvest and fetch in one pass.
    Run(RunArgs),
    /// Integrity-check the store, refresh the manifest, and cut archives.
    Archive(ArchiveArgs),
}

#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Path to the curated feed collection.
    #[arg(long, default_value = "data/feeds.toml")]
    pub feeds_path: PathBuf,
    /// Path where harvested candidate pages are written.
    #[arg(long, default_value = "data/pages.toml")]
    pub pages_path: PathBuf,
    /// Maximum number of entries (pages) to keep per feed.
    #[arg(long, default_value_t = 25)]
    pub max_entries_per_feed: usize,
    /// Restrict the run to these feed names (repeatable). Unknown names
    /// abort before any feed is fetched.
    #[arg(long = "feed")]
    pub feeds: Vec<String>,
    /// Overwrite an existing pages file instead of only logging a preview.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Path to a previously harvested pages file.
    #[arg(long, default_value = "data/pages.toml")]
    pub pages_path: PathBuf,
    /// Directory under which `html/`, `meta/`, and the manifest live.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
    /// Cap on the total number of pages fetched this run.
    #[arg(long)]
    pub max_pages: Option<usize>,
    /// Seconds to wait on each page fetch before skipping it.
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,
    /// Overwrite existing page artifacts instead of previewing.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub harvest: HarvestArgs,
    /// Directory under which `html/`, `meta/`, and the manifest live.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
    /// Cap on the total number of pages fetched this run.
    #[arg(long)]
    pub max_pages: Option<usize>,
    /// Seconds to wait on each page fetch before skipping it.
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Directory under which `html/`, `meta/`, and the manifest live.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}

pub async fn harvest(args: HarvestArgs) -> Result<()> {
    let pages = harvest_pages(&args).await?;
    save_pages_or_preview(&pages, &args)?;
    Ok(())
}

pub async fn fetch(args: FetchArgs) -> Result<()> {
    let pages = trawl_feeds::load_pages(&args.pages_path)
        .with_context(|| format!("loading pages from {}", args.pages_path.display()))?;
    fetch_pages(
        pages,
        &args.data_dir,
        args.max_pages,
        args.timeout_secs,
        args.force,
    )
    .await
}

pub async fn run(args: RunArgs) -> Result<()> {
    let pages = harvest_pages(&args.harvest).await?;
    save_pages_or_preview(&pages, &args.harvest)?;
    fetch_pages(
        pages,
        &args.data_dir,
        args.max_pages,
        args.timeout_secs,
        args.harvest.force,
    )
    .await
}

pub fn archive(args: ArchiveArgs) -> Result<()> {
    let store = PageStore::open(&args.data_dir)?;
    let html_ids = store.html_ids()?;
    let meta_ids = store.meta_ids()?;
    let manifest_path = args.data_dir.join(MANIFEST_FILENAME);
    let prior = trawl_store::load_manifest(&manifest_path)?;

    // The integrity gate is fatal: archiving a store with unpaired or
    // vanished pages would bless the damage.
    let manifest = trawl_store::check_store_integrity(&html_ids, &meta_ids, prior.as_ref())?;
    trawl_store::save_manifest(&manifest, &manifest_path)?;

    trawl_store::archive_dir(store.html_dir())?;
    trawl_store::archive_dir(store.meta_dir())?;
    Ok(())
}

async fn harvest_pages(args: &HarvestArgs) -> Result<Vec<CandidatePage>> {
    let collection = FeedConfigLoader::new()
        .with_file(&args.feeds_path)
        .load()
        .with_context(|| format!("loading feeds from {}", args.feeds_path.display()))?;
    // Validate the allow-list before touching the network.
    let feeds = collection.select(&args.feeds)?;
    if feeds.is_empty() {
        bail!("feed collection is empty; nothing to harvest");
    }

    let client = HttpClient::new()?;
    let extras = BTreeMap::new();
    let mut pages = Vec::new();
    for feed in &feeds {
        let entries =
            match trawl_feeds::list_entries(feed, &client, Some(args.max_entries_per_feed)).await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(feed = %feed.name, error = %err, "skipping feed");
                    continue;
                }
            };
        pages.extend(
            entries
                .iter()
                .filter_map(|entry| trawl_feeds::entry_to_candidate(entry, &extras)),
        );
    }
    info!(count = pages.len(), "got data for pages from RSS feeds");
    Ok(pages)
}

fn save_pages_or_preview(pages: &[CandidatePage], args: &HarvestArgs) -> Result<()> {
    if args.pages_path.exists() && !args.force {
        let preview: Vec<&str> = pages.iter().take(3).map(|page| page.url.as_str()).collect();
        warn!(
            path = %args.pages_path.display(),
            preview = ?preview,
            "pages file already exists and force is off; pages will not be saved"
        );
        return Ok(());
    }
    trawl_feeds::save_pages(pages, &args.pages_path)?;
    Ok(())
}

async fn fetch_pages(
    mut pages: Vec<CandidatePage>,
    data_dir: &Path,
    max_pages: Option<usize>,
    timeout_secs: u64,
    force: bool,
) -> Result<()> {
    let store = PageStore::open(data_dir)?;
    let client = HttpClient::new()?.with_timeout(Duration::from_secs(timeout_secs));

    // Shuffle so bursts don't hit one origin back to back.
    pages.shuffle(&mut rand::thread_rng());
    if let Some(maxn) = max_pages {
        pages.truncate(maxn);
    }

    let n_pages = pages.len();
    let (mut written, mut previewed, mut skipped) = (0usize, 0usize, 0usize);
    for (idx, page) in pages.iter().enumerate() {
        info!(page = idx + 1, total = n_pages, url = %page.url, "getting data for page");
        match trawl_store::fetch_and_store(page, &client, &store, force).await? {
            StoreOutcome::Written => written += 1,
            StoreOutcome::Previewed => previewed += 1,
            StoreOutcome::Skipped => skipped += 1,
        }
    }
    info!(written, previewed, skipped, "fetch complete");
    Ok(())
}
