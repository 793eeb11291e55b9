//! The page store and the per-page fetch → extract → identify → write
//! coordinator.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use trawl_common::{CandidatePage, PageRecord};
use trawl_http::PageFetcher;

use crate::id::derive_page_id;
use crate::StoreError;

const HTML_DIRNAME: &str = "html";
const META_DIRNAME: &str = "meta";

/// How one coordinator call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Both artifacts written (or overwritten under `force`).
    Written,
    /// At least one artifact already existed and `force` was off; existing
    /// files were left untouched.
    Previewed,
    /// The page was skipped (its fetch failed).
    Skipped,
}

/// The two parallel store directories under one data dir.
pub struct PageStore {
    html_dir: PathBuf,
    meta_dir: PathBuf,
}

impl PageStore {
    /// Open (creating if needed) the `html/` and `meta/` directories.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let html_dir = data_dir.join(HTML_DIRNAME);
        let meta_dir = data_dir.join(META_DIRNAME);
        std::fs::create_dir_all(&html_dir)?;
        std::fs::create_dir_all(&meta_dir)?;
        Ok(Self { html_dir, meta_dir })
    }

    pub fn html_dir(&self) -> &Path {
        &self.html_dir
    }

    pub fn meta_dir(&self) -> &Path {
        &self.meta_dir
    }

    pub fn html_path(&self, id: &str) -> PathBuf {
        self.html_dir.join(format!("{id}.html"))
    }

    pub fn meta_path(&self, id: &str) -> PathBuf {
        self.meta_dir.join(format!("{id}.toml"))
    }

    /// Write the HTML and metadata artifacts for one record as a unit.
    ///
    /// Each artifact is separately subject to the overwrite policy: an
    /// existing file with `force` off is logged as a preview and left
    /// alone. No path writes one artifact without attempting the other.
    pub fn write_page(
        &self,
        html: &str,
        record: &PageRecord,
        force: bool,
    ) -> Result<StoreOutcome, StoreError> {
        let rendered = toml::to_string(record)?;
        let wrote_html = write_or_preview(&self.html_path(&record.id), html, force)?;
        let wrote_meta = write_or_preview(&self.meta_path(&record.id), &rendered, force)?;
        if wrote_html && wrote_meta {
            Ok(StoreOutcome::Written)
        } else {
            Ok(StoreOutcome::Previewed)
        }
    }

    /// Read back the pair of artifacts stored under `id`.
    pub fn read_page(&self, id: &str) -> Result<(String, PageRecord), StoreError> {
        let html = std::fs::read_to_string(self.html_path(id))?;
        let record: PageRecord = toml::from_str(&std::fs::read_to_string(self.meta_path(id))?)?;
        Ok((html, record))
    }

    pub fn html_ids(&self) -> Result<BTreeSet<String>, StoreError> {
        ids_with_extension(&self.html_dir, "html")
    }

    pub fn meta_ids(&self) -> Result<BTreeSet<String>, StoreError> {
        ids_with_extension(&self.meta_dir, "toml")
    }
}

fn ids_with_extension(dir: &Path, extension: &str) -> Result<BTreeSet<String>, StoreError> {
    let mut ids = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(extension) {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.insert(stem.to_string());
            }
        }
    }
    Ok(ids)
}

fn write_or_preview(path: &Path, contents: &str, force: bool) -> Result<bool, StoreError> {
    if path.exists() && !force {
        warn!(
            path = %path.display(),
            "file already exists and force is off; data will not be saved"
        );
        return Ok(false);
    }
    std::fs::write(path, contents)?;
    info!(path = %path.display(), "store.saved");
    Ok(true)
}

/// Fetch one candidate page and persist it.
///
/// Transport failures are warned about and skipped; they never abort the
/// batch. When the extracted metadata carries no URL, the fetch's final
/// resolved URL stands in (covering redirects), and the identifier is
/// derived from whichever URL won. Title and text fall back to
/// empty-string placeholders so the persisted record is field-complete.
pub async fn fetch_and_store(
    candidate: &CandidatePage,
    fetcher: &dyn PageFetcher,
    store: &PageStore,
    force: bool,
) -> Result<StoreOutcome, StoreError> {
    let fetched = match fetcher.fetch_page(&candidate.url).await {
        Ok(fetched) => fetched,
        Err(err) => {
            warn!(url = %candidate.url, error = %err, "unable to get HTML; skipping page");
            return Ok(StoreOutcome::Skipped);
        }
    };

    let metadata = trawl_extract::extract_metadata(&fetched.body);
    let url = metadata.url.unwrap_or(fetched.resolved_url);
    let id = derive_page_id(&url);
    let record = PageRecord {
        id,
        url,
        dt_published: metadata.dt_published,
        title: metadata.title.unwrap_or_default(),
        text: metadata.text.unwrap_or_default(),
    };
    store.write_page(&fetched.body, &record, force)
}
