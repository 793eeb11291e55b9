//! Content-addressed page store: paired HTML + metadata artifacts.
//!
//! Every fetched page lands on disk twice under one deterministic
//! identifier: the raw HTML at `html/<id>.html` and the metadata record at
//! `meta/<id>.toml`. The identifier is a pure function of the page's
//! canonical URL, so re-fetching the same article collapses onto the same
//! record. A flat manifest of all known identifiers guards archival runs
//! against accidental deletions.

mod archive;
mod id;
mod manifest;
mod store;

pub use archive::{archive_dir, unpack_archive};
pub use id::derive_page_id;
pub use manifest::{check_store_integrity, load_manifest, save_manifest, MANIFEST_FILENAME};
pub use store::{fetch_and_store, PageStore, StoreOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("metadata decode error: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("html and metadata stores disagree; unpaired ids: {}", .0.join(", "))]
    UnpairedIds(Vec<String>),
    #[error("previously archived pages missing from html store: {}", .0.join(", "))]
    MissingArchivedIds(Vec<String>),
}
