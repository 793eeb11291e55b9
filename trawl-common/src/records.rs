use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One RSS/Atom source in the curated feed collection.
///
/// Loaded from the `[[feeds]]` tables of the feed config file and treated as
/// read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    pub name: String,
    pub url: String,
}

/// A page harvested from one feed entry, before its HTML has been fetched.
///
/// Absent fields are omitted from the persisted TOML rather than stored as
/// empty strings. Caller-supplied extras (e.g. the source feed name) are
/// flattened into the same table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidatePage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_published: Option<DateTime<Utc>>,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, String>,
}

/// Fields pulled out of one page's structured-data blocks.
///
/// Blocks are merged in encounter order: a later block's non-empty value
/// overwrites an earlier one, and empty values never clobber anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleMetadata {
    pub text: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub dt_published: Option<DateTime<Utc>>,
}

impl ArticleMetadata {
    /// True when no block contributed any field at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.url.is_none()
            && self.title.is_none()
            && self.dt_published.is_none()
    }

    /// Overlay `other` onto `self`, keeping existing values where `other`
    /// has none.
    pub fn merge_from(&mut self, other: ArticleMetadata) {
        if other.text.is_some() {
            self.text = other.text;
        }
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.title.is_some() {
            self.title = other.title;
        }
        if other.dt_published.is_some() {
            self.dt_published = other.dt_published;
        }
    }
}

/// The persisted unit: one fetched page, keyed by its deterministic id.
///
/// Serialized field order is fixed (`id, url, dt_published, title, text`)
/// and `title`/`text` are kept field-complete with empty-string placeholders
/// so every metadata file on disk has the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}
