//! Loader for the curated feed collection, with TOML + environment overlays.
//!
//! The feed file is a list of `[[feeds]]` tables, each carrying a `name` and
//! a `url`. Values may be overridden through `TRAWL_`-prefixed environment
//! variables; the file itself is consumed read-only.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

use trawl_common::FeedDescriptor;

/// The parsed feed config file.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedCollection {
    pub feeds: Vec<FeedDescriptor>,
}

impl FeedCollection {
    /// Restrict the collection to an allow-list of feed names.
    ///
    /// Unknown names are a hard error, reported all at once and sorted, so a
    /// typo surfaces before any network activity. An empty allow-list keeps
    /// every feed.
    ///
    /// ```
    /// use trawl_config::FeedConfigLoader;
    ///
    /// let collection = FeedConfigLoader::new()
    ///     .with_toml_str(
    ///         r#"
    /// [[feeds]]
    /// name = "npr"
    /// url = "https://feeds.npr.org/1001/rss.xml"
    ///
    /// [[feeds]]
    /// name = "bbc"
    /// url = "https://feeds.bbci.co.uk/news/rss.xml"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// let selected = collection.select(&["bbc".to_string()]).unwrap();
    /// assert_eq!(selected.len(), 1);
    /// assert_eq!(selected[0].name, "bbc");
    /// ```
    pub fn select(&self, allow: &[String]) -> Result<Vec<FeedDescriptor>, FeedConfigError> {
        if allow.is_empty() {
            return Ok(self.feeds.clone());
        }
        let mut unknown: Vec<String> = allow
            .iter()
            .filter(|name| !self.feeds.iter().any(|feed| feed.name == **name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            unknown.dedup();
            return Err(FeedConfigError::UnknownFeeds(unknown));
        }
        Ok(self
            .feeds
            .iter()
            .filter(|feed| allow.contains(&feed.name))
            .cloned()
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedConfigError {
    #[error("unable to load feed config: {0}")]
    Load(#[from] config::ConfigError),
    #[error("feed config entry has an empty {0} field")]
    EmptyField(&'static str),
    #[error("unknown feed name(s): {}", .0.join(", "))]
    UnknownFeeds(Vec<String>),
}

/// Builder hiding the `config` crate wiring (TOML file + env overrides).
pub struct FeedConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FeedConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedConfigLoader {
    /// Start with sensible defaults: TOML file + `TRAWL_` env overrides.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("TRAWL").separator("__"));
        Self { builder }
    }

    /// Attach the feed config file on disk.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline TOML snippets.
    pub fn with_toml_str(mut self, raw: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(raw, FileFormat::Toml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<FeedCollection, FeedConfigError> {
        let cfg = self.builder.build()?;
        let collection: FeedCollection = cfg.try_deserialize()?;
        for feed in &collection.feeds {
            if feed.name.trim().is_empty() {
                return Err(FeedConfigError::EmptyField("name"));
            }
            if feed.url.trim().is_empty() {
                return Err(FeedConfigError::EmptyField("url"));
            }
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FEEDS: &str = r#"
[[feeds]]
name = "npr"
url = "https://feeds.npr.org/1001/rss.xml"

[[feeds]]
name = "bbc"
url = "https://feeds.bbci.co.uk/news/rss.xml"
"#;

    #[test]
    fn empty_allow_list_keeps_every_feed() {
        let collection = FeedConfigLoader::new()
            .with_toml_str(TWO_FEEDS)
            .load()
            .unwrap();
        assert_eq!(collection.select(&[]).unwrap().len(), 2);
    }

    #[test]
    fn unknown_feed_names_fail_fast_sorted() {
        let collection = FeedConfigLoader::new()
            .with_toml_str(TWO_FEEDS)
            .load()
            .unwrap();
        let err = collection
            .select(&["zeit".to_string(), "bbc".to_string(), "aftenposten".to_string()])
            .unwrap_err();
        match err {
            FeedConfigError::UnknownFeeds(names) => {
                assert_eq!(names, vec!["aftenposten".to_string(), "zeit".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_feed_url_is_rejected() {
        let err = FeedConfigLoader::new()
            .with_toml_str("[[feeds]]\nname = \"x\"\nurl = \"\"\n")
            .load()
            .unwrap_err();
        assert!(matches!(err, FeedConfigError::EmptyField("url")));
    }
}
