//! Feed Reader: turn RSS/Atom feeds into candidate pages.
//!
//! Each configured feed is fetched once per run, parsed with `feed-rs`, and
//! optionally subsampled. Entries map to [`CandidatePage`] records through
//! the same normalize-and-omit-empties policy the extractor applies to page
//! markup; the resulting collection is the `[[pages]]` TOML artifact when a
//! run stops at feed harvesting.

use std::collections::BTreeMap;
use std::path::Path;

use feed_rs::model::Entry;
use rand::seq::SliceRandom;
use tracing::{info, warn};
use url::Url;

use trawl_common::normalize::{fix_text, parse_datetime};
use trawl_common::{CandidatePage, FeedDescriptor};
use trawl_http::HttpClient;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("unable to fetch feed '{name}': {source}")]
    Fetch {
        name: String,
        #[source]
        source: trawl_http::HttpError,
    },
    #[error("unable to parse feed '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },
    #[error("pages file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pages file encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("pages file decode error: {0}")]
    Decode(#[from] toml::de::Error),
}

/// Fetch and parse one feed, optionally subsampling its entries.
///
/// When `max_count` is given and the feed holds fewer entries, all of them
/// are returned; otherwise a uniform random sample of exactly `max_count`
/// entries, without replacement.
pub async fn list_entries(
    feed: &FeedDescriptor,
    client: &HttpClient,
    max_count: Option<usize>,
) -> Result<Vec<Entry>, FeedError> {
    let fetched = client
        .get_text(&feed.url)
        .await
        .map_err(|source| FeedError::Fetch {
            name: feed.name.clone(),
            source,
        })?;
    let parsed =
        feed_rs::parser::parse(fetched.body.as_bytes()).map_err(|source| FeedError::Parse {
            name: feed.name.clone(),
            source,
        })?;
    let entries = sample_entries(parsed.entries, max_count);
    info!(feed = %feed.name, count = entries.len(), "feed.entries");
    Ok(entries)
}

/// Uniform random sample without replacement; short feeds return everything.
pub fn sample_entries(mut entries: Vec<Entry>, max_count: Option<usize>) -> Vec<Entry> {
    if let Some(maxn) = max_count {
        if maxn < entries.len() {
            entries.shuffle(&mut rand::thread_rng());
            entries.truncate(maxn);
        }
    }
    entries
}

/// Map one feed entry to a candidate page.
///
/// The entry link is canonicalized (scheme/host/path only, no trailing
/// slash), the title cleaned, and the published timestamp taken from the
/// feed (falling back to the updated timestamp). Empty fields are omitted.
/// Caller-supplied `extras` are merged afterward and always win; the keys
/// `url`, `title`, and `dt_published` override the typed fields, anything
/// else lands in [`CandidatePage::extra`]. Returns `None` when no URL can
/// be determined, since such a page can never be fetched.
pub fn entry_to_candidate(
    entry: &Entry,
    extras: &BTreeMap<String, String>,
) -> Option<CandidatePage> {
    let mut url = entry
        .links
        .first()
        .and_then(|link| canonical_url(&link.href));
    let mut title = entry
        .title
        .as_ref()
        .map(|text| fix_text(&text.content))
        .filter(|cleaned| !cleaned.is_empty());
    let mut dt_published = entry.published.or(entry.updated);
    let mut extra = BTreeMap::new();

    for (key, value) in extras {
        match key.as_str() {
            "url" => url = Some(value.clone()),
            "title" => title = Some(value.clone()),
            "dt_published" => {
                dt_published = parse_datetime(value);
                if dt_published.is_none() {
                    warn!(value = %value, "ignoring unparseable dt_published override");
                }
            }
            _ => {
                extra.insert(key.clone(), value.clone());
            }
        }
    }

    let url = url.filter(|u| !u.is_empty())?;
    Some(CandidatePage {
        url,
        title,
        dt_published,
        extra,
    })
}

/// Reduce a link to its stable form: scheme, host, and path, with the query
/// string, fragment, and any trailing slash removed.
pub fn canonical_url(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw.trim()).ok()?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    Some(parsed.to_string().trim_end_matches('/').to_string())
}

#[derive(serde::Serialize, serde::Deserialize)]
struct PagesFile {
    pages: Vec<CandidatePage>,
}

/// Persist harvested candidate pages as a `[[pages]]` TOML document.
pub fn save_pages(pages: &[CandidatePage], path: &Path) -> Result<(), FeedError> {
    let doc = PagesFile {
        pages: pages.to_vec(),
    };
    std::fs::write(path, toml::to_string(&doc)?)?;
    info!(path = %path.display(), count = pages.len(), "pages.saved");
    Ok(())
}

/// Load a previously harvested `[[pages]]` TOML document.
pub fn load_pages(path: &Path) -> Result<Vec<CandidatePage>, FeedError> {
    let raw = std::fs::read_to_string(path)?;
    let doc: PagesFile = toml::from_str(&raw)?;
    info!(path = %path.display(), count = doc.pages.len(), "pages.loaded");
    Ok(doc.pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Feed</title>
    <link>https://news.example.com</link>
    <item>
      <title>First story</title>
      <link>https://news.example.com/stories/first?utm_source=rss</link>
      <pubDate>Wed, 01 Jan 2020 00:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://news.example.com/stories/second/</link>
    </item>
    <item>
      <title>   </title>
      <link>https://news.example.com/stories/third</link>
    </item>
  </channel>
</rss>
"#;

    fn fixture_entries() -> Vec<Entry> {
        feed_rs::parser::parse(RSS_FIXTURE.as_bytes())
            .expect("fixture parses")
            .entries
    }

    #[test]
    fn short_feed_returns_all_entries_not_an_error() {
        let entries = fixture_entries();
        assert_eq!(sample_entries(entries, Some(25)).len(), 3);
    }

    #[test]
    fn sampling_caps_the_entry_count() {
        let entries = fixture_entries();
        assert_eq!(sample_entries(entries, Some(2)).len(), 2);
    }

    #[test]
    fn candidate_url_is_canonicalized() {
        let entries = fixture_entries();
        let candidate = entry_to_candidate(&entries[0], &BTreeMap::new()).unwrap();
        assert_eq!(candidate.url, "https://news.example.com/stories/first");
        assert_eq!(candidate.title.as_deref(), Some("First story"));
        assert_eq!(
            candidate.dt_published,
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn query_string_and_trailing_slash_collapse_to_one_url() {
        let a = canonical_url("https://news.example.com/stories/first?utm_source=rss").unwrap();
        let b = canonical_url("https://news.example.com/stories/first/").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn blank_title_is_omitted_not_stored_empty() {
        let entries = fixture_entries();
        let candidate = entry_to_candidate(&entries[2], &BTreeMap::new()).unwrap();
        assert_eq!(candidate.title, None);
    }

    #[test]
    fn caller_extras_always_win() {
        let entries = fixture_entries();
        let mut extras = BTreeMap::new();
        extras.insert("title".to_string(), "Override".to_string());
        extras.insert("feed".to_string(), "example".to_string());
        let candidate = entry_to_candidate(&entries[0], &extras).unwrap();
        assert_eq!(candidate.title.as_deref(), Some("Override"));
        assert_eq!(candidate.extra.get("feed").map(String::as_str), Some("example"));
    }

    #[test]
    fn pages_file_round_trips() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pages.toml");
        let pages = vec![CandidatePage {
            url: "https://news.example.com/stories/first".into(),
            title: Some("First story".into()),
            dt_published: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            extra: BTreeMap::new(),
        }];
        save_pages(&pages, &path).unwrap();
        assert_eq!(load_pages(&path).unwrap(), pages);
    }
}
