//! Structured-Data Extractor: article metadata from embedded page markup.
//!
//! Pages carry machine-readable descriptions of their content in two
//! syntaxes: inline JSON-LD `<script>` blocks and attribute-embedded
//! microdata. Both are collected into one uniform JSON shape, filtered to
//! recognized article/page types, and mapped through fixed per-field
//! fallback chains into an [`ArticleMetadata`]. Extraction never fails:
//! malformed blocks and wrongly shaped fields are logged and contribute
//! nothing.

mod jsonld;
mod microdata;

use scraper::Html;
use serde_json::{Map, Value};
use tracing::warn;

use trawl_common::normalize::{normalize_datetime, normalize_text};
use trawl_common::ArticleMetadata;

/// Schema namespaces a block's `@context` is expected to declare.
pub const SCHEMA_CONTEXTS: &[&str] = &["http://schema.org", "https://schema.org"];

/// Types denoting a news/blog/generic article.
pub const ARTICLE_TYPES: &[&str] = &[
    "Article",
    "TechArticle",
    "NewsArticle",
    "AnalysisNewsArticle",
    "AskPublicNewsArticle",
    "BackgroundNewsArticle",
    "OpinionNewsArticle",
    "ReportageNewsArticle",
    "ReviewNewsArticle",
    "BlogPosting",
    "LiveBlogPosting",
];

/// Types denoting a generic web page.
pub const PAGE_TYPES: &[&str] = &["WebPage"];

// Per-field fallback chains: the first key *present* in a block wins, and
// only then is its value parsed.
const BODY_KEYS: &[&str] = &["articleBody", "text"];
const URL_KEYS: &[&str] = &["url", "mainEntityOfPage"];
const TITLE_KEYS: &[&str] = &["headline", "alternativeHeadline", "name"];
const DATE_KEYS: &[&str] = &["datePublished", "dateCreated"];

/// Extract merged article metadata from raw HTML.
///
/// Blocks are merged in encounter order (JSON-LD first, then microdata):
/// a later recognized block's non-empty value overwrites an earlier one,
/// and empty values never overwrite anything.
///
/// ```
/// let html = r##"<html><head><script type="application/ld+json">
/// {"@context": "https://schema.org", "@type": "NewsArticle",
///  "headline": "Foo", "url": "https://x.test/a"}
/// </script></head><body></body></html>"##;
/// let meta = trawl_extract::extract_metadata(html);
/// assert_eq!(meta.title.as_deref(), Some("Foo"));
/// assert_eq!(meta.url.as_deref(), Some("https://x.test/a"));
/// ```
pub fn extract_metadata(html: &str) -> ArticleMetadata {
    let document = Html::parse_document(html);
    let mut blocks = jsonld::collect_blocks(&document);
    blocks.extend(microdata::collect_items(&document));

    let mut merged = ArticleMetadata::default();
    for block in &blocks {
        check_context(block);
        if !has_recognized_type(block) {
            continue;
        }
        merged.merge_from(block_metadata(block));
    }
    merged
}

/// Warn (and proceed) when a block declares an unexpected vocabulary.
fn check_context(block: &Map<String, Value>) {
    let accepted = block
        .get("@context")
        .and_then(Value::as_str)
        .is_some_and(|context| SCHEMA_CONTEXTS.contains(&context));
    if !accepted {
        warn!(
            context = %block.get("@context").cloned().unwrap_or(serde_json::Value::Null),
            "block context is invalid; should be one of {SCHEMA_CONTEXTS:?}"
        );
    }
}

/// A block participates in extraction only when its declared `@type` (a
/// string, or any member of an array) is a recognized article/page type.
fn has_recognized_type(block: &Map<String, Value>) -> bool {
    let Some(declared) = block.get("@type") else {
        return false;
    };
    value_is_recognized_type(declared)
}

fn value_is_recognized_type(declared: &Value) -> bool {
    let recognized = |name: &str| ARTICLE_TYPES.contains(&name) || PAGE_TYPES.contains(&name);
    match declared {
        Value::String(name) => recognized(name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(recognized),
        _ => false,
    }
}

fn block_metadata(block: &Map<String, Value>) -> ArticleMetadata {
    ArticleMetadata {
        text: article_body(block),
        url: canonical_url(block),
        title: title(block),
        dt_published: date_published(block),
    }
}

fn first_present<'a>(block: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| block.get(*key))
}

/// Body text: `articleBody`, else `text`. A string is cleaned directly; an
/// array of paragraph strings is cleaned per paragraph and joined with
/// blank lines. Anything else is logged and treated as absent.
fn article_body(block: &Map<String, Value>) -> Option<String> {
    let value = first_present(block, BODY_KEYS)?;
    match value {
        Value::String(_) => normalize_text(value).filter(|text| !text.is_empty()),
        Value::Array(paragraphs) if paragraphs.iter().all(Value::is_string) => {
            let joined = paragraphs
                .iter()
                .filter_map(normalize_text)
                .collect::<Vec<_>>()
                .join("\n\n");
            (!joined.is_empty()).then_some(joined)
        }
        other => {
            warn!(value = %other, "article body must be a string or a list of strings");
            None
        }
    }
}

/// Canonical URL: `url`, else `mainEntityOfPage`. The latter may be a
/// nested object, whose `@id` is used only when the nested object itself
/// declares a recognized type.
fn canonical_url(block: &Map<String, Value>) -> Option<String> {
    let value = first_present(block, URL_KEYS)?;
    match value {
        Value::String(raw) => non_empty(raw.trim().to_string()),
        Value::Object(nested) => {
            let nested_type_ok = nested
                .get("@type")
                .is_some_and(value_is_recognized_type);
            if !nested_type_ok {
                warn!(value = %value, "nested url object has no recognized type");
                return None;
            }
            match nested.get("@id") {
                None => None,
                Some(Value::String(raw)) => non_empty(raw.trim().to_string()),
                Some(other) => {
                    warn!(value = %other, "nested url @id must be a string");
                    None
                }
            }
        }
        other => {
            warn!(value = %other, "url must be a string or an object");
            None
        }
    }
}

/// Title: `headline`, else `alternativeHeadline`, else `name`.
fn title(block: &Map<String, Value>) -> Option<String> {
    let value = first_present(block, TITLE_KEYS)?;
    normalize_text(value).filter(|text| !text.is_empty())
}

/// Publication date: `datePublished`, else `dateCreated`.
fn date_published(block: &Map<String, Value>) -> Option<chrono::DateTime<chrono::Utc>> {
    let value = first_present(block, DATE_KEYS)?;
    normalize_datetime(value)
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
