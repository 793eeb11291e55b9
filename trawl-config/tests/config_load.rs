use std::{fs, path::PathBuf};

use tempfile::TempDir;
use trawl_config::FeedConfigLoader;

/// Helper to write a TOML file in a temp dir and return its path.
fn write_toml(tmp: &TempDir, name: &str, raw: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, raw).expect("write toml");
    p
}

#[test]
fn test_feed_file_load() {
    let tmp = TempDir::new().unwrap();

    let file_toml = r#"
[[feeds]]
name = "npr"
url = "https://feeds.npr.org/1001/rss.xml"

[[feeds]]
name = "propublica"
url = "https://www.propublica.org/feeds/propublica/main"

[[feeds]]
name = "bbc"
url = "https://feeds.bbci.co.uk/news/rss.xml"
"#;
    let p = write_toml(&tmp, "feeds.toml", file_toml);

    let collection = FeedConfigLoader::new()
        .with_file(p)
        .load()
        .expect("load feed config");

    assert_eq!(collection.feeds.len(), 3);
    assert_eq!(collection.feeds[0].name, "npr");
    assert!(collection.feeds[2].url.starts_with("https://"));
}

#[test]
fn test_missing_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");

    let result = FeedConfigLoader::new().with_file(missing).load();
    assert!(result.is_err());
}
