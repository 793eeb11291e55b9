use uuid::Uuid;

/// Derive the stable page identifier for a canonical URL.
///
/// A namespace UUID (v3, URL namespace) over the URL string: the same URL
/// always yields the same identifier, distinct URLs collide only with
/// negligible probability, and the output is the usual lowercase hyphenated
/// form. This is the dedup key for the entire store.
///
/// ```
/// use trawl_store::derive_page_id;
///
/// let a = derive_page_id("https://x.test/a");
/// assert_eq!(a, derive_page_id("https://x.test/a"));
/// assert_ne!(a, derive_page_id("https://x.test/b"));
/// ```
pub fn derive_page_id(url: &str) -> String {
    Uuid::new_v3(&Uuid::NAMESPACE_URL, url.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn repeated_calls_are_pure() {
        let url = "https://news.example.com/stories/first";
        assert_eq!(derive_page_id(url), derive_page_id(url));
    }

    #[test]
    fn distinct_urls_yield_distinct_ids() {
        let mut seen = HashSet::new();
        for host in ["a.test", "b.test", "news.example.com"] {
            for path in 0..100 {
                let id = derive_page_id(&format!("https://{host}/story/{path}"));
                assert!(seen.insert(id), "collision for {host}/{path}");
            }
        }
    }

    #[test]
    fn id_is_lowercase_hyphenated_hex() {
        let id = derive_page_id("https://x.test/a");
        assert_eq!(id.len(), 36);
        assert!(id
            .chars()
            .all(|ch| ch == '-' || ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
    }
}
