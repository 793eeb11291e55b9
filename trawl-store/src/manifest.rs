//! The identifier manifest and the pre-archival integrity gate.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::StoreError;

/// Flat file holding every known page identifier, one per line, sorted.
pub const MANIFEST_FILENAME: &str = "page_uuids";

/// Validate the store before an archive is cut.
///
/// The HTML and metadata stores must hold exactly the same identifier set,
/// and every identifier recorded by a previous archival run must still be
/// present — a page that vanished means data was deleted since the last
/// archive, and archiving would silently bless the loss. Both violations
/// are hard errors naming every offending identifier, sorted. On success
/// the (sorted, deduplicated) union of current identifiers is returned as
/// the next manifest.
pub fn check_store_integrity(
    html_ids: &BTreeSet<String>,
    meta_ids: &BTreeSet<String>,
    prior_manifest: Option<&BTreeSet<String>>,
) -> Result<Vec<String>, StoreError> {
    let unpaired: Vec<String> = html_ids
        .symmetric_difference(meta_ids)
        .cloned()
        .collect();
    if !unpaired.is_empty() {
        return Err(StoreError::UnpairedIds(unpaired));
    }

    if let Some(prior) = prior_manifest {
        let missing: Vec<String> = prior.difference(html_ids).cloned().collect();
        if !missing.is_empty() {
            return Err(StoreError::MissingArchivedIds(missing));
        }
    }

    Ok(html_ids.union(meta_ids).cloned().collect())
}

/// Load a previously saved manifest; `Ok(None)` when none exists yet.
pub fn load_manifest(path: &Path) -> Result<Option<BTreeSet<String>>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    let ids: BTreeSet<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    info!(path = %path.display(), count = ids.len(), "manifest.loaded");
    Ok(Some(ids))
}

/// Persist the manifest, one identifier per line.
pub fn save_manifest(ids: &[String], path: &Path) -> Result<(), StoreError> {
    let mut body = ids.join("\n");
    body.push('\n');
    std::fs::write(path, body)?;
    info!(path = %path.display(), count = ids.len(), "manifest.saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matching_stores_yield_the_sorted_union() {
        let manifest =
            check_store_integrity(&ids(&["b", "a"]), &ids(&["a", "b"]), None).unwrap();
        assert_eq!(manifest, vec!["a", "b"]);
    }

    #[test]
    fn unpaired_html_id_is_named() {
        let err =
            check_store_integrity(&ids(&["a", "b", "c"]), &ids(&["a", "b"]), None).unwrap_err();
        match err {
            StoreError::UnpairedIds(names) => assert_eq!(names, vec!["c"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn vanished_manifest_id_is_named() {
        let prior = ids(&["a", "b", "x"]);
        let err = check_store_integrity(&ids(&["a", "b"]), &ids(&["a", "b"]), Some(&prior))
            .unwrap_err();
        match err {
            StoreError::MissingArchivedIds(names) => assert_eq!(names, vec!["x"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn checking_an_unchanged_store_twice_is_idempotent() {
        let html = ids(&["a", "b"]);
        let meta = ids(&["a", "b"]);
        let first = check_store_integrity(&html, &meta, None).unwrap();
        let prior: BTreeSet<String> = first.iter().cloned().collect();
        let second = check_store_integrity(&html, &meta, Some(&prior)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn manifest_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_FILENAME);
        assert!(load_manifest(&path).unwrap().is_none());

        save_manifest(&["a".into(), "b".into()], &path).unwrap();
        let loaded = load_manifest(&path).unwrap().unwrap();
        assert_eq!(loaded, ids(&["a", "b"]));
    }
}
