//! Gzipped tar bundles of the store directories.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Archive, Builder};
use tracing::info;

use crate::StoreError;

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Bundle a directory's current contents into `<dir>.tar.gz` next to it.
///
/// Entries are stored relative to the directory root, so unpacking
/// recreates the flat `<id>.html` / `<id>.toml` layout directly.
pub fn archive_dir(dir: &Path) -> Result<PathBuf, StoreError> {
    let archive_path = dir.with_extension("tar.gz");
    let file = File::create(&archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);
    builder.append_dir_all(".", dir)?;
    builder.into_inner()?.finish()?;
    info!(path = %archive_path.display(), "archive.created");
    Ok(archive_path)
}

/// Unpack `<name>.tar.gz` into a sibling directory named `<name>`.
pub fn unpack_archive(archive_path: &Path) -> Result<PathBuf, StoreError> {
    let file_name = archive_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let dir_name = file_name.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(file_name);
    let extract_dir = archive_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(dir_name);

    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.unpack(&extract_dir)?;
    info!(path = %extract_dir.display(), "archive.unpacked");
    Ok(extract_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn archive_and_unpack_restore_the_directory_contents() {
        let tmp = TempDir::new().unwrap();
        let html_dir = tmp.path().join("html");
        std::fs::create_dir(&html_dir).unwrap();
        std::fs::write(html_dir.join("abc.html"), "<html></html>").unwrap();
        std::fs::write(html_dir.join("def.html"), "<html>2</html>").unwrap();

        let archive_path = archive_dir(&html_dir).unwrap();
        assert_eq!(archive_path, tmp.path().join("html.tar.gz"));
        assert!(archive_path.exists());

        // unpack into a fresh location to prove the bundle is self-contained
        let other = TempDir::new().unwrap();
        let moved = other.path().join("html.tar.gz");
        std::fs::copy(&archive_path, &moved).unwrap();
        let restored = unpack_archive(&moved).unwrap();
        assert_eq!(
            std::fs::read_to_string(restored.join("abc.html")).unwrap(),
            "<html></html>"
        );
        assert_eq!(
            std::fs::read_to_string(restored.join("def.html")).unwrap(),
            "<html>2</html>"
        );
    }
}
