//! Startup reconciliation of the gallery directory
//!
//! Runs once, before polling starts, and restores the store invariant: a
//! digest is registered if and only if a file named `<digest>.<ext>` exists
//! in the gallery directory.
//!
//! The scan is non-recursive (the image processor only ever produces a flat
//! layout). For each regular file the name is split at the last `.`:
//! - If the stem is already a syntactically valid digest it is trusted
//!   without rehashing. This assumes no file was renamed or corrupted
//!   externally; the trade-off is startup cost versus trust.
//! - Otherwise the file's actual bytes are hashed and the file is renamed to
//!   `<digest>.<ext>`.
//!
//! Either way the resulting digest is registered. Errors hashing or renaming
//! a single file are logged and that file is skipped; the scan of the
//! remaining files continues.

use crate::digest::ImageDigest;
use crate::error::Result;
use crate::store::ImageStore;
use std::path::Path;
use tracing::{debug, warn};

/// Counters describing what a reconciliation pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Files whose name was already a valid digest and was trusted as-is
    pub trusted: usize,
    /// Files that were rehashed and renamed to their digest name
    pub renamed: usize,
    /// Files that could not be read or renamed and were skipped
    pub skipped: usize,
}

impl ReconcileSummary {
    /// Total number of digests registered into the store
    #[must_use]
    pub fn registered(&self) -> usize {
        self.trusted + self.renamed
    }
}

/// Scan `dir` and seed `store` with the digests of the files it contains
///
/// # Errors
/// Returns an error only if the directory itself cannot be read; per-file
/// failures are logged and counted in [`ReconcileSummary::skipped`].
pub async fn reconcile_dir(dir: &Path, store: &ImageStore) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat entry, skipping");
                summary.skipped += 1;
                continue;
            }
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "non-UTF-8 filename, skipping");
            summary.skipped += 1;
            continue;
        };

        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (file_name, None),
        };

        if let Some(digest) = ImageDigest::parse(stem) {
            // Name already digest-shaped: trusted without rehashing.
            store.insert(digest).await;
            summary.trusted += 1;
            continue;
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file, skipping");
                summary.skipped += 1;
                continue;
            }
        };
        let digest = ImageDigest::of_bytes(&bytes);

        let new_name = match extension {
            Some(ext) => format!("{digest}.{}", ext.to_ascii_lowercase()),
            None => digest.to_string(),
        };
        let new_path = dir.join(&new_name);
        if let Err(e) = tokio::fs::rename(&path, &new_path).await {
            warn!(path = %path.display(), error = %e, "cannot rename file, skipping");
            summary.skipped += 1;
            continue;
        }

        debug!(from = %path.display(), to = %new_path.display(), "renamed to digest name");
        store.insert(digest).await;
        summary.renamed += 1;
    }

    Ok(summary)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reconcile_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new();

        let summary = reconcile_dir(temp_dir.path(), &store).await.unwrap();
        assert_eq!(summary, ReconcileSummary::default());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_reconcile_renames_arbitrary_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new();

        let bytes = b"picture of a cat";
        fs::write(temp_dir.path().join("funny_cat.PNG"), bytes).unwrap();

        let summary = reconcile_dir(temp_dir.path(), &store).await.unwrap();
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.trusted, 0);

        let digest = ImageDigest::of_bytes(bytes);
        let renamed = temp_dir.path().join(format!("{digest}.png"));
        assert!(renamed.exists(), "file should be renamed to its digest");
        assert!(!temp_dir.path().join("funny_cat.PNG").exists());
        assert!(store.contains(&digest).await);
    }

    #[tokio::test]
    async fn test_reconcile_trusts_digest_shaped_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new();

        // Name is a valid digest but of *different* bytes; the reconciler
        // trusts the name and must not rehash.
        let claimed = ImageDigest::of_bytes(b"claimed content");
        fs::write(
            temp_dir.path().join(format!("{claimed}.jpg")),
            b"actual content",
        )
        .unwrap();

        let summary = reconcile_dir(temp_dir.path(), &store).await.unwrap();
        assert_eq!(summary.trusted, 1);
        assert_eq!(summary.renamed, 0);
        assert!(store.contains(&claimed).await);

        let actual = ImageDigest::of_bytes(b"actual content");
        assert!(!store.contains(&actual).await);
    }

    #[tokio::test]
    async fn test_reconcile_mixed_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new();

        let named_bytes = b"already addressed";
        let named_digest = ImageDigest::of_bytes(named_bytes);
        fs::write(
            temp_dir.path().join(format!("{named_digest}.gif")),
            named_bytes,
        )
        .unwrap();

        let stray_bytes = b"stray download";
        fs::write(temp_dir.path().join("IMG_20240101.jpeg"), stray_bytes).unwrap();

        // Subdirectories are skipped entirely.
        fs::create_dir(temp_dir.path().join("nested")).unwrap();

        let summary = reconcile_dir(temp_dir.path(), &store).await.unwrap();
        assert_eq!(summary.trusted, 1);
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(store.len().await, 2);

        let stray_digest = ImageDigest::of_bytes(stray_bytes);
        assert!(store.contains(&named_digest).await);
        assert!(store.contains(&stray_digest).await);
        assert!(
            temp_dir
                .path()
                .join(format!("{stray_digest}.jpeg"))
                .exists()
        );
    }

    #[tokio::test]
    async fn test_reconcile_file_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new();

        let bytes = b"extensionless";
        fs::write(temp_dir.path().join("download"), bytes).unwrap();

        let summary = reconcile_dir(temp_dir.path(), &store).await.unwrap();
        assert_eq!(summary.renamed, 1);

        let digest = ImageDigest::of_bytes(bytes);
        assert!(temp_dir.path().join(digest.to_string()).exists());
        assert!(store.contains(&digest).await);
    }

    #[tokio::test]
    async fn test_reconcile_missing_directory_errors() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new();

        let missing = temp_dir.path().join("does-not-exist");
        assert!(reconcile_dir(&missing, &store).await.is_err());
    }
}
