//! In-memory identity tracking for stored images and processed articles
//!
//! Two set-shaped registries back the deduplication engine:
//!
//! - [`ImageStore`] tracks which image digests are persisted on disk. It is
//!   seeded by the reconciler at startup and grown incrementally as images
//!   are written. An insert must happen only after the corresponding file
//!   write has fully succeeded.
//! - [`SeenArticles`] tracks which article identifiers have been fully
//!   processed. It is purely in-memory: a restart forgets all articles, and
//!   correctness relies on the image store's idempotence instead.
//!
//! Both expose only `contains`/`insert` behind a reader-writer lock; the raw
//! container is never handed out, and there is no deletion operation.

use crate::digest::ImageDigest;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Content-addressed store of image digests known to be persisted on disk
///
/// Invariant: a digest is present here if and only if a file named
/// `<digest>.<ext>` exists in the gallery directory. The reconciler restores
/// this invariant at startup; the image processor maintains it by inserting
/// only after a successful write.
#[derive(Debug, Default)]
pub struct ImageStore {
    digests: RwLock<HashSet<ImageDigest>>,
}

impl ImageStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a digest is already persisted
    pub async fn contains(&self, digest: &ImageDigest) -> bool {
        self.digests.read().await.contains(digest)
    }

    /// Register a digest as persisted (idempotent)
    pub async fn insert(&self, digest: ImageDigest) {
        self.digests.write().await.insert(digest);
    }

    /// Number of registered digests (test-only; the crawler contract is
    /// `contains`/`insert` and nothing else)
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.digests.read().await.len()
    }

    /// Whether no digests are registered (test-only)
    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.digests.read().await.is_empty()
    }
}

/// Registry of article identifiers that have been fully processed
///
/// An identifier is inserted only after every image belonging to the article
/// has been stored or recognized as a duplicate. Entries are never removed.
#[derive(Debug, Default)]
pub struct SeenArticles {
    ids: RwLock<HashSet<String>>,
}

impl SeenArticles {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an article has already been fully processed
    pub async fn contains(&self, id: &str) -> bool {
        self.ids.read().await.contains(id)
    }

    /// Mark an article as fully processed (idempotent)
    pub async fn insert(&self, id: String) {
        self.ids.write().await.insert(id);
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_image_store_contains_after_insert() {
        let store = ImageStore::new();
        let digest = ImageDigest::of_bytes(b"some image");

        assert!(!store.contains(&digest).await);
        store.insert(digest.clone()).await;
        assert!(store.contains(&digest).await);
    }

    #[tokio::test]
    async fn test_image_store_insert_is_idempotent() {
        let store = ImageStore::new();
        let digest = ImageDigest::of_bytes(b"some image");

        store.insert(digest.clone()).await;
        store.insert(digest.clone()).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_image_store_concurrent_inserts() {
        let store = Arc::new(ImageStore::new());
        let digest = ImageDigest::of_bytes(b"contended image");

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let digest = digest.clone();
            tasks.spawn(async move {
                store.insert(digest).await;
            });
        }
        while tasks.join_next().await.is_some() {}

        assert_eq!(store.len().await, 1);
        assert!(store.contains(&digest).await);
    }

    #[tokio::test]
    async fn test_seen_articles_contains_after_insert() {
        let seen = SeenArticles::new();

        assert!(!seen.contains("123").await);
        seen.insert("123".to_string()).await;
        assert!(seen.contains("123").await);
        assert!(!seen.contains("124").await);
    }
}
