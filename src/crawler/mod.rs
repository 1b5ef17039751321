//! Crawler core: polling, dispatch, and the dedup/download pipeline
//!
//! The [`Crawler`] ties the pieces together:
//! - a fixed-interval poll loop fetching page 1 of the article list,
//! - per-tick dispatch of one task per image-carrying article,
//! - per-article fan-out of one download task per image with a join barrier,
//! - content-addressed persistence with duplicate short-circuiting.
//!
//! An article is marked seen only after every one of its image tasks has
//! finished and each either stored its image or recognized it as a
//! duplicate. Any other failure leaves the article eligible for full
//! re-processing on a later poll; images already stored then resolve as
//! duplicates, so the article level is at-least-once while the image level
//! stays at-most-once.


use crate::config::Config;
use crate::digest::ImageDigest;
use crate::error::{Error, Result};
use crate::reconcile;
use crate::source::{GallerySource, ListItem};
use crate::store::{ImageStore, SeenArticles};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of processing a single image
///
/// Duplicate is a recognized, expected outcome, distinct from plain success
/// only for logging; both count as success for the owning article.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Image bytes were written and the digest registered
    Stored(ImageDigest),
    /// Digest was already registered; nothing was written
    Duplicate(ImageDigest),
}

/// Continuously-running gallery crawler (cloneable via `Arc`)
pub struct Crawler {
    /// Static configuration
    config: Config,
    /// Remote gallery collaborator
    source: Arc<dyn GallerySource>,
    /// Content-addressed store of persisted image digests
    images: ImageStore,
    /// Registry of fully processed articles
    seen: SeenArticles,
    /// Directory images are written into (`<image_dir>/<gallery>`)
    gallery_dir: PathBuf,
    /// Cancellation token stopping the poll loop
    shutdown: CancellationToken,
}

impl Crawler {
    /// Create a crawler and reconcile the gallery directory
    ///
    /// Creates `<image_dir>/<gallery>` if needed, then scans it to seed the
    /// image store before any polling starts.
    ///
    /// # Errors
    /// Returns a configuration error if no gallery identifier is resolvable,
    /// or an I/O error if the gallery directory cannot be created or read.
    pub async fn new(config: Config, source: Arc<dyn GallerySource>) -> Result<Arc<Self>> {
        let gallery = config.gallery_id()?;
        let gallery_dir = config.image_dir.join(&gallery);
        tokio::fs::create_dir_all(&gallery_dir).await?;

        let images = ImageStore::new();
        let summary = reconcile::reconcile_dir(&gallery_dir, &images).await?;
        info!(
            gallery = %gallery,
            dir = %gallery_dir.display(),
            registered = summary.registered(),
            renamed = summary.renamed,
            skipped = summary.skipped,
            "gallery directory reconciled"
        );

        Ok(Arc::new(Self {
            config,
            source,
            images,
            seen: SeenArticles::new(),
            gallery_dir,
            shutdown: CancellationToken::new(),
        }))
    }

    /// Token that stops the poll loop when cancelled
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Directory images are written into
    #[must_use]
    pub fn gallery_dir(&self) -> &Path {
        &self.gallery_dir
    }

    /// Run the poll loop until the shutdown token is cancelled
    ///
    /// Each tick fetches page 1 of the article list and hands the batch to
    /// dispatch as an independent task, so downstream processing never
    /// blocks the next tick. A failed list fetch is logged and the tick is
    /// skipped; the next scheduled tick is the retry mechanism.
    pub async fn run(self: Arc<Self>) {
        info!(interval = ?self.config.poll_interval, "crawler started");
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("crawler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    debug!(page = 1, "fetching article list");
                    match self.source.fetch_list(1).await {
                        Ok(items) => {
                            let crawler = Arc::clone(&self);
                            tokio::spawn(async move { crawler.dispatch(items).await });
                        }
                        Err(e) => warn!(error = %e, "list fetch failed, skipping tick"),
                    }
                }
            }
        }
    }

    /// Dispatch one article task per image-carrying list item
    ///
    /// Items without images never reach identity tracking. All article
    /// tasks of the batch are joined here so one poll tick's work can be
    /// observed as a unit.
    pub(crate) async fn dispatch(self: Arc<Self>, items: Vec<ListItem>) {
        let mut tasks = JoinSet::new();
        for item in items.into_iter().filter(|item| item.has_image) {
            let crawler = Arc::clone(&self);
            tasks.spawn(async move { crawler.process_article(item).await });
        }

        let mut committed = 0usize;
        let mut pending = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => committed += 1,
                Ok(false) => pending += 1,
                Err(e) => {
                    error!(error = %e, "article task panicked");
                    pending += 1;
                }
            }
        }
        if committed + pending > 0 {
            debug!(committed, pending, "poll batch finished");
        }
    }

    /// Process one article: resolve images, fan out, commit all-or-nothing
    ///
    /// Returns whether the article ended up marked as seen (either it
    /// already was, or every image task succeeded or hit a duplicate).
    pub(crate) async fn process_article(self: Arc<Self>, item: ListItem) -> bool {
        let urls = match self.source.fetch_image_urls(&item).await {
            Ok(urls) => urls,
            Err(e) => {
                debug!(article = %item.id, error = %e, "image URL resolution failed");
                return false;
            }
        };

        if self.seen.contains(&item.id).await {
            return true;
        }

        info!(
            article = %item.id,
            subject = %item.subject,
            images = urls.len(),
            "processing article"
        );

        let mut tasks = JoinSet::new();
        for url in urls {
            let crawler = Arc::clone(&self);
            tasks.spawn(async move { crawler.process_image(&url).await });
        }

        // Join barrier: the article is never marked seen before every image
        // task has completed.
        let mut all_succeeded = true;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(ImageOutcome::Stored(digest))) => {
                    info!(article = %item.id, %digest, "image stored");
                }
                Ok(Ok(ImageOutcome::Duplicate(digest))) => {
                    debug!(article = %item.id, %digest, "duplicate image skipped");
                }
                Ok(Err(e)) => {
                    warn!(article = %item.id, error = %e, "image processing failed");
                    all_succeeded = false;
                }
                Err(e) => {
                    error!(article = %item.id, error = %e, "image task panicked");
                    all_succeeded = false;
                }
            }
        }

        if all_succeeded {
            self.seen.insert(item.id.clone()).await;
            info!(article = %item.id, "article fully processed");
        }
        all_succeeded
    }

    /// Process one image: fetch, digest, dedup, persist
    ///
    /// The digest is inserted into the store only after the file write has
    /// fully succeeded; on a write failure the store is left unchanged so a
    /// later retry of the same image can still succeed cleanly.
    pub(crate) async fn process_image(&self, url: &str) -> Result<ImageOutcome> {
        let image = self.source.fetch_image(url).await?;
        let digest = ImageDigest::of_bytes(&image.bytes);

        if self.images.contains(&digest).await {
            return Ok(ImageOutcome::Duplicate(digest));
        }

        let extension = Path::new(&image.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        let file_name = match extension {
            Some(ext) => format!("{digest}.{ext}"),
            None => digest.to_string(),
        };

        let path = self.gallery_dir.join(file_name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|source| Error::Persist {
                path: path.clone(),
                source,
            })?;

        self.images.insert(digest.clone()).await;
        Ok(ImageOutcome::Stored(digest))
    }
}
