//! # gallery-watch
//!
//! Continuously-running crawler that watches a remote gallery's article
//! list, downloads newly posted images exactly once, and persists them under
//! content-addressed names.
//!
//! The core is the deduplication and fan-out-download engine: image identity
//! is the SHA-256 of the bytes, the filesystem is the persistent record
//! (`<image_dir>/<gallery>/<digest>.<ext>`), and an article is committed as
//! processed only when every one of its images was stored or recognized as
//! a duplicate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gallery_watch::{Config, Crawler, HttpGallerySource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         gallery: Some("programming".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let source = Arc::new(HttpGallerySource::from_config(&config)?);
//!     let crawler = Crawler::new(config, source).await?;
//!     crawler.run().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Crawler core (polling, dispatch, dedup/download pipeline)
pub mod crawler;
/// Content digest of image bytes
pub mod digest;
/// Error types
pub mod error;
/// Startup directory reconciliation
pub mod reconcile;
/// Gallery source seam and HTTP implementation
pub mod source;
/// In-memory identity tracking (image store, seen articles)
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, ImageOutcome};
pub use digest::ImageDigest;
pub use error::{Error, Result};
pub use source::{FetchedImage, GallerySource, HttpGallerySource, ListItem};
pub use store::{ImageStore, SeenArticles};
