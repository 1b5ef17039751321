//! Gallery source seam
//!
//! The crawler consumes the remote gallery through the [`GallerySource`]
//! trait: fetch a page of the article list, resolve an article's image URLs,
//! and fetch one image's bytes plus its suggested filename. Everything about
//! the remote protocol (pagination, parsing, URL construction) lives behind
//! this seam; the crawler core only sees success or failure.
//!
//! [`HttpGallerySource`] is the production implementation over the mobile
//! JSON endpoints. Tests substitute their own implementations.

mod http;

pub use http::HttpGallerySource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry of the remote article list
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListItem {
    /// Stable article identifier (e.g., a post number)
    pub id: String,
    /// Human-readable subject line
    pub subject: String,
    /// Whether the list flags this article as carrying at least one image
    pub has_image: bool,
    /// URL of the article itself, used to resolve its image URLs
    pub url: String,
}

/// Raw image bytes together with the filename the server suggested
#[derive(Clone, Debug)]
pub struct FetchedImage {
    /// The image bytes
    pub bytes: Vec<u8>,
    /// Suggested filename (Content-Disposition or URL-derived); its
    /// extension becomes the stored file's extension
    pub filename: String,
}

/// Remote gallery collaborator consumed by the crawler core
#[async_trait]
pub trait GallerySource: Send + Sync {
    /// Fetch one page of the article list
    async fn fetch_list(&self, page: u32) -> Result<Vec<ListItem>>;

    /// Resolve the full set of image URLs for one article
    async fn fetch_image_urls(&self, item: &ListItem) -> Result<Vec<String>>;

    /// Fetch one image's bytes and suggested filename
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage>;
}
