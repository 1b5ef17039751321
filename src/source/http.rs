//! HTTP implementation of the gallery source
//!
//! Talks to the mobile JSON endpoints: the list URL with a `page` query
//! parameter yields the article batch, each article URL yields its image URL
//! set, and image URLs yield raw bytes with a Content-Disposition filename.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::source::{FetchedImage, GallerySource, ListItem};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Gallery source backed by an HTTP client
pub struct HttpGallerySource {
    /// HTTP client shared by all requests
    client: reqwest::Client,
    /// Resolved list URL (without the page parameter)
    list_url: String,
}

/// JSON shape of one list page
#[derive(Debug, Deserialize)]
struct ListPage {
    articles: Vec<RawListItem>,
}

/// JSON shape of one list entry
#[derive(Debug, Deserialize)]
struct RawListItem {
    no: String,
    subject: String,
    has_image: bool,
    url: String,
}

/// JSON shape of an article's image set
#[derive(Debug, Deserialize)]
struct ArticleImages {
    images: Vec<String>,
}

impl HttpGallerySource {
    /// Create a source from the resolved configuration
    ///
    /// # Errors
    /// Returns a configuration error if no list URL is resolvable, or a
    /// network error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let list_url = config.resolved_list_url()?;

        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "gallery-watch/",
            env!("CARGO_PKG_VERSION")
        ));
        // No timeout unless configured; a hung request stalls only its task.
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, list_url })
    }

    /// List URL for a given page number
    fn page_url(&self, page: u32) -> String {
        let separator = if self.list_url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", self.list_url, separator, page)
    }
}

#[async_trait]
impl GallerySource for HttpGallerySource {
    async fn fetch_list(&self, page: u32) -> Result<Vec<ListItem>> {
        let url = self.page_url(page);
        debug!(%url, "fetching list page");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::List(format!(
                "list page returned HTTP {}: {}",
                status.as_u16(),
                url
            )));
        }

        let list_page: ListPage = response
            .json()
            .await
            .map_err(|e| Error::List(format!("cannot parse list page: {e}")))?;

        Ok(list_page
            .articles
            .into_iter()
            .map(|raw| ListItem {
                id: raw.no,
                subject: raw.subject,
                has_image: raw.has_image,
                url: raw.url,
            })
            .collect())
    }

    async fn fetch_image_urls(&self, item: &ListItem) -> Result<Vec<String>> {
        let response = self.client.get(&item.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::List(format!(
                "article returned HTTP {}: {}",
                status.as_u16(),
                item.url
            )));
        }

        let article: ArticleImages = response
            .json()
            .await
            .map_err(|e| Error::List(format!("cannot parse article: {e}")))?;
        Ok(article.images)
    }

    async fn fetch_image(&self, url: &str) -> Result<FetchedImage> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Image(format!(
                "image returned HTTP {}: {}",
                status.as_u16(),
                url
            )));
        }

        let filename = suggested_filename(&response, url).ok_or_else(|| {
            Error::Image(format!("cannot determine filename for image: {url}"))
        })?;
        let bytes = response.bytes().await?.to_vec();

        Ok(FetchedImage { bytes, filename })
    }
}

/// Extract the suggested filename for a downloaded image
///
/// Tries the Content-Disposition header first (`filename=` and RFC 5987
/// `filename*=` forms), then falls back to the last path segment of the URL.
fn suggested_filename(response: &reqwest::Response, url: &str) -> Option<String> {
    if let Some(content_disposition) = response.headers().get("content-disposition")
        && let Ok(value) = content_disposition.to_str()
    {
        // Format: attachment; filename="cat.jpg" or filename*=UTF-8''cat.jpg
        for part in value.split(';') {
            let part = part.trim();
            if let Some(filename) = part.strip_prefix("filename=") {
                let filename = filename.trim_matches('"');
                if !filename.is_empty() {
                    return Some(filename.to_string());
                }
            } else if let Some(encoded) = part.strip_prefix("filename*=") {
                // Format is: charset'lang'encoded-filename
                if let Some(idx) = encoded.rfind('\'')
                    && let Ok(decoded) = urlencoding::decode(&encoded[idx + 1..])
                    && !decoded.is_empty()
                {
                    return Some(decoded.into_owned());
                }
            }
        }
    }

    // Fall back to the URL's last path segment
    if let Ok(parsed) = url::Url::parse(url)
        && let Some(mut segments) = parsed.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        return Some(last.to_string());
    }

    None
}
