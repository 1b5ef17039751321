//! Configuration types for gallery-watch

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Base URL for deriving a mobile list URL from a bare gallery identifier
const DEFAULT_LIST_BASE: &str = "https://m.dcinside.com/list.php";

/// Main configuration for the crawler
///
/// Either `gallery` or `list_url` must be set; each is derivable from the
/// other (`gallery` from the URL's `id=` query parameter, the URL from
/// `gallery` and the default list base). All settings are fixed at process
/// start; there is no runtime reconfiguration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Gallery identifier (e.g., "programming")
    #[serde(default)]
    pub gallery: Option<String>,

    /// Full list URL (e.g., "https://m.dcinside.com/list.php?id=programming")
    #[serde(default)]
    pub list_url: Option<String>,

    /// Base directory for stored images (default: "./image")
    ///
    /// Images land in `<image_dir>/<gallery>/<digest>.<ext>`.
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Interval between list polls (default: 3 seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Per-request HTTP timeout (default: none)
    ///
    /// A hung network call stalls only its own image task, never the poll
    /// loop; setting a timeout bounds how long such a task can hang.
    #[serde(default)]
    pub request_timeout: Option<Duration>,
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("./image")
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(3)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gallery: None,
            list_url: None,
            image_dir: default_image_dir(),
            poll_interval: default_poll_interval(),
            request_timeout: None,
        }
    }
}

impl Config {
    /// Resolve the gallery identifier
    ///
    /// Uses `gallery` when set, otherwise extracts the `id=` query parameter
    /// from `list_url`.
    ///
    /// # Errors
    /// Returns a configuration error if neither form resolves to an
    /// identifier.
    pub fn gallery_id(&self) -> Result<String> {
        if let Some(gallery) = &self.gallery {
            return Ok(gallery.clone());
        }
        if let Some(list_url) = &self.list_url {
            #[allow(clippy::unwrap_used)] // literal pattern, compiles
            let id_re = Regex::new(r"id=([^&]*)").unwrap();
            if let Some(captures) = id_re.captures(list_url)
                && let Some(id) = captures.get(1)
                && !id.as_str().is_empty()
            {
                return Ok(id.as_str().to_string());
            }
            return Err(Error::config(
                format!("cannot find gallery id in list URL: {list_url}"),
                Some("list_url"),
            ));
        }
        Err(Error::config(
            "either gallery or list_url must be set",
            Some("gallery"),
        ))
    }

    /// Resolve the list URL
    ///
    /// Uses `list_url` when set, otherwise derives one from `gallery` and
    /// the default list base.
    ///
    /// # Errors
    /// Returns a configuration error if neither setting is present.
    pub fn resolved_list_url(&self) -> Result<String> {
        if let Some(list_url) = &self.list_url {
            return Ok(list_url.clone());
        }
        if let Some(gallery) = &self.gallery {
            return Ok(format!("{DEFAULT_LIST_BASE}?id={gallery}"));
        }
        Err(Error::config(
            "either gallery or list_url must be set",
            Some("list_url"),
        ))
    }
}
