//! services/api/src/adapters/xkcd.rs
//!
//! This module contains the adapter for the xkcd comic index. It implements
//! the `ComicSource` port from the `core` crate.
//!
//! The index exposes two JSON GET endpoints: `/info.0.json` for the latest
//! comic and `/{num}/info.0.json` for a specific number. Neither requires an
//! API key. Failures surface immediately; there is no retry logic.

use async_trait::async_trait;
use serde::Deserialize;

use comic_courier_core::domain::ComicMetadata;
use comic_courier_core::ports::{ComicSource, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ComicSource` port against the xkcd API.
///
/// The `reqwest::Client` is constructed by the caller so the upstream timeout
/// is applied uniformly (see `Config::upstream_timeout`).
#[derive(Clone)]
pub struct XkcdAdapter {
    http: reqwest::Client,
    base_url: String,
}

/// The subset of the upstream body this service cares about. Unknown fields
/// are ignored.
#[derive(Debug, Deserialize)]
struct XkcdComicBody {
    num: i32,
    title: String,
    img: String,
    alt: String,
}

impl XkcdAdapter {
    /// Creates a new `XkcdAdapter` rooted at `base_url` (no trailing slash).
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn fetch_comic_body(&self, url: &str) -> PortResult<XkcdComicBody> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PortError::UpstreamUnavailable(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::UpstreamUnavailable(format!(
                "GET {url} returned {status}"
            )));
        }

        response
            .json::<XkcdComicBody>()
            .await
            .map_err(|e| PortError::UpstreamParse(format!("GET {url}: {e}")))
    }
}

//=========================================================================================
// `ComicSource` Trait Implementation
//=========================================================================================

#[async_trait]
impl ComicSource for XkcdAdapter {
    /// The number of the most recently published comic.
    async fn latest_comic_number(&self) -> PortResult<i32> {
        let url = format!("{}/info.0.json", self.base_url);
        let body = self.fetch_comic_body(&url).await?;
        Ok(body.num)
    }

    /// Metadata for one specific comic number.
    async fn comic_by_number(&self, num: i32) -> PortResult<ComicMetadata> {
        let url = format!("{}/{}/info.0.json", self.base_url, num);
        let body = self.fetch_comic_body(&url).await?;
        Ok(ComicMetadata {
            num: body.num,
            title: body.title,
            img: body.img,
            alt: body.alt,
        })
    }
}
