//! HTTP implementation of [`PageFetcher`] for video library listings
//!
//! `GET {base}/library/{library_id}/videos?page=&itemsPerPage=&orderBy=`

use super::PageFetcher;
use crate::auth::AuthConfig;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::types::{Page, PageIndex};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Header carrying the library access key
pub const ACCESS_KEY_HEADER: &str = "AccessKey";

/// Fetches listing pages over HTTP
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: HttpClient,
    endpoint: String,
    order_by: Option<String>,
}

impl HttpPageFetcher {
    /// Create a fetcher for the library's listing endpoint under `base_url`
    pub fn new(client: HttpClient, base_url: &str, library_id: &str) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: listing_endpoint(base_url, library_id)?,
            order_by: None,
        })
    }

    /// Build the client and fetcher from validated settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = HttpClientConfig::default()
            .timeout(settings.timeout())
            .header("accept", "application/json");
        let client = HttpClient::with_auth(
            config,
            AuthConfig::api_key_header(ACCESS_KEY_HEADER, &settings.access_key),
        )?;

        Ok(Self::new(client, &settings.base_url, &settings.library_id)?
            .with_order_by(&settings.order_by))
    }

    /// Set the sort key sent with every request
    #[must_use]
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        let order_by = order_by.into();
        self.order_by = (!order_by.is_empty()).then_some(order_by);
        self
    }

    /// Full listing URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, page: PageIndex, page_size: u32) -> Result<Page> {
        if page == 0 {
            return Err(Error::invalid_value("page", "page indices start at 1"));
        }
        if page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }

        let mut req = RequestConfig::new()
            .query("page", page)
            .query("itemsPerPage", page_size);
        if let Some(order_by) = &self.order_by {
            req = req.query("orderBy", order_by);
        }

        let result: Page = self.client.get_json(&self.endpoint, req).await?;
        debug!(
            page,
            items = result.items.len(),
            total_items = result.total_items,
            "Fetched page"
        );
        Ok(result)
    }
}

fn listing_endpoint(base_url: &str, library_id: &str) -> Result<String> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|()| Error::invalid_value("base_url", "cannot be used as a base URL"))?
        .pop_if_empty()
        .extend(["library", library_id, "videos"]);
    Ok(url.into())
}
