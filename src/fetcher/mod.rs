//! Page fetching
//!
//! A [`PageFetcher`] turns one page index into one decoded [`Page`]. It owns
//! all protocol detail; the collector only sees pages or errors.
//!
//! Failures are reported, never retried:
//! - transport errors (`Error::Http`, `Error::Timeout`) when the remote is unreachable
//! - protocol errors (`Error::HttpStatus`, `Error::Decode`) when it answers badly

mod listing;

pub use listing::{HttpPageFetcher, ACCESS_KEY_HEADER};

use crate::error::Result;
use crate::types::{Page, PageIndex};
use async_trait::async_trait;
use std::sync::Arc;

/// Fetches a single page of the remote collection
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch page `page` (1-based) holding up to `page_size` items
    async fn fetch(&self, page: PageIndex, page_size: u32) -> Result<Page>;
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for Arc<F> {
    async fn fetch(&self, page: PageIndex, page_size: u32) -> Result<Page> {
        (**self).fetch(page, page_size).await
    }
}
