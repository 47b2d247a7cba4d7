//! Common types used throughout pagesweep
//!
//! This module contains the page/item data model returned by a
//! [`PageFetcher`](crate::fetcher::PageFetcher) and the accumulated
//! [`ResultSet`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// 1-based page index
pub type PageIndex = u32;

// ============================================================================
// Page Model
// ============================================================================

/// Status code the reference API uses for a fully encoded video
pub const FINISHED_STATUS: i64 = 4;

/// One record from the remote listing
///
/// Only `id` and `status` are interpreted; everything else rides along in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    #[serde(rename = "guid")]
    pub id: String,

    /// Lifecycle/processing state code
    pub status: i64,

    /// Opaque passthrough attributes
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Item {
    /// Create an item with no passthrough attributes
    pub fn new(id: impl Into<String>, status: i64) -> Self {
        Self {
            id: id.into(),
            status,
            extra: JsonObject::new(),
        }
    }
}

/// One fetched page of items plus collection-wide metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Total number of items in the whole remote collection
    pub total_items: u64,

    /// Page number echoed back by the server
    #[serde(default)]
    pub current_page: Option<u32>,

    /// Page size echoed back by the server
    #[serde(default)]
    pub items_per_page: Option<u32>,

    /// Items on this page, in server order
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Page {
    /// Create a page from its items and the collection total
    pub fn new(total_items: u64, items: Vec<Item>) -> Self {
        Self {
            total_items,
            current_page: None,
            items_per_page: None,
            items,
        }
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Decides which items contribute their id to the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFilter {
    /// Items with this status are excluded
    pub excluded_status: i64,
}

impl StatusFilter {
    /// Exclude items with the given status
    pub fn excluding(excluded_status: i64) -> Self {
        Self { excluded_status }
    }

    /// Check whether an item belongs in the result
    pub fn matches(&self, item: &Item) -> bool {
        item.status != self.excluded_status
    }

    /// Ids of every matching item on a page
    pub fn select(self, page: &Page) -> impl Iterator<Item = &str> + '_ {
        page.items
            .iter()
            .filter(move |item| self.matches(item))
            .map(|item| item.id.as_str())
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::excluding(FINISHED_STATUS)
    }
}

// ============================================================================
// Result Set
// ============================================================================

/// Accumulated ids of matching items across all pages
///
/// Set semantics: an id is stored at most once. Iteration is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    ids: BTreeSet<String>,
}

impl ResultSet {
    /// Create an empty result set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id, returning false if it was already present
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Add several ids, returning how many were new
    pub fn extend<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for id in ids {
            if self.insert(id) {
                added += 1;
            }
        }
        added
    }

    /// Check membership
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of ids
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate ids in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Consume into a sorted vector
    pub fn into_vec(self) -> Vec<String> {
        self.ids.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ResultSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
