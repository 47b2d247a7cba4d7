// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pagesweep
//!
//! Concurrent collector for paginated HTTP JSON listing APIs.
//!
//! One probe request learns the collection size, the page count is planned
//! from it, and a fixed pool of workers fetches every page in parallel. Ids
//! of items whose status is not the excluded ("finished") status are merged
//! into a single [`ResultSet`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagesweep::{HttpPageFetcher, PaginatedCollector, Result, Settings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = Settings::load(None)?;
//!     settings.validate()?;
//!
//!     let fetcher = Arc::new(HttpPageFetcher::from_settings(&settings)?);
//!     let collector = PaginatedCollector::new(fetcher, settings.collector_config());
//!
//!     let collection = collector.collect().await?;
//!     for id in collection.results.iter() {
//!         println!("{id}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   PaginatedCollector                     │
//! │  probe() → Plan     collect() → Collection { results }   │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────┬─────────────┴──────┬──────────────────────┐
//! │  PageFetcher │     HttpClient     │       Settings       │
//! ├──────────────┼────────────────────┼──────────────────────┤
//! │ HTTP listing │ Auth (AccessKey)   │ Defaults             │
//! │ Mock (tests) │ Status checks      │ YAML file            │
//! │              │ JSON decoding      │ Env / .env           │
//! └──────────────┴────────────────────┴──────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Page, item and result set types
pub mod types;

/// Authentication
pub mod auth;

/// HTTP client
pub mod http;

/// Page fetchers
pub mod fetcher;

/// Concurrent paginated collection
pub mod collector;

/// Runtime settings
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use collector::{Collection, CollectorConfig, FailurePolicy, PaginatedCollector, Plan};
pub use config::Settings;
pub use error::{Error, Result};
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
