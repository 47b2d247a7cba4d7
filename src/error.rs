//! Error types for pagesweep
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for pagesweep
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ============================================================================
    // Protocol Errors
    // ============================================================================
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Collection Errors
    // ============================================================================
    #[error("Page {page} failed: {source}")]
    PageFetch {
        page: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Worker pool error: {message}")]
    WorkerPool { message: String },

    #[error("Collection cancelled")]
    Cancelled,

    #[error("Collection incomplete: {failed} of {pages} pages failed")]
    Incomplete { failed: usize, pages: u32 },
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Wrap an error with the page index it occurred on
    pub fn page(page: u32, source: Error) -> Self {
        Self::PageFetch {
            page,
            source: Box::new(source),
        }
    }

    /// Create a worker pool error
    pub fn worker_pool(message: impl Into<String>) -> Self {
        Self::WorkerPool {
            message: message.into(),
        }
    }

    /// Network-level failure reaching the remote endpoint
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_decode() && !e.is_status(),
            Error::Timeout { .. } => true,
            Error::PageFetch { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// The remote answered, but not with a usable page
    pub fn is_protocol(&self) -> bool {
        match self {
            Error::Http(e) => e.is_decode() || e.is_status(),
            Error::HttpStatus { .. }
            | Error::Decode { .. }
            | Error::JsonParse(_)
            | Error::InvalidUrl(_) => true,
            Error::PageFetch { source, .. } => source.is_protocol(),
            _ => false,
        }
    }

    /// Missing or invalid configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::YamlParse(_)
        )
    }
}

/// Result type alias for pagesweep
pub type Result<T> = std::result::Result<T, Error>;
