//! HTTP client module
//!
//! Thin wrapper over `reqwest` that applies base URL, default headers,
//! authentication and timeouts, and classifies failures into transport and
//! protocol errors. Every request is attempted exactly once.

mod client;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};
