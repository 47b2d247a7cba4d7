//! Authentication module
//!
//! Supports: static key (header or query), Bearer token
//!
//! The `Authenticator` applies the configured credential to every outgoing
//! request. Credentials are static for the lifetime of a run.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
