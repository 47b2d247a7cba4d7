//! Attaches credentials to outgoing requests

use super::types::AuthConfig;
use reqwest::RequestBuilder;

/// Applies one fixed credential to every request it sees
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// The credential being applied
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Decorate `req` with the credential
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config {
            AuthConfig::None => req,
            AuthConfig::Header { name, value } => req.header(name.as_str(), value.as_str()),
            AuthConfig::Query { param, value } => req.query(&[(param, value)]),
            AuthConfig::Bearer { token } => req.bearer_auth(token),
        }
    }
}
