//! Credential types

use std::fmt;

/// Credential attached to every outgoing request
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// Anonymous requests
    #[default]
    None,

    /// Static key sent verbatim in a named header (`AccessKey: <key>`)
    Header {
        /// Header name
        name: String,
        /// Key value
        value: String,
    },

    /// Static key appended as a query parameter
    Query {
        /// Parameter name
        param: String,
        /// Key value
        value: String,
    },

    /// `Authorization: Bearer <token>`
    Bearer {
        /// The bearer token
        token: String,
    },
}

impl AuthConfig {
    /// Key sent in the named header
    pub fn api_key_header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Key sent as the named query parameter
    pub fn api_key_query(param: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Query {
            param: param.into(),
            value: value.into(),
        }
    }

    /// Bearer token
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }
}

// Secrets never reach logs through Debug.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Header { name, .. } => write!(f, "Header({name}: ***)"),
            Self::Query { param, .. } => write!(f, "Query({param}=***)"),
            Self::Bearer { .. } => f.write_str("Bearer(***)"),
        }
    }
}
