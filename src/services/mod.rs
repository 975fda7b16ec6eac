// src/services/mod.rs
//! Gateways to the remote services the landing page talks to.
//!
//! Every gateway swallows its own failures and hands callers a typed
//! outcome; `GatewayError` never leaves this module tree.

pub mod analytics;
pub mod copywriter;
pub mod persistence;

/// A gateway client that may be missing because its configuration is.
#[derive(Clone)]
pub enum Capability<T> {
    Configured(T),
    Unconfigured { service: &'static str },
}

impl<T> Capability<T> {
    pub fn is_configured(&self) -> bool {
        matches!(self, Capability::Configured(_))
    }

    pub fn get(&self) -> Result<&T, GatewayError> {
        match self {
            Capability::Configured(client) => Ok(client),
            Capability::Unconfigured { service } => Err(GatewayError::Unconfigured(service)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0} is not configured")]
    Unconfigured(&'static str),

    /// The remote service answered and reported a failure.
    #[error("remote error {status}: {message}")]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(&'static str),

    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

/// Turns a configured base URL into one that `Url::join` appends to.
pub(crate) fn base_url(raw: &str) -> Result<url::Url, url::ParseError> {
    let trimmed = raw.trim().trim_end_matches('/');
    url::Url::parse(&format!("{}/", trimmed))
}
