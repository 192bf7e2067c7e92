//! Credentials for amoCRM accounts: permanent tokens, OAuth2 and token persistence

pub mod oauth;
pub mod provider;
pub mod storage;

pub use oauth::{OAuth2Auth, OAuthCredentials, OAuthTokens};
pub use provider::{AuthProvider, PermanentTokenAuth};
pub use storage::{DatabaseTokenStore, FileTokenStore, TokenStore};

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a credential
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("permanent token for '{subdomain}' is empty")]
    EmptyToken { subdomain: String },

    /// Neither a configured token nor a stored one exists
    #[error("no credentials for '{domain}'; authorize the integration first")]
    MissingTokens { domain: String },

    #[error("token request to {url} failed with HTTP {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("token request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Token persistence failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no tokens stored for '{domain}'")]
    NotFound { domain: String },

    #[error("token file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored tokens for '{domain}' are not valid JSON: {source}")]
    Json {
        domain: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("token database error for '{domain}': {source}")]
    Database {
        domain: String,
        #[source]
        source: sqlx::Error,
    },
}
