//! Error types for API operations

use crate::auth::{AuthError, StorageError};
use thiserror::Error;

/// Failure of a single wire call
#[derive(Debug, Error)]
pub enum TransportError {
    /// Server answered with a non-success status
    #[error("{method} {path} failed with HTTP {status}: {body}")]
    Http {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// Connection, timeout or protocol failure
    #[error("request to {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body was not valid JSON
    #[error("invalid JSON in response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// No usable credential for the account
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),
}

impl TransportError {
    /// HTTP status of the failure, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors surfaced by the write engine and read services
#[derive(Debug, Error)]
pub enum ApiError {
    /// Entity is missing data required before any request is sent
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// A write returned no data where data was mandatory
    #[error("empty response for {method} {path} ({count} entities)")]
    EmptyResponse {
        method: String,
        path: String,
        count: usize,
    },

    /// A fetch by id returned a record with a different id
    #[error("{resource} with id {requested} not returned (got id {returned:?})")]
    IdentityMismatch {
        resource: String,
        requested: u64,
        returned: Option<u64>,
    },

    /// A fetch by id returned no record at all
    #[error("{resource} with id {id} not found")]
    NotFound { resource: String, id: u64 },

    /// Token persistence failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Transport failure, propagated unchanged
    #[error(transparent)]
    Transport(TransportError),

    /// Entity could not be (de)serialized
    #[error("failed to convert {resource} record: {source}")]
    Serialization {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<TransportError> for ApiError {
    /// Storage failures hit while authorizing a call stay distinguishable from transport ones
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Auth(AuthError::Storage(storage)) => Self::Storage(storage),
            other => Self::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_is_lifted_out_of_transport() {
        let error = TransportError::Auth(AuthError::Storage(StorageError::NotFound {
            domain: "example.amocrm.ru".to_string(),
        }));

        assert!(matches!(ApiError::from(error), ApiError::Storage(_)));
    }

    #[test]
    fn test_http_error_stays_transport() {
        let error = TransportError::Http {
            method: "PATCH".to_string(),
            path: "/api/v4/leads".to_string(),
            status: 400,
            body: "{}".to_string(),
        };

        let api_error = ApiError::from(error);
        assert!(matches!(api_error, ApiError::Transport(ref e) if e.status() == Some(400)));
    }
}
