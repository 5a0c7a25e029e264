//! Error types for the book catalog client.
//!
//! # Design
//! Errors are surfaced to the caller unchanged: a non-2xx response keeps its
//! raw status and body, and nothing is retried. Callers that care about a
//! specific status (404 on a stale id, 401 on an expired token) match on
//! `ApiError::Status`.

use thiserror::Error;

use crate::form::ValidationErrors;

/// Errors returned by the client core and its hosts.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Form input was rejected before any request was built.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl ApiError {
    /// HTTP status when the backend rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
