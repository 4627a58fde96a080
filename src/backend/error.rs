//! Errors reported by the remote backend.

use thiserror::Error;

/// A remote call failed or returned an error payload. Never retried automatically.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The request could not be delivered.
    #[error("Backend unavailable")]
    Unavailable,

    /// The backend went away before answering.
    #[error("Backend dropped response channel")]
    Dropped,

    /// The backend refused the request (bad credentials, duplicate account, ...).
    #[error("{0}")]
    Rejected(String),

    /// A query failed.
    #[error("{0}")]
    Query(String),
}
