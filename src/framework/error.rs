//! # Framework Errors
//!
//! This module defines the error types shared by every asynchronous operation.
//!
//! - [`ErrorInfo`] is the normalized, cloneable description that gets *stored* in
//!   operation state. Observers render its `message` inline; it is never thrown.
//! - [`FrameworkError`] covers failures of the framework plumbing itself.

use serde::Serialize;
use std::fmt::{self, Display};

/// A normalized error description carrying a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Captures the `Display` output of any error.
    pub fn from_error<E: Display + ?Sized>(error: &E) -> Self {
        Self::new(error.to_string())
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorInfo {}

/// Errors that can occur within the operation framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Operation dropped")]
    OperationDropped,
    #[error("Invocation {0} was superseded by a newer trigger")]
    Superseded(u64),
}
