use crate::auth::FieldErrors;
use crate::framework::{ErrorInfo, FrameworkError};
use thiserror::Error;

/// Why a login, sign-up or logout did not complete.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    /// The form was rejected locally; nothing was sent.
    #[error("Invalid form: {0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Backend(ErrorInfo),

    #[error(transparent)]
    Framework(#[from] FrameworkError),
}
