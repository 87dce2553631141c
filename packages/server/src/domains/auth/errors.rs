use thiserror::Error;

use crate::kernel::StoreError;

/// Failures surfaced by the auth actions.
///
/// `InvalidCode` and `Expired` are both authentication failures; callers may
/// collapse them, the HTTP layer reports them separately.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid passcode")]
    InvalidCode,

    #[error("Passcode expired")]
    Expired,

    #[error("Too many attempts, request a new passcode")]
    TooManyAttempts,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Service temporarily unavailable")]
    ServiceUnavailable(#[source] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::ServiceUnavailable(err)
    }
}
