use axum::http::StatusCode;
use thiserror::Error;

/// Every non-success outcome of the credential store and the login verifier.
///
/// Display strings are returned to HTTP callers as-is, so no variant may carry a
/// submitted password.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InputInvalid(&'static str),
    #[error("User not exists")]
    UserNotFound,
    #[error("Wrong password")]
    PasswordMismatch,
    #[error("Account disabled")]
    AccountDisabled,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InputInvalid(_) => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::PasswordMismatch => StatusCode::UNAUTHORIZED,
            AuthError::AccountDisabled => StatusCode::FORBIDDEN,
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::Hashing(_) | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for (StatusCode, String) {
    fn from(e: AuthError) -> Self {
        (e.status(), e.to_string())
    }
}
