use agenthub_store::{FieldError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    /// Username or email already taken.
    #[error("{0}")]
    Conflict(String),
    /// Login failure. The same message for unknown users, inactive users and
    /// wrong passwords.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// Missing, malformed, forged or expired bearer credential.
    #[error("authentication required")]
    Unauthorized,
    /// The request is well-formed but not allowed for this caller.
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Store(StoreError),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::Conflict(message),
            other => Self::Store(other),
        }
    }
}
