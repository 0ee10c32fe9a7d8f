#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique key (username, email, session token) is already taken.
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A persisted row could not be mapped back to a domain value.
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
