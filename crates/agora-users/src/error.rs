use thiserror::Error;

/// User-layer errors. Kept separate from the gateway's error type so the
/// gateway can map them to the canonical JSON error bodies without the two
/// layers coupling.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(String),

    #[error("user already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, UserError>;
