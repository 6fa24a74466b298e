use thiserror::Error;

/// Top-level error type. Domain crates define their own error enums and
/// convert into this one at the gateway boundary, where it is mapped to an
/// HTTP status code and the fixed error body text from the wire spec.
#[derive(Debug, Error)]
pub enum AgoraError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl AgoraError {
    /// Short code logged alongside the error; never sent on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            AgoraError::Config(_) => "CONFIG_ERROR",
            AgoraError::Database(_) => "DATABASE_ERROR",
            AgoraError::Serialization(_) => "SERIALIZATION_ERROR",
            AgoraError::Io(_) => "IO_ERROR",
            AgoraError::BadRequest(_) => "BAD_REQUEST",
            AgoraError::Unauthorized => "UNAUTHORIZED",
            AgoraError::NotFound(_) => "NOT_FOUND",
            AgoraError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
        }
    }
}

pub type Result<T> = std::result::Result<T, AgoraError>;
