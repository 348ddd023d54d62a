use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A room already holds its maximum number of viewers
    #[error("Capacity reached: {0}")]
    Capacity(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<opendal::Error> for Error {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound("Object not found".to_string()),
            _ => Self::Storage(err.to_string()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Authentication("Token expired".to_string()),
            ErrorKind::InvalidToken => Self::Authentication("Invalid token".to_string()),
            ErrorKind::InvalidSignature => {
                Self::Authentication("Invalid token signature".to_string())
            }
            _ => Self::Authentication(format!("Token verification failed: {err}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
