//! Multipart routing error types

use thiserror::Error;

/// Multipart routing result type
pub type MultipartResult<T> = Result<T, MultipartError>;

/// Errors raised while routing and accumulating multipart body parts
#[derive(Error, Debug)]
pub enum MultipartError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode form field '{name}': {reason}")]
    DecodeFailure { name: String, reason: String },

    #[error("Multipart parse error: {0}")]
    Parse(String),

    #[error("Decode task failed: {0}")]
    Join(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MultipartError {
    /// Returns true if the error came from the file-system capability
    /// or from writing part bytes
    pub fn is_io(&self) -> bool {
        matches!(self, MultipartError::Io(_))
    }

    /// Returns true if the error came from the request body itself
    /// (malformed multipart, missing headers, undecodable field text)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MultipartError::InvalidOperation(_)
                | MultipartError::DecodeFailure { .. }
                | MultipartError::Parse(_)
        )
    }
}

impl From<multer::Error> for MultipartError {
    fn from(err: multer::Error) -> Self {
        MultipartError::Parse(err.to_string())
    }
}

impl From<tokio::task::JoinError> for MultipartError {
    fn from(err: tokio::task::JoinError) -> Self {
        MultipartError::Join(err.to_string())
    }
}
