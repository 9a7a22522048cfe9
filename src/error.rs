use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VapixError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Protocol error (HTTP {status}): {message}")]
    ProtocolError { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} does not exist")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl VapixError {
    /// Credentials were rejected; retrying the same call will not help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VapixError::AuthenticationError(_))
    }

    /// HTTP status reported by the device, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            VapixError::ProtocolError { status, .. } => Some(*status),
            VapixError::AuthenticationError(_) => Some(401),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VapixError>;
