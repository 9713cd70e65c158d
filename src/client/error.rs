use thiserror::Error;

/// Classified failure of an API call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connection refused, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected input; the message is the backend's, verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Refused locally before any request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Map a non-success status and the backend's message to a variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ClientError::Unauthorized(message),
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            400..=499 => ClientError::Validation(message),
            _ => ClientError::Server { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Conflict(_) => Some(409),
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Validation(_)
            | ClientError::InvalidResponse(_)
            | ClientError::InvalidInput(_) => None,
        }
    }
}
