//! Error types for the ProjectPro client.
//!
//! # Design
//! Remote failures fall into three classes. `Auth` covers rejected
//! credentials and tokens, `Validation` covers payloads the server refused
//! at registration as well as responses whose shape does not match the
//! expected schema, and `Request` covers every other non-2xx status and all
//! transport failures. Error bodies are never parsed; each operation carries
//! its own fixed message.

use thiserror::Error;

/// Errors returned by `ApiClient` parse methods and by transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid credentials, or a bearer token the server rejected.
    #[error("{0}")]
    Auth(String),

    /// Malformed or duplicate input, or a response that failed schema checks.
    #[error("{0}")]
    Validation(String),

    /// Any other non-success status, or a transport failure (`status: None`).
    #[error("{message}")]
    Request { status: Option<u16>, message: String },
}

impl ApiError {
    pub(crate) fn request(status: u16, message: impl Into<String>) -> Self {
        ApiError::Request {
            status: Some(status),
            message: message.into(),
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ApiError::Request {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status attached to a `Request` error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => *status,
            _ => None,
        }
    }
}

/// Errors from durable session storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("no storage directory available")]
    NoDirectory,
}

/// Errors surfaced by `SessionManager`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_displays_message_only() {
        let err = ApiError::request(500, "failed to load projects (HTTP 500)");
        assert_eq!(err.to_string(), "failed to load projects (HTTP 500)");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn transport_error_has_no_status() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.status(), None);
        assert!(matches!(err, ApiError::Request { status: None, .. }));
    }

    #[test]
    fn session_error_is_transparent() {
        let err = SessionError::from(ApiError::Auth("login failed (HTTP 401)".to_string()));
        assert_eq!(err.to_string(), "login failed (HTTP 401)");
        assert_eq!(
            SessionError::from(StorageError::NoDirectory).to_string(),
            "no storage directory available"
        );
    }
}
