//! Client error types

use thiserror::Error;
use tollgate_core::CoreError;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Token storage failed
    #[error("Token storage failed: {0}")]
    Storage(#[from] CoreError),

    /// No usable access token, even after a refresh attempt
    #[error("Not authenticated")]
    NotAuthenticated,
}

/// Coarse classification of a [`ClientError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response
    Network,
    /// The server or the local token state denied access
    Auth,
    /// A non-success status or a body that could not be decoded
    Decode,
    /// Reading or writing persisted tokens failed
    Storage,
    /// The client was configured incorrectly
    Configuration,
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Request(e) if e.is_decode() => ErrorKind::Decode,
            Self::Request(e) if e.is_builder() => ErrorKind::Configuration,
            Self::Request(_) => ErrorKind::Network,
            Self::AuthenticationFailed(_) | Self::Forbidden(_) | Self::NotAuthenticated => {
                ErrorKind::Auth
            }
            Self::ServerError { .. }
            | Self::NotFound(_)
            | Self::BadRequest(_)
            | Self::Serialization(_) => ErrorKind::Decode,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Whether the server answered with a non-success status
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ServerError { .. }
                | Self::AuthenticationFailed(_)
                | Self::NotFound(_)
                | Self::BadRequest(_)
                | Self::Forbidden(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, "no".into()),
            ClientError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_REQUEST, "no".into()),
            ClientError::BadRequest(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_GATEWAY, "no".into()),
            ClientError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn test_kind() {
        let unauthorized = ClientError::from_status(StatusCode::UNAUTHORIZED, String::new());
        assert_eq!(unauthorized.kind(), ErrorKind::Auth);
        assert!(unauthorized.is_rejection());

        let json_err = serde_json::from_str::<u8>("nope").unwrap_err();
        let decode = ClientError::from(json_err);
        assert_eq!(decode.kind(), ErrorKind::Decode);
        assert!(!decode.is_rejection());

        assert_eq!(ClientError::NotAuthenticated.kind(), ErrorKind::Auth);
        assert!(!ClientError::NotAuthenticated.is_rejection());
        assert_eq!(
            ClientError::from(CoreError::storage_error("disk full")).kind(),
            ErrorKind::Storage
        );
    }
}
