// Error handling module
// Defines the client-side error taxonomy

use thiserror::Error;

/// Errors that can occur while talking to the Healthtrack API
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network or transport error from the HTTP layer
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication failed and could not be recovered
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    /// Build an error from an HTTP status and response body
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// Status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClientError::Auth("refresh token rejected".to_string());
        assert_eq!(
            err.to_string(),
            "Authentication failed: refresh token rejected"
        );

        let err = ClientError::Api {
            status: 404,
            message: "Not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = ClientError::Config("base URL missing".to_string());
        assert_eq!(err.to_string(), "Configuration error: base URL missing");
    }

    #[test]
    fn test_internal_error_message() {
        let err = ClientError::Internal(anyhow::anyhow!("something went wrong"));
        assert_eq!(err.to_string(), "Internal error: something went wrong");
    }

    #[test]
    fn test_from_status() {
        let err = ClientError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            "credentials expired".to_string(),
        );
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "API error: 401 - credentials expired");
    }

    #[test]
    fn test_status_absent_for_non_http_errors() {
        let err = ClientError::Auth("no refresh token".to_string());
        assert_eq!(err.status(), None);

        let err = ClientError::Config("bad".to_string());
        assert_eq!(err.status(), None);
    }
}
