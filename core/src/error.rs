//! Error types for the Pocket API client.
//!
//! # Design
//! Pocket reports failures through the `X-Error-Code` / `X-Error` response
//! headers rather than the body, so `Service` carries those two values next
//! to the HTTP status. Transport errors from ureq are wrapped unchanged.

use thiserror::Error;

/// Errors returned by `PocketClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An item operation was attempted before an access token was set.
    #[error("missing access token")]
    MissingAccessToken,

    /// The HTTP layer failed (connection, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The service answered with a status other than 200.
    #[error("HTTP {status}: {message}")]
    Service {
        status: u16,
        /// Value of `X-Error-Code`, if present and numeric.
        code: Option<u32>,
        /// Value of `X-Error`, empty if the header was absent.
        message: String,
        body: String,
    },

    /// The response body was not valid in the expected encoding.
    #[error("error parsing http response: {0}")]
    Decode(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The service-defined error code, when the failure came from the service.
    pub fn service_code(&self) -> Option<u32> {
        match self {
            ApiError::Service { code, .. } => *code,
            _ => None,
        }
    }

    /// True for 401/403 service responses and for a missing access token.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::MissingAccessToken)
            || matches!(self, ApiError::Service { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(status: u16, code: Option<u32>) -> ApiError {
        ApiError::Service {
            status,
            code,
            message: "User rejected code.".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn service_error_displays_status_and_message() {
        assert_eq!(service(403, Some(158)).to_string(), "HTTP 403: User rejected code.");
    }

    #[test]
    fn service_code_only_for_service_errors() {
        assert_eq!(service(403, Some(158)).service_code(), Some(158));
        assert_eq!(ApiError::Decode("x".to_string()).service_code(), None);
    }

    #[test]
    fn auth_errors_are_classified() {
        assert!(ApiError::MissingAccessToken.is_auth_error());
        assert!(service(401, None).is_auth_error());
        assert!(service(403, Some(158)).is_auth_error());
        assert!(!service(500, Some(199)).is_auth_error());
    }
}
