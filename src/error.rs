//! Error types for the Mistral SDK.

use thiserror::Error;

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reason tag for a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkReason {
    /// The request exceeded its timeout.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// The request failed before a response arrived.
    Request,
    /// The response body could not be read.
    Body,
}

impl std::fmt::Display for NetworkReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connect => write!(f, "connect"),
            Self::Request => write!(f, "request"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// Errors that can occur when using the Mistral SDK.
///
/// The set is closed: every failed call resolves to exactly one of these
/// kinds, so callers branch on the variant rather than on message text.
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication failed (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message from the server.
        message: String,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// The API key lacks permission for this operation (HTTP 403).
    #[error("Permission denied: {message}")]
    Permission {
        /// Error message from the server.
        message: String,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found: {message}")]
    NotFound {
        /// Error message from the server.
        message: String,
        /// Hint at the resource that was not found.
        resource: Option<String>,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// The request or a response payload failed validation.
    ///
    /// Covers HTTP 422, malformed JSON in an otherwise-successful response,
    /// and stream chunks that fail shape validation.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the violation.
        message: String,
        /// The offending field, when known.
        field: Option<String>,
        /// The violated constraint, when known.
        constraint: Option<String>,
    },

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Error message from the server.
        message: String,
        /// Seconds to wait before retrying, from the `retry-after` header.
        retry_after: Option<u64>,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// The server failed to process the request (HTTP 5xx).
    #[error("Server error ({status}): {message}")]
    Server {
        /// Error message from the server.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// Any other non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// Error message from the server.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// Transport-level failure that exhausted the retry budget.
    #[error("Network error ({reason}): {message}")]
    Network {
        /// Error message describing the failure.
        message: String,
        /// What part of the exchange failed.
        reason: NetworkReason,
    },

    /// Invalid client construction.
    ///
    /// Surfaced at build time, never per call.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// The call's cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
            constraint: None,
        }
    }

    /// Create a validation error naming the offending field and constraint.
    pub fn validation_field(
        message: impl Into<String>,
        field: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
            constraint: Some(constraint.into()),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>, reason: NetworkReason) -> Self {
        Self::Network {
            message: message.into(),
            reason,
        }
    }

    /// Check if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::RateLimit { .. } => true,
            Self::Server { .. } => true,
            Self::Api { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Get the HTTP status code if available.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(401),
            Self::Permission { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::RateLimit { .. } => Some(429),
            Self::Server { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Authentication { request_id, .. }
            | Self::Permission { request_id, .. }
            | Self::NotFound { request_id, .. }
            | Self::RateLimit { request_id, .. }
            | Self::Server { request_id, .. }
            | Self::Api { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Get the retry-after duration if available.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => {
                retry_after.map(std::time::Duration::from_secs)
            }
            _ => None,
        }
    }
}

/// Error response body returned by the API.
#[derive(Debug, Clone, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    /// Human-readable error message.
    pub message: Option<String>,
    /// Error type/code.
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    /// Nested detail, present on some endpoints.
    pub detail: Option<serde_json::Value>,
}

impl ApiErrorResponse {
    /// Best-effort message extraction from the body variants the API uses.
    pub(crate) fn message_or(&self, fallback: &str) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        if let Some(detail) = &self.detail {
            if let Some(s) = detail.as_str() {
                return s.to_string();
            }
            return detail.to_string();
        }
        if let Some(error_type) = &self.error_type {
            return error_type.clone();
        }
        fallback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::configuration("missing API key");
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("missing API key"));
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::RateLimit {
            message: "slow down".into(),
            retry_after: Some(60),
            request_id: None,
        }
        .is_retryable());
        assert!(Error::Server {
            message: "boom".into(),
            status: 503,
            request_id: None,
        }
        .is_retryable());
        assert!(Error::network("refused", NetworkReason::Connect).is_retryable());
        assert!(!Error::Authentication {
            message: "bad key".into(),
            request_id: None,
        }
        .is_retryable());
        assert!(!Error::validation("bad field").is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_error_status_code() {
        assert_eq!(
            Error::Authentication {
                message: String::new(),
                request_id: None,
            }
            .status_code(),
            Some(401)
        );
        assert_eq!(
            Error::Permission {
                message: String::new(),
                request_id: None,
            }
            .status_code(),
            Some(403)
        );
        assert_eq!(
            Error::Server {
                message: String::new(),
                status: 502,
                request_id: None,
            }
            .status_code(),
            Some(502)
        );
        assert_eq!(Error::validation("x").status_code(), None);
    }

    #[test]
    fn test_retry_after() {
        let err = Error::RateLimit {
            message: String::new(),
            retry_after: Some(60),
            request_id: Some("req-1".into()),
        };
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(60)));
        assert_eq!(err.request_id(), Some("req-1"));
    }

    #[test]
    fn test_api_error_body_message() {
        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"message":"Unauthorized"}"#).unwrap();
        assert_eq!(body.message_or("fallback"), "Unauthorized");

        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":"No such file"}"#).unwrap();
        assert_eq!(body.message_or("fallback"), "No such file");

        let body: ApiErrorResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.message_or("fallback"), "fallback");
    }
}
