//! Error types for GitLab CI client operations

use compact_str::{format_compact, CompactString};
use serde::Deserialize;
use thiserror::Error;

/// Structured error types for GitLab CI client construction and upstream calls
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connect, timeout, or an unreadable body
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not decode into the expected type
    #[error("Failed to decode response from {url}: {source}")]
    Conversion {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Request body could not be encoded
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// GitLab answered 404
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    /// GitLab answered with any other non-success status
    #[error("GitLab API error (HTTP {status}) from {url}: {message}")]
    Upstream { status: u16, url: String, message: CompactString },

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration field validation failed
    #[error("Invalid {field}: {message}")]
    ConfigValidation { field: String, message: String },

    /// Invalid URL format
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// OAuth-style error body, returned for authentication failures
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error: CompactString,
    error_description: Option<CompactString>,
}

/// `{"message": ...}` body; the message may be a string or a field map
#[derive(Debug, Deserialize)]
struct MessageErrorBody {
    message: serde_json::Value,
}

impl ClientError {
    /// Create a conversion error with endpoint context
    pub fn conversion(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Conversion { url: url.into(), source }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a configuration field validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation { field: field.into(), message: message.into() }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Translate a non-success response into the error every client reports.
    ///
    /// 404 becomes [`ClientError::NotFound`]; every other status becomes
    /// [`ClientError::Upstream`] with the message GitLab put in the body.
    pub fn from_response(status: u16, url: impl Into<String>, body: &str) -> Self {
        let url = url.into();
        if status == 404 {
            return Self::NotFound { url };
        }

        let message = if let Ok(api_error) = serde_json::from_str::<AuthErrorBody>(body) {
            match api_error.error_description {
                Some(description) => format_compact!("{}: {}", api_error.error, description),
                None => api_error.error,
            }
        } else if let Ok(body) = serde_json::from_str::<MessageErrorBody>(body) {
            match body.message {
                serde_json::Value::String(message) => message.into(),
                other => format_compact!("{}", other),
            }
        } else {
            body.trim().into()
        };

        Self::Upstream { status, url, message }
    }

    /// HTTP status reported by the upstream, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            ClientError::NotFound { .. } => Some(404),
            ClientError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller could reasonably try the same request again.
    ///
    /// Nothing in this crate retries; callers decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(e) => e.is_timeout() || e.is_connect(),
            ClientError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ClientError::config("Invalid token");
        assert!(matches!(err, ClientError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: Invalid token");
    }

    #[test]
    fn test_not_found_translation() {
        let err = ClientError::from_response(404, "https://gitlab.example.com/api/v4/projects/1", "");
        assert!(matches!(err, ClientError::NotFound { .. }));
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_upstream_message_formats() {
        let err = ClientError::from_response(
            401,
            "u",
            r#"{"error":"invalid_token","error_description":"Token was revoked"}"#,
        );
        assert_eq!(
            err.to_string(),
            "GitLab API error (HTTP 401) from u: invalid_token: Token was revoked"
        );

        let err = ClientError::from_response(403, "u", r#"{"message":"403 Forbidden"}"#);
        assert!(matches!(
            &err,
            ClientError::Upstream { status: 403, message, .. } if message == "403 Forbidden"
        ));

        let err = ClientError::from_response(400, "u", r#"{"message":{"ref":["is missing"]}}"#);
        assert!(matches!(
            &err,
            ClientError::Upstream { message, .. } if message.contains("is missing")
        ));

        let err = ClientError::from_response(502, "u", "Bad Gateway\n");
        assert!(matches!(
            &err,
            ClientError::Upstream { status: 502, message, .. } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::from_response(429, "u", "").is_retryable());
        assert!(ClientError::from_response(503, "u", "").is_retryable());
        assert!(!ClientError::from_response(400, "u", "").is_retryable());
        assert!(!ClientError::config("test").is_retryable());
        assert!(!ClientError::invalid_url("nope").is_retryable());
    }
}
