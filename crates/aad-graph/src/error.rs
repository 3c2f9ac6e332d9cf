//! Error types for directory lookups

use std::time::Duration;
use thiserror::Error;

/// Result type alias for directory operations
pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// Token acquisition failed or the token was rejected (401)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization failed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The identifier does not resolve to any user (404 or no exact match)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Server error (5xx)
    #[error("Server error: {0}")]
    Server(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl GraphError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::RateLimited { .. } | GraphError::Server(_))
    }

    /// Create an error from an HTTP status code and response body
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 => GraphError::Authentication(message),
            403 => GraphError::Forbidden(message),
            404 => GraphError::NotFound(message),
            429 => GraphError::RateLimited { retry_after: None },
            500..=599 => GraphError::Server(message),
            _ => GraphError::Other(format!("HTTP {}: {}", status, message)),
        }
    }
}

/// Whole-second `Retry-After` value, the form the directory sends.
pub(crate) fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl From<aad_config::ConfigError> for GraphError {
    fn from(err: aad_config::ConfigError) -> Self {
        GraphError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(GraphError::from_status(StatusCode::NOT_FOUND, String::new()).is_not_found());
        assert!(GraphError::from_status(StatusCode::BAD_GATEWAY, String::new()).is_retryable());
        assert!(GraphError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_retryable());

        let forbidden = GraphError::from_status(StatusCode::FORBIDDEN, "no".into());
        assert!(!forbidden.is_retryable());
        assert!(!forbidden.is_not_found());

        let teapot = GraphError::from_status(StatusCode::IM_A_TEAPOT, "brew".into());
        assert!(teapot.to_string().contains("418"));
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(reqwest::header::RETRY_AFTER, " 7".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap(),
        );
        assert_eq!(retry_after(&headers), None);
    }
}
