//! Online Store REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - One attempt per call: no retries, no backoff
//! - The server is the source of truth; nothing is cached between calls
//!
//! # Example
//!
//! ```rust,ignore
//! use the_shop_client::api::ApiClient;
//!
//! let api = ApiClient::new(&config)?;
//!
//! let products = api.products(Some("electronics")).await?;
//! let token = api.login(&LoginRequest { email, password }).await?;
//! let me = api.current_user(&SecretString::from(token.access_token)).await?;
//! ```

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {}", detail.as_deref().unwrap_or("(no error details provided)"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// The server's `detail` message, when the body carried one.
        detail: Option<String>,
    },

    /// A success response whose body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the server rejected the bearer token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// The server-provided error detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// HTTP status code, when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// FastAPI error body: `{"detail": "..."}` or `{"detail": [{"msg": ...}]}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct ValidationIssue {
    msg: String,
}

/// Extract the `detail` message from an error response body.
///
/// Returns `None` for empty, non-JSON or detail-less bodies.
pub(crate) fn parse_error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = match parsed.detail? {
        ErrorDetail::Message(message) => message,
        ErrorDetail::Validation(issues) => issues
            .into_iter()
            .map(|issue| issue.msg)
            .collect::<Vec<_>>()
            .join("; "),
        ErrorDetail::Other(value) => value.to_string(),
    };
    let message = message.trim().to_string();
    (!message.is_empty()).then_some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail() {
        assert_eq!(
            parse_error_detail(r#"{"detail":"Incorrect email or password"}"#).as_deref(),
            Some("Incorrect email or password")
        );
    }

    #[test]
    fn test_validation_detail_joins_messages() {
        let body = r#"{"detail":[
            {"loc":["body","rating"],"msg":"Input should be less than or equal to 5","type":"less_than_equal"},
            {"loc":["body","product_id"],"msg":"Field required","type":"missing"}
        ]}"#;
        assert_eq!(
            parse_error_detail(body).as_deref(),
            Some("Input should be less than or equal to 5; Field required")
        );
    }

    #[test]
    fn test_missing_or_unusable_detail() {
        assert_eq!(parse_error_detail(""), None);
        assert_eq!(parse_error_detail("Internal Server Error"), None);
        assert_eq!(parse_error_detail(r#"{"error":"nope"}"#), None);
        assert_eq!(parse_error_detail(r#"{"detail":"   "}"#), None);
    }

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            status: 400,
            detail: Some("Product already in wishlist".to_string()),
        };
        assert_eq!(err.to_string(), "API error: 400 - Product already in wishlist");
        assert_eq!(err.detail(), Some("Product already in wishlist"));

        let err = ApiError::Status {
            status: 502,
            detail: None,
        };
        assert_eq!(err.to_string(), "API error: 502 - (no error details provided)");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_unauthorized() {
        let err = ApiError::Status {
            status: 401,
            detail: Some("Could not validate credentials".to_string()),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
    }
}
