//! Indicator API abstraction.

pub mod falcon;

use crate::indicator::Indicator;
use async_trait::async_trait;
use std::fmt;

/// OAuth2 bearer token, valid for the duration of one run.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// First ten characters, safe to log.
    pub fn preview(&self) -> String {
        let head: String = self.0.chars().take(10).collect();
        format!("{}...", head)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&self.preview()).finish()
    }
}

/// How the API answered a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// HTTP 201, the indicator was created.
    Created,
    /// The platform already holds this indicator.
    AlreadyExists { status: u16 },
    /// Any other non-201 answer.
    Rejected { status: u16, reason: String },
}

/// Error talking to the indicator API.
#[derive(Debug)]
pub enum ApiError {
    /// HTTP request failed.
    Http(reqwest::Error),
    /// Timeout.
    Timeout,
    /// Unexpected HTTP status.
    Status { status: u16, body: String },
    /// Invalid response.
    InvalidResponse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "HTTP error: {}", e),
            ApiError::Timeout => write!(f, "Request timed out"),
            ApiError::Status { status, body } => write!(f, "HTTP {}: {}", status, body),
            ApiError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Http(e)
        }
    }
}

/// Platform that accepts indicators.
#[async_trait]
pub trait IndicatorApi: Send + Sync {
    /// Exchange client credentials for a bearer token.
    async fn authenticate(&self) -> Result<AccessToken, ApiError>;

    /// Submit a single indicator.
    async fn create_indicator(
        &self,
        token: &AccessToken,
        indicator: &Indicator,
    ) -> Result<SubmitOutcome, ApiError>;

    /// API name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_preview() {
        let token = AccessToken::new("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(token.preview(), "abcdefghij...");
        assert_eq!(token.secret(), "abcdefghijklmnopqrstuvwxyz");

        let short = AccessToken::new("abc");
        assert_eq!(short.preview(), "abc...");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AccessToken::new("abcdefghijSECRETPART");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("SECRETPART"));
        assert!(debug.contains("abcdefghij"));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
        assert_eq!(ApiError::Timeout.to_string(), "Request timed out");
    }
}
