//! CrowdStrike Falcon indicator API client.

use super::{AccessToken, ApiError, IndicatorApi, SubmitOutcome};
use crate::config::ApiConfig;
use crate::indicator::{CreateIndicatorsRequest, Indicator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const TOKEN_PATH: &str = "oauth2/token";
const INDICATORS_PATH: &str = "iocs/entities/indicators/v1";

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Error envelope returned by the indicator API.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Option<Vec<ApiErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    #[serde(default)]
    message: String,
}

/// Falcon API client.
pub struct FalconClient {
    config: ApiConfig,
    client: Client,
}

impl FalconClient {
    /// Create a new client.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl IndicatorApi for FalconClient {
    async fn authenticate(&self) -> Result<AccessToken, ApiError> {
        let url = self.config.endpoint(TOKEN_PATH);

        debug!(url = %url, "Requesting access token");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!(status = status.as_u16(), "Access token response");

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse token response: {}", e))
        })?;

        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
            _ => Err(ApiError::InvalidResponse(
                "access_token missing from token response".to_string(),
            )),
        }
    }

    async fn create_indicator(
        &self,
        token: &AccessToken,
        indicator: &Indicator,
    ) -> Result<SubmitOutcome, ApiError> {
        let url = self.config.endpoint(INDICATORS_PATH);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.secret())
            .json(&CreateIndicatorsRequest::single(indicator))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!(
            kind = %indicator.kind(),
            value = indicator.value(),
            status = status.as_u16(),
            body = %body,
            "Indicator create response"
        );

        Ok(classify_response(status, &body))
    }

    fn name(&self) -> &str {
        "falcon"
    }
}

/// Map a create response onto an outcome.
///
/// Only 201 counts as created. 409, or a 4xx whose error text mentions a
/// duplicate or existing indicator, counts as already present.
fn classify_response(status: StatusCode, body: &str) -> SubmitOutcome {
    if status == StatusCode::CREATED {
        return SubmitOutcome::Created;
    }

    let reason = error_reason(body);

    let mentions_duplicate = {
        let lower = reason.to_lowercase();
        lower.contains("duplicate") || lower.contains("already exist")
    };

    if status == StatusCode::CONFLICT || (status.is_client_error() && mentions_duplicate) {
        return SubmitOutcome::AlreadyExists {
            status: status.as_u16(),
        };
    }

    SubmitOutcome::Rejected {
        status: status.as_u16(),
        reason,
    }
}

/// First error message from the vendor envelope, else the raw body.
fn error_reason(body: &str) -> String {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();

    envelope
        .errors
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.message)
        .find(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}
