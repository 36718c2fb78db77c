//! Gateway client for forwarding vote submissions.
//!
//! The tracker itself never performs I/O. This client posts a finished
//! [`ReviewSubmission`] to the configured vote endpoint on behalf of the
//! caller.

use crate::config::GatewaySettings;
use crate::submission::ReviewSubmission;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable consulted when no token is configured.
pub const TOKEN_ENV: &str = "PURITY_GATEWAY_TOKEN";

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Vote submission endpoint URL
    pub endpoint: String,
    /// Bearer authentication token
    pub token: String,
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// Build from config-file settings, reading the token from the
    /// environment when the file has none.
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let token = match &settings.token {
            Some(token) => token.clone(),
            None => std::env::var(TOKEN_ENV)
                .map_err(|_| GatewayError::Config(format!("{TOKEN_ENV} is not set")))?,
        };
        if settings.endpoint.trim().is_empty() {
            return Err(GatewayError::Config("empty endpoint".to_string()));
        }
        Ok(Self::new(settings.endpoint.trim(), token.trim()))
    }
}

/// Gateway client error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway config error: {0}")]
    Config(String),

    #[error("Gateway network error: {0}")]
    Network(String),

    #[error("Gateway server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Gateway serialization error: {0}")]
    Serialization(String),
}

/// Response from the vote endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Async client for the vote endpoint.
pub struct GatewayClient {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Post a submission.
    pub async fn submit(
        &self,
        submission: &ReviewSubmission,
    ) -> Result<GatewayResponse, GatewayError> {
        tracing::debug!(
            id = %submission.id,
            has_review = submission.has_review(),
            "Submitting vote"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.token)
            .json(submission)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Serialization(e.to_string()))
    }
}

/// Blocking client for synchronous callers such as the CLI.
pub struct BlockingGatewayClient {
    inner: GatewayClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingGatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: GatewayClient::new(config)?,
            runtime,
        })
    }

    pub fn submit(&self, submission: &ReviewSubmission) -> Result<GatewayResponse, GatewayError> {
        self.runtime.block_on(self.inner.submit(submission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings_with_token() {
        let settings = GatewaySettings {
            endpoint: " https://api.example.test/rpc/submit_vote ".to_string(),
            token: Some("secret".to_string()),
        };
        let config = GatewayConfig::from_settings(&settings).unwrap();
        assert_eq!(config.endpoint, "https://api.example.test/rpc/submit_vote");
        assert_eq!(config.token, "secret");
    }

    #[test]
    fn test_config_rejects_empty_endpoint() {
        let settings = GatewaySettings {
            endpoint: "  ".to_string(),
            token: Some("secret".to_string()),
        };
        assert!(matches!(
            GatewayConfig::from_settings(&settings),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_server_error_display() {
        let err = GatewayError::Server {
            status: 401,
            message: "JWT expired".to_string(),
        };
        assert_eq!(err.to_string(), "Gateway server error (401): JWT expired");
    }
}
