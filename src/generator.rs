use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, error};

use crate::{
    anthropic::AnthropicGenerator,
    config::{Provider, ProviderConfig},
    models::{GeneratedRecord, GenerationRequest},
    openai::OpenAiGenerator,
};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("subject is required")] Input,
    #[error("{0}")] Transport(String),
    #[error("failed to parse generated content: {0}")] Parse(String),
    #[error("generated content does not match the listing schema: {0}")] Schema(String),
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedRecord, GenerateError>;
}

pub fn from_config(config: &ProviderConfig) -> Arc<dyn ContentGenerator> {
    info!("Using {} provider at {} with model {}", config.provider, config.base_url, config.params.model);
    match config.provider {
        Provider::OpenAi => Arc::new(OpenAiGenerator::new(config.clone())),
        Provider::Anthropic => Arc::new(AnthropicGenerator::new(config.clone())),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Sends one prepared request and returns the raw body of a successful response.
/// A non-2xx status becomes `Transport`, using the provider's `error.message` when present.
pub(crate) async fn send(provider: Provider, request: RequestBuilder) -> Result<String, GenerateError> {
    let response = request
        .send()
        .await
        .map_err(|e| {
            error!("❌ {} request failed: {}", provider, e);
            GenerateError::Transport(format!("{provider} request failed: {e}"))
        })?;

    let status = response.status();
    info!("📥 {} response status: {}", provider, status);

    let body = response
        .text()
        .await
        .map_err(|e| GenerateError::Transport(format!("{provider} response could not be read: {e}")))?;

    if !status.is_success() {
        error!("❌ {} API error response: {}", provider, body);
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|env| env.error)
            .and_then(|detail| detail.message)
            .unwrap_or_else(|| format!("{provider} API error (HTTP {status})"));
        return Err(GenerateError::Transport(message));
    }

    Ok(body)
}
