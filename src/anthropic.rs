use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    config::{Provider, ProviderConfig},
    generator::{self, ContentGenerator, GenerateError},
    models::{GeneratedRecord, GenerationRequest},
    normalize,
    prompt::{self, InstructionPayload},
};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicGenerator {
    client: Client,
    config: ProviderConfig,
}

impl AnthropicGenerator {
    pub fn new(config: ProviderConfig) -> Self {
        Self { client: Client::new(), config }
    }

    fn request_body(payload: &InstructionPayload) -> serde_json::Value {
        let mut body = json!({
            "model": payload.model,
            "max_tokens": payload.max_tokens,
            "messages": [{"role": "user", "content": payload.prompt}],
        });
        if let Some(system) = payload.system {
            body["system"] = json!(system);
        }
        if let Some(temperature) = payload.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

#[async_trait]
impl ContentGenerator for AnthropicGenerator {
    fn provider(&self) -> Provider { Provider::Anthropic }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedRecord, GenerateError> {
        let payload = prompt::build_payload(request, &self.config.params);
        let url = format!("{}/messages", self.config.base_url);
        info!("🔗 Making request to: {}", url);

        let builder = self.client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::request_body(&payload));

        let body = generator::send(Provider::Anthropic, builder).await?;
        let text = extract_text(&body)?;
        normalize::parse_record(&text)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentBlock {
    Text { text: String },
    Other(serde_json::Value),
}

fn extract_text(body: &str) -> Result<String, GenerateError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| GenerateError::Parse(format!("malformed Anthropic envelope: {e}")))?;
    parsed
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other(_) => None,
        })
        .ok_or_else(|| GenerateError::Parse("Anthropic response has no text content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::sample_record, prompt::GenerationParams};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> ProviderConfig {
        ProviderConfig {
            provider: Provider::Anthropic,
            api_key: "ak-test".into(),
            base_url,
            params: GenerationParams {
                model: "claude-sonnet-4-20250514".into(),
                max_tokens: 1000,
                temperature: None,
                include_system: false,
            },
        }
    }

    #[tokio::test]
    async fn sends_credentials_and_parses_text_block() {
        let server = MockServer::start().await;
        let record_json = serde_json::to_string_pretty(&sample_record()).unwrap();

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "ak-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 1000,
                "messages": [{"role": "user"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": record_json}],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = AnthropicGenerator::new(config(server.uri()));
        let record = generator.generate(&GenerationRequest::new("dragon mini").unwrap()).await.unwrap();
        assert_eq!(record, sample_record());

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("system").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn provider_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .mount(&server)
            .await;

        let generator = AnthropicGenerator::new(config(server.uri()));
        let err = generator.generate(&GenerationRequest::new("elf").unwrap()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Transport(ref m) if m == "Overloaded"), "{err}");
    }

    #[tokio::test]
    async fn invalid_generated_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "```json\n{\"title\": \"x\",}\n```"}]
            })))
            .mount(&server)
            .await;

        let generator = AnthropicGenerator::new(config(server.uri()));
        let err = generator.generate(&GenerationRequest::new("elf").unwrap()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Parse(_)), "{err}");
    }

    #[test]
    fn skips_non_text_blocks() {
        let body = r#"{"content": [{"type": "thinking", "thinking": "..."}, {"type": "text", "text": "{}"}]}"#;
        assert_eq!(extract_text(body).unwrap(), "{}");
        assert!(matches!(extract_text(r#"{"content": []}"#), Err(GenerateError::Parse(_))));
    }
}
