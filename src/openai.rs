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

pub struct OpenAiGenerator {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiGenerator {
    pub fn new(config: ProviderConfig) -> Self {
        Self { client: Client::new(), config }
    }

    fn request_body(payload: &InstructionPayload) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = payload.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": payload.prompt}));

        let mut body = json!({
            "model": payload.model,
            "messages": messages,
            "max_tokens": payload.max_tokens,
        });
        if let Some(temperature) = payload.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    fn provider(&self) -> Provider { Provider::OpenAi }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedRecord, GenerateError> {
        let payload = prompt::build_payload(request, &self.config.params);
        let url = format!("{}/chat/completions", self.config.base_url);
        info!("🔗 Making request to: {}", url);

        let builder = self.client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&Self::request_body(&payload));

        let body = generator::send(Provider::OpenAi, builder).await?;
        let text = extract_text(&body)?;
        normalize::parse_record(&text)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice { message: Message }

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

// choices[0].message.content
fn extract_text(body: &str) -> Result<String, GenerateError> {
    let parsed: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| GenerateError::Parse(format!("malformed OpenAI envelope: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerateError::Parse("OpenAI response has no message content".into()))
}
