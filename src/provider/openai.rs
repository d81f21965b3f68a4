use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::errors::CoachError;
use crate::wire::Instruction;

/// OpenAI-compatible chat completions endpoint (OpenAI itself or any gateway
/// that speaks the same protocol).
pub struct OpenAIProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(base_url: String, model: String, api_key: String, timeout: Duration) -> Result<Self, CoachError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::Config(format!("http client: {e}")))?;
        Ok(Self { base_url, model, api_key, client })
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    #[tracing::instrument(skip(self, ins), fields(model = %self.model))]
    async fn complete(&self, ins: &Instruction) -> Result<String, CoachError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": ins.system },
                { "role": "user", "content": ins.user }
            ],
            // Force a valid JSON object in the response.
            "response_format": { "type": "json_object" }
        });

        tracing::debug!(url = %url, "POST chat completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat completion request failed");
                CoachError::Upstream(format!("request failed: {e}"))
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoachError::Upstream(format!("reading body failed: {e}")))?;

        tracing::debug!(status = %status, body_len = text.len(), "chat completion finished");

        if !status.is_success() {
            tracing::error!(status = %status, body = %text, "model API error");
            return Err(CoachError::Upstream(format!("model API error: {status}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| CoachError::Malformed(format!("chat response envelope: {e}")))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
