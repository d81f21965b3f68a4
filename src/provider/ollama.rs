use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoachError;
use crate::wire::Instruction;
use super::Provider;

pub struct Ollama {
    pub model: String,
    pub url: String,
    client: Client,
}

impl Ollama {
    pub fn new(model: String, url: String, timeout: Duration) -> Result<Self, CoachError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::Config(format!("http client: {e}")))?;
        Ok(Self { model, url, client })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Msg<'a>; 2],
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl Provider for Ollama {
    #[tracing::instrument(skip(self, ins), fields(model = %self.model))]
    async fn complete(&self, ins: &Instruction) -> Result<String, CoachError> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: [
                Msg { role: "system", content: &ins.system },
                Msg { role: "user", content: &ins.user },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions { temperature: 0.7 },
        };

        tracing::debug!(url = %url, "POST ollama chat");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoachError::Upstream(format!("ollama request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoachError::Upstream(format!("ollama read body failed: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %text, "ollama error");
            return Err(CoachError::Upstream(format!("ollama error: {status}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| CoachError::Malformed(format!("ollama response parse error: {e}")))?;
        Ok(parsed.message.content)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
