use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoachError;
use crate::wire::Instruction;
use super::Provider;

const API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct Anthropic {
    pub model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl Anthropic {
    pub fn new(model: String, api_key: String, timeout: Duration) -> Result<Self, CoachError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::Config(format!("http client: {e}")))?;
        Ok(Self { model, base_url: API_BASE.to_string(), api_key, client })
    }

    #[cfg(test)]
    fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

#[async_trait]
impl Provider for Anthropic {
    #[tracing::instrument(skip(self, ins), fields(model = %self.model))]
    async fn complete(&self, ins: &Instruction) -> Result<String, CoachError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = MsgRequest {
            model: &self.model,
            max_tokens: 4096,
            system: &ins.system,
            messages: vec![Msg { role: "user", content: &ins.user }],
        };

        tracing::debug!(url = %url, "POST messages");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoachError::Upstream(format!("anthropic request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoachError::Upstream(format!("anthropic read body failed: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %text, "anthropic API error");
            return Err(CoachError::Upstream(format!("anthropic API error: {status}")));
        }

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| CoachError::Malformed(format!("anthropic response parse error: {e}")))?;

        Ok(parsed
            .content
            .into_iter()
            .find(|b| b.r#type == "text" && !b.text.is_empty())
            .map(|b| b.text)
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
