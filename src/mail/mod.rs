use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use crate::config::MailConfig;
use crate::errors::CoachError;

pub mod outbox;
pub mod render;

pub use outbox::OutboxMailer;

#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub user_id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), CoachError>;
}

pub type DynMailer = Box<dyn Mailer + Send + Sync>;

/// Resend HTTP API sender.
pub struct ResendMailer {
    api_url: String,
    api_key: String,
    client: Client,
}

impl ResendMailer {
    pub fn new(cfg: &MailConfig, api_key: Option<String>, timeout: Duration) -> Result<Self, CoachError> {
        let api_key = api_key.ok_or_else(|| CoachError::Config("RESEND_API_KEY is not set".into()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::Config(format!("http client: {e}")))?;
        Ok(Self { api_url: cfg.api_url.clone(), api_key, client })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[tracing::instrument(skip(self, email), fields(user_id = %email.user_id))]
    async fn send(&self, email: &OutboundEmail) -> Result<(), CoachError> {
        let url = format!("{}/emails", self.api_url.trim_end_matches('/'));
        let body = json!({
            "from": email.from,
            "to": [email.to],
            "subject": email.subject,
            "html": email.html,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoachError::Mail(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %text, "email API error");
            return Err(CoachError::Mail(format!("email API error: {status}")));
        }
        tracing::debug!("email accepted by provider");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resend_requires_api_key() {
        let err = ResendMailer::new(&MailConfig::default(), None, Duration::from_secs(5)).err().unwrap();
        assert!(matches!(err, CoachError::Config(_)));
        assert!(ResendMailer::new(&MailConfig::default(), Some("re_test".into()), Duration::from_secs(5)).is_ok());
    }
}
