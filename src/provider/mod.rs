use async_trait::async_trait;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::CoachError;
use crate::wire::Instruction;

pub mod anthropic;
pub mod ollama;
pub mod openai;
#[cfg(test)]
pub mod canned;
#[cfg(test)]
pub mod mock;

/// A text-completion backend. Returns the raw message content; turning it
/// into a workout is the validator's job.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, ins: &Instruction) -> Result<String, CoachError>;

    fn name(&self) -> &'static str;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider, CoachError> {
    let timeout = std::time::Duration::from_secs(cfg.timeout_secs);
    match cfg.provider {
        ProviderKind::OpenAI => {
            let key = cfg
                .secrets
                .api_key
                .clone()
                .ok_or_else(|| CoachError::Config("AITHOS_API_KEY (or OPENAI_API_KEY) is not set".into()))?;
            Ok(Box::new(openai::OpenAIProvider::new(
                cfg.gateway_url.clone(),
                cfg.model.clone(),
                key,
                timeout,
            )?))
        }
        ProviderKind::Anthropic => {
            let key = cfg
                .secrets
                .anthropic_api_key
                .clone()
                .ok_or_else(|| CoachError::Config("ANTHROPIC_API_KEY is not set".into()))?;
            Ok(Box::new(anthropic::Anthropic::new(cfg.model.clone(), key, timeout)?))
        }
        ProviderKind::Ollama => {
            let url = cfg
                .ollama_url
                .clone()
                .ok_or_else(|| CoachError::Config("ollama_url is not configured".into()))?;
            Ok(Box::new(ollama::Ollama::new(cfg.model.clone(), url, timeout)?))
        }
    }
}
