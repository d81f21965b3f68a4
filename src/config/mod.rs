use anyhow::Context;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::ProviderKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Recipients processed at once. Keeps model and mail rate limits in check.
    pub concurrency: usize,
    /// Overall budget for one daily run; remaining recipients are cancelled.
    pub timeout_secs: Option<u64>,
    /// Recent workouts fed into the daily prompt.
    pub recent_workouts: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 4, timeout_secs: Some(900), recent_workouts: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from: String,
    pub api_url: String,
    pub app_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: "Aithos <onboarding@resend.dev>".into(),
            api_url: "https://api.resend.com".into(),
            app_url: "https://aithos.app".into(),
        }
    }
}

/// Credentials only ever come from the environment.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub resend_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: String,
    pub provider: ProviderKind,
    pub model: String,
    pub gateway_url: String,
    pub ollama_url: Option<String>,
    pub timeout_secs: u64,
    pub adaptive_history: usize,
    pub batch: BatchConfig,
    pub mail: MailConfig,
    #[serde(skip)]
    pub secrets: Secrets,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: "2026-10-01".into(),
            provider: ProviderKind::OpenAI,
            model: "gpt-4.1-mini".into(),
            gateway_url: "https://api.openai.com/v1".into(),
            ollama_url: Some("http://localhost:11434".into()),
            timeout_secs: 120,
            adaptive_history: 3,
            batch: BatchConfig::default(),
            mail: MailConfig::default(),
            secrets: Secrets::default(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (explicit path, `AITHOS_CONFIG`, or
    /// `./aithos.toml` when present), then environment overrides.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let explicit = path
            .map(str::to_string)
            .or_else(|| std::env::var("AITHOS_CONFIG").ok());

        let mut cfg = match explicit {
            Some(p) => Self::from_file(Path::new(&p))?,
            None if Path::new("aithos.toml").exists() => Self::from_file(Path::new("aithos.toml"))?,
            None => {
                tracing::debug!("no config file found, using defaults");
                Self::default()
            }
        };

        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(p) = non_empty("AITHOS_PROVIDER") {
            match p.to_ascii_lowercase().as_str() {
                "openai" | "open-ai" => self.provider = ProviderKind::OpenAI,
                "anthropic" => self.provider = ProviderKind::Anthropic,
                "ollama" => self.provider = ProviderKind::Ollama,
                other => tracing::warn!(provider = other, "ignoring unknown AITHOS_PROVIDER"),
            }
        }
        if let Some(m) = non_empty("AITHOS_MODEL") {
            self.model = m;
        }
        if let Some(u) = non_empty("AITHOS_GATEWAY_URL") {
            self.gateway_url = u;
        }
        if let Some(u) = non_empty("OLLAMA_URL") {
            self.ollama_url = Some(u);
        }
        if let Some(u) = non_empty("AITHOS_APP_URL") {
            self.mail.app_url = u;
        }
        if let Some(f) = non_empty("AITHOS_MAIL_FROM") {
            self.mail.from = f;
        }
        if let Some(n) = non_empty("AITHOS_BATCH_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.batch.concurrency = n;
        }
        if let Some(n) = non_empty("AITHOS_BATCH_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            self.batch.timeout_secs = (n > 0).then_some(n);
        }

        self.secrets.api_key = non_empty("AITHOS_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
        self.secrets.anthropic_api_key = non_empty("ANTHROPIC_API_KEY");
        self.secrets.resend_api_key = non_empty("RESEND_API_KEY");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
model = "gemini-2.5-flash"
gateway_url = "https://gateway.example/v1"

[batch]
concurrency = 2
"#,
        )
        .unwrap();
        assert_eq!(cfg.model, "gemini-2.5-flash");
        assert_eq!(cfg.batch.concurrency, 2);
        assert_eq!(cfg.batch.recent_workouts, 5);
        assert_eq!(cfg.adaptive_history, 3);
        assert!(cfg.secrets.api_key.is_none());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AITHOS_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-fallback"),
            ("AITHOS_BATCH_CONCURRENCY", "8"),
            ("AITHOS_BATCH_TIMEOUT_SECS", "0"),
            ("RESEND_API_KEY", "  "),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert!(matches!(cfg.provider, ProviderKind::Anthropic));
        assert_eq!(cfg.secrets.api_key.as_deref(), Some("sk-fallback"));
        assert_eq!(cfg.batch.concurrency, 8);
        assert_eq!(cfg.batch.timeout_secs, None);
        assert!(cfg.secrets.resend_api_key.is_none());
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aithos.toml");
        std::fs::write(&path, "timeout_secs = 30\n[mail]\nfrom = \"Coach <coach@example.com>\"\n").unwrap();
        let cfg = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.mail.from, "Coach <coach@example.com>");
    }
}
