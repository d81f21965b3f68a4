use async_trait::async_trait;
use fs_err as fs;
use serde_json::{json, to_string_pretty};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::CoachError;
use super::{Mailer, OutboundEmail};

/// Writes emails to `<root>/<run-id>/` instead of delivering them.
pub struct OutboxMailer {
    dir: PathBuf,
}

fn run_dir(root: &Path, run: Uuid) -> PathBuf {
    root.join(run.to_string())
}

/// Keeps user ids usable as file names.
fn file_stem(user_id: &str) -> String {
    user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl OutboxMailer {
    pub fn new(root: &Path, run: Uuid) -> Self {
        Self { dir: run_dir(root, run) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn save(&self, email: &OutboundEmail) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let stem = file_stem(&email.user_id);
        let html_path = self.dir.join(format!("{stem}.html"));
        fs::write(&html_path, &email.html)?;
        let meta = json!({
            "from": email.from,
            "to": email.to,
            "subject": email.subject,
        });
        fs::write(self.dir.join(format!("{stem}.json")), to_string_pretty(&meta)?)?;
        Ok(html_path)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), CoachError> {
        let path = self.save(email).map_err(|e| CoachError::Mail(format!("outbox write failed: {e:#}")))?;
        tracing::info!(to = %email.to, path = %path.display(), "email written to outbox");
        Ok(())
    }
}
