use anyhow::Context;
use async_trait::async_trait;
use fs_err as fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::CoachError;
use crate::wire::{HistoryEntry, NotificationLogEntry, UserProfile};
use super::{MemoryStore, Snapshot, Store};

/// JSON data file used by the command-line tool. Reads are served from
/// memory; every log append rewrites the file atomically.
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let snapshot = if path.exists() {
            let s = fs::read_to_string(path)?;
            serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))?
        } else {
            tracing::warn!(path = %path.display(), "data file not found, starting empty");
            Snapshot::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryStore::new(snapshot),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    fn persist(&self) -> anyhow::Result<()> {
        let snapshot = self.inner.snapshot();
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let tmp = NamedTempFile::new_in(&dir)?;
        fs::write(tmp.path(), serde_json::to_string_pretty(&snapshot)?)?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, CoachError> {
        self.inner.profile(user_id).await
    }

    async fn notification_subscribers(&self) -> Result<Vec<UserProfile>, CoachError> {
        self.inner.notification_subscribers().await
    }

    async fn account_email(&self, user_id: &str) -> Result<Option<String>, CoachError> {
        self.inner.account_email(user_id).await
    }

    async fn equipment(&self, user_id: &str) -> Result<Vec<String>, CoachError> {
        self.inner.equipment(user_id).await
    }

    async fn recent_workouts(
        &self,
        user_id: &str,
        limit: usize,
        with_feedback: bool,
    ) -> Result<Vec<HistoryEntry>, CoachError> {
        self.inner.recent_workouts(user_id, limit, with_feedback).await
    }

    async fn append_notification_log(&self, entry: NotificationLogEntry) -> Result<(), CoachError> {
        // Serialize file rewrites so concurrent recipients cannot interleave.
        let _guard = self.write_lock.lock().await;
        self.inner.append_notification_log(entry).await?;
        self.persist()
            .map_err(|e| CoachError::Store(format!("writing {}: {e:#}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::profile;
    use crate::wire::{Exercise, Section, Workout};
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(user: &str) -> NotificationLogEntry {
        NotificationLogEntry {
            id: Uuid::new_v4(),
            user_id: user.into(),
            email_sent_to: format!("{user}@example.com"),
            workout_data: Workout {
                title: "Morning Mobility".into(),
                workout_type: Some("Yoga".into()),
                duration_minutes: Some(30),
                sections: vec![Section {
                    title: "Main".into(),
                    exercises: vec![Exercise {
                        name: "Sun salutation".into(),
                        details: "5 rounds".into(),
                        category: None,
                        muscle_group: None,
                    }],
                }],
                rationale: Some("Rest day".into()),
                estimated_calories: Some(105),
            },
            sent_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn log_appends_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let seed = Snapshot { profiles: vec![profile("u1", "Stay active", true)], ..Snapshot::default() };
        std::fs::write(&path, serde_json::to_string(&seed).unwrap()).unwrap();

        let store = FileStore::open(&path).unwrap();
        store.append_notification_log(entry("u1")).await.unwrap();
        store.append_notification_log(entry("u1")).await.unwrap();

        let reopened = FileStore::open(&path).unwrap();
        let snap = reopened.inner.snapshot();
        assert_eq!(snap.notification_logs.len(), 2);
        assert_eq!(snap.profiles.len(), 1);
        assert_eq!(snap.notification_logs[0].workout_data.title, "Morning Mobility");
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("nope.json")).unwrap();
        assert!(store.notification_subscribers().await.unwrap().is_empty());
    }
}
