//! Collaborator data: profiles, account emails, equipment, workout history
//! and the append-only notification log.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoachError;
use crate::wire::{HistoryEntry, NotificationLogEntry, UserProfile};

pub mod file;

pub use file::FileStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, CoachError>;

    /// Profiles with daily notifications switched on.
    async fn notification_subscribers(&self) -> Result<Vec<UserProfile>, CoachError>;

    async fn account_email(&self, user_id: &str) -> Result<Option<String>, CoachError>;

    async fn equipment(&self, user_id: &str) -> Result<Vec<String>, CoachError>;

    /// Most recent first. `with_feedback` restricts to sessions the user rated.
    async fn recent_workouts(
        &self,
        user_id: &str,
        limit: usize,
        with_feedback: bool,
    ) -> Result<Vec<HistoryEntry>, CoachError>;

    async fn append_notification_log(&self, entry: NotificationLogEntry) -> Result<(), CoachError>;
}

/// Everything a store holds, in the shape used by the JSON data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub profiles: Vec<UserProfile>,
    pub accounts: HashMap<String, String>,
    pub equipment: HashMap<String, Vec<String>>,
    pub workouts: Vec<HistoryEntry>,
    pub notification_logs: Vec<NotificationLogEntry>,
}

impl Snapshot {
    fn recent_workouts(&self, user_id: &str, limit: usize, with_feedback: bool) -> Vec<HistoryEntry> {
        let mut rows: Vec<&HistoryEntry> = self
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id)
            .filter(|w| !with_feedback || w.feedback.as_deref().is_some_and(|f| !f.trim().is_empty()))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().take(limit).cloned().collect()
    }
}

/// In-process store. Also the working copy behind `FileStore`.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { data: Mutex::new(snapshot) }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.data.lock().clone()
    }

    #[cfg(test)]
    pub fn notification_logs(&self) -> Vec<NotificationLogEntry> {
        self.data.lock().notification_logs.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, CoachError> {
        Ok(self.data.lock().profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn notification_subscribers(&self) -> Result<Vec<UserProfile>, CoachError> {
        Ok(self
            .data
            .lock()
            .profiles
            .iter()
            .filter(|p| p.email_notifications)
            .cloned()
            .collect())
    }

    async fn account_email(&self, user_id: &str) -> Result<Option<String>, CoachError> {
        Ok(self.data.lock().accounts.get(user_id).cloned())
    }

    async fn equipment(&self, user_id: &str) -> Result<Vec<String>, CoachError> {
        Ok(self.data.lock().equipment.get(user_id).cloned().unwrap_or_default())
    }

    async fn recent_workouts(
        &self,
        user_id: &str,
        limit: usize,
        with_feedback: bool,
    ) -> Result<Vec<HistoryEntry>, CoachError> {
        Ok(self.data.lock().recent_workouts(user_id, limit, with_feedback))
    }

    async fn append_notification_log(&self, entry: NotificationLogEntry) -> Result<(), CoachError> {
        self.data.lock().notification_logs.push(entry);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    pub fn profile(id: &str, goal: &str, notify: bool) -> UserProfile {
        UserProfile {
            id: id.into(),
            primary_goal: goal.into(),
            custom_goal: None,
            weight_kg: Some(80.0),
            height_cm: Some(180.0),
            birth_year: Some(1980),
            gender: Some("male".into()),
            email_notifications: notify,
            notification_email: None,
        }
    }

    pub fn workout(user_id: &str, kind: &str, days_ago: i64, feedback: Option<&str>) -> HistoryEntry {
        let base = Utc.with_ymd_and_hms(2026, 10, 15, 7, 0, 0).unwrap();
        HistoryEntry {
            user_id: user_id.into(),
            title: format!("{kind} session"),
            workout_type: kind.into(),
            duration_minutes: 30,
            feedback: feedback.map(str::to_string),
            difficulty: feedback.map(|_| 3),
            created_at: base - Duration::days(days_ago),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[tokio::test]
    async fn recent_workouts_are_newest_first_and_filtered() {
        let store = MemoryStore::new(Snapshot {
            workouts: vec![
                workout("u1", "Yoga", 5, Some("relaxing")),
                workout("u1", "HIIT", 1, Some("brutal")),
                workout("u1", "Cardio", 0, None),
                workout("u1", "Strength", 3, Some("")),
                workout("u1", "Calisthenics", 2, Some("fun")),
                workout("u1", "Strength", 9, Some("old")),
                workout("u2", "Yoga", 0, Some("not mine")),
            ],
            ..Snapshot::default()
        });

        let rated = store.recent_workouts("u1", 3, true).await.unwrap();
        let kinds: Vec<_> = rated.iter().map(|w| w.workout_type.as_str()).collect();
        assert_eq!(kinds, ["HIIT", "Calisthenics", "Yoga"]);

        let any = store.recent_workouts("u1", 2, false).await.unwrap();
        let kinds: Vec<_> = any.iter().map(|w| w.workout_type.as_str()).collect();
        assert_eq!(kinds, ["Cardio", "HIIT"]);
    }

    #[tokio::test]
    async fn subscribers_only_include_enabled_profiles() {
        let store = MemoryStore::new(Snapshot {
            profiles: vec![profile("a", "x", true), profile("b", "y", false)],
            ..Snapshot::default()
        });
        let subs = store.notification_subscribers().await.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "a");
        assert!(store.equipment("a").await.unwrap().is_empty());
        assert!(store.profile("zzz").await.unwrap().is_none());
    }
}
