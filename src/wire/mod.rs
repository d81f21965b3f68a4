use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ========================================
/// Workout value objects
/// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: String,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Filled in by the pipeline; whatever the model sends here is discarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_calories: Option<u32>,
}

impl Workout {
    pub fn exercise_count(&self) -> usize {
        self.sections.iter().map(|s| s.exercises.len()).sum()
    }
}

/// Instruction pair sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
}

/// ========================================
/// Collaborator records
/// ========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodyMetrics {
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub primary_goal: String,
    #[serde(default)]
    pub custom_goal: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub email_notifications: bool,
    #[serde(default)]
    pub notification_email: Option<String>,
}

pub const DEFAULT_GOAL: &str = "general fitness";

impl UserProfile {
    /// Custom goal wins over the primary one; blank values fall through.
    pub fn goal(&self) -> String {
        self.custom_goal
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .or_else(|| Some(self.primary_goal.trim()).filter(|g| !g.is_empty()))
            .unwrap_or(DEFAULT_GOAL)
            .to_string()
    }

    pub fn metrics(&self) -> BodyMetrics {
        BodyMetrics {
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            birth_year: self.birth_year,
            gender: self.gender.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub difficulty: Option<u8>,
    pub created_at: DateTime<Utc>,
}

/// Everything the daily job knows about one user for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Recipient {
    pub user_id: String,
    pub target_email: String,
    pub goal: String,
    pub weight_kg: Option<f64>,
    pub birth_year: Option<i32>,
    pub gender: Option<String>,
    pub equipment: Vec<String>,
    pub recent_workout_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub email_sent_to: String,
    pub workout_data: Workout,
    pub sent_at: DateTime<Utc>,
}

/// ========================================
/// Operation inputs and outputs
/// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnDemandRequest {
    pub target_muscles: Vec<String>,
    pub workout_type: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub user_goal: Option<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub user_profile: Option<BodyMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchMode {
    Production,
    Test { user_id: String, test_email: String },
}

impl BatchMode {
    pub fn is_test(&self) -> bool {
        matches!(self, BatchMode::Test { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientOutcome {
    pub user_id: String,
    pub target: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecipient {
    pub user_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub results: Vec<RecipientOutcome>,
    pub skipped: Vec<SkippedRecipient>,
    pub cancelled: Vec<String>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}
