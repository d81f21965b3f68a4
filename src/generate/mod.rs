use chrono::{Datelike, Utc};

use crate::calories;
use crate::errors::{CoachError, ValidationError};
use crate::prompt;
use crate::provider::DynProvider;
use crate::store::Store;
use crate::validate;
use crate::wire::{BodyMetrics, Instruction, OnDemandRequest, Recipient, Workout, DEFAULT_GOAL};

const FALLBACK_TYPE: &str = "General";
const FALLBACK_DURATION: u32 = 30;

/// Prompt, model call, validation and calorie estimate, in that order.
/// Never writes anywhere.
pub struct GenerationService {
    provider: DynProvider,
    current_year: i32,
    adaptive_history: usize,
}

#[derive(Clone, Copy)]
enum Schema {
    Plain,
    Suggestion,
}

impl GenerationService {
    pub fn new(provider: DynProvider, adaptive_history: usize) -> Self {
        Self { provider, current_year: Utc::now().year(), adaptive_history }
    }

    #[cfg(test)]
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    async fn run(&self, ins: &Instruction, schema: Schema) -> Result<Workout, CoachError> {
        let raw = self.provider.complete(ins).await.map_err(|e| {
            tracing::warn!(provider = self.provider.name(), kind = ?e.kind(), error = %e, "model call failed");
            e
        })?;

        if raw.trim().is_empty() {
            tracing::warn!(provider = self.provider.name(), "model returned no content");
            return Err(CoachError::Malformed("no content in model response".into()));
        }
        tracing::debug!(content = %raw, "model content");

        let candidate = validate::parse_candidate(&raw).map_err(|e| {
            tracing::warn!(error = %e, "model output is not JSON");
            e
        })?;

        let workout = match schema {
            Schema::Plain => validate::validate(&candidate),
            Schema::Suggestion => validate::validate_suggestion(&candidate),
        }
        .map_err(|e| {
            tracing::warn!(error = %e, "model output failed workout validation");
            e
        })?;

        Ok(workout)
    }

    fn attach_calories(&self, workout: &mut Workout, kind: &str, minutes: u32, metrics: &BodyMetrics) {
        let age = calories::age_from_birth_year(metrics.birth_year, self.current_year);
        workout.estimated_calories = Some(calories::estimate(
            kind,
            minutes,
            metrics.weight_kg,
            age,
            metrics.gender.as_deref(),
        ));
    }

    #[tracing::instrument(skip(self, req), fields(kind = %req.workout_type, minutes = req.duration_minutes))]
    pub async fn generate_on_demand(&self, req: &OnDemandRequest) -> Result<Workout, CoachError> {
        if req.duration_minutes == 0 {
            return Err(ValidationError::InvalidField {
                field: "duration_minutes",
                reason: "requested duration must be positive".into(),
            }
            .into());
        }

        let ins = prompt::on_demand(req);
        let mut workout = self.run(&ins, Schema::Plain).await?;

        workout.workout_type.get_or_insert_with(|| req.workout_type.clone());
        workout.duration_minutes.get_or_insert(req.duration_minutes);

        let metrics = req.user_profile.clone().unwrap_or_default();
        self.attach_calories(&mut workout, &req.workout_type, req.duration_minutes, &metrics);

        tracing::info!(title = %workout.title, calories = ?workout.estimated_calories, "workout generated");
        Ok(workout)
    }

    /// Suggestion shaped by the caller's goal and their latest rated sessions.
    #[tracing::instrument(skip(self, store))]
    pub async fn generate_adaptive(&self, store: &dyn Store, user_id: &str) -> Result<Workout, CoachError> {
        let profile = store.profile(user_id).await?;
        let history = store.recent_workouts(user_id, self.adaptive_history, true).await?;

        let goal = profile.as_ref().map(|p| p.goal()).unwrap_or_else(|| DEFAULT_GOAL.to_string());
        let metrics = profile.as_ref().map(|p| p.metrics()).unwrap_or_default();
        tracing::debug!(goal = %goal, history = history.len(), "building adaptive prompt");

        let ins = prompt::adaptive(&goal, &history);
        let workout = self.run(&ins, Schema::Suggestion).await?;
        Ok(self.finish_suggestion(workout, &metrics))
    }

    /// The rationale is asked for but not required; the email has a fallback.
    pub async fn generate_daily(&self, recipient: &Recipient) -> Result<Workout, CoachError> {
        let ins = prompt::daily(recipient);
        let workout = self.run(&ins, Schema::Plain).await?;
        let metrics = BodyMetrics {
            weight_kg: recipient.weight_kg,
            height_cm: None,
            birth_year: recipient.birth_year,
            gender: recipient.gender.clone(),
        };
        Ok(self.finish_suggestion(workout, &metrics))
    }

    fn finish_suggestion(&self, mut workout: Workout, metrics: &BodyMetrics) -> Workout {
        let kind = workout
            .workout_type
            .get_or_insert_with(|| FALLBACK_TYPE.to_string())
            .clone();
        let minutes = *workout.duration_minutes.get_or_insert(FALLBACK_DURATION);
        self.attach_calories(&mut workout, &kind, minutes, metrics);
        workout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::provider::mock::{workout_json, MockProvider};
    use crate::store::fixtures::{profile, workout};
    use crate::store::{MemoryStore, Snapshot};

    fn service(mock: &MockProvider) -> GenerationService {
        GenerationService::new(Box::new(mock.clone()), 3).with_current_year(2026)
    }

    fn request() -> OnDemandRequest {
        OnDemandRequest {
            target_muscles: vec!["legs".into()],
            workout_type: "HIIT".into(),
            duration_minutes: 60,
            user_goal: Some("Lose weight".into()),
            equipment: vec!["Dumbbells".into()],
            user_profile: None,
        }
    }

    fn recipient(goal: &str) -> Recipient {
        Recipient {
            user_id: "u1".into(),
            target_email: "u1@example.com".into(),
            goal: goal.into(),
            weight_kg: None,
            birth_year: None,
            gender: None,
            equipment: vec![],
            recent_workout_types: vec![],
        }
    }

    #[tokio::test]
    async fn on_demand_attaches_calories_from_request() {
        let mock = MockProvider::new();
        mock.add_reply("60-minute HIIT", Ok(workout_json("Sweat Storm", false)));
        let w = service(&mock).generate_on_demand(&request()).await.unwrap();

        assert_eq!(w.title, "Sweat Storm");
        assert_eq!(w.estimated_calories, Some(560));
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system.contains("Dumbbells"));
    }

    #[tokio::test]
    async fn on_demand_uses_body_metrics() {
        let mock = MockProvider::new();
        mock.add_reply("HIIT", Ok(workout_json("Sweat Storm", false)));
        let mut req = request();
        req.user_profile = Some(BodyMetrics {
            weight_kg: Some(60.0),
            height_cm: Some(165.0),
            birth_year: Some(1961),
            gender: Some("female".into()),
        });
        let w = service(&mock).generate_on_demand(&req).await.unwrap();
        let expected = calories::estimate("HIIT", 60, Some(60.0), Some(65), Some("female"));
        assert_eq!(w.estimated_calories, Some(expected));
    }

    #[tokio::test]
    async fn missing_type_and_duration_come_from_request() {
        let mock = MockProvider::new();
        mock.add_reply(
            "HIIT",
            Ok(r#"{"title": "Leg Day", "sections": [{"title": "Main", "exercises": [{"name": "Squat", "details": "3x10"}]}]}"#.into()),
        );
        let w = service(&mock).generate_on_demand(&request()).await.unwrap();
        assert_eq!(w.workout_type.as_deref(), Some("HIIT"));
        assert_eq!(w.duration_minutes, Some(60));
    }

    #[tokio::test]
    async fn upstream_and_content_failures_are_distinguished() {
        let mock = MockProvider::new();
        mock.add_reply("HIIT", Err(CoachError::Upstream("model API error: 503".into())));
        mock.add_reply("HIIT", Ok("   ".into()));
        mock.add_reply("HIIT", Ok("I'm sorry, I can't do that".into()));
        mock.add_reply("HIIT", Ok(r#"{"title": "Empty", "sections": []}"#.into()));
        let svc = service(&mock);

        let kinds: Vec<ErrorKind> = [
            svc.generate_on_demand(&request()).await,
            svc.generate_on_demand(&request()).await,
            svc.generate_on_demand(&request()).await,
            svc.generate_on_demand(&request()).await,
        ]
        .into_iter()
        .map(|r| r.unwrap_err().kind())
        .collect();

        assert_eq!(
            kinds,
            [
                ErrorKind::UpstreamUnavailable,
                ErrorKind::UpstreamMalformed,
                ErrorKind::UpstreamMalformed,
                ErrorKind::ValidationFailed
            ]
        );
    }

    #[tokio::test]
    async fn zero_duration_is_rejected_before_calling_the_model() {
        let mock = MockProvider::new();
        let mut req = request();
        req.duration_minutes = 0;
        assert!(service(&mock).generate_on_demand(&req).await.is_err());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn adaptive_reads_goal_and_last_three_rated_workouts() {
        let mut p = profile("u1", "Build muscle", false);
        p.custom_goal = Some("Bench 100kg".into());
        let store = MemoryStore::new(Snapshot {
            profiles: vec![p],
            workouts: vec![
                workout("u1", "Yoga", 4, Some("calm")),
                workout("u1", "Cardio", 3, Some("ok")),
                workout("u1", "Strength", 2, Some("hard")),
                workout("u1", "HIIT", 1, Some("fun")),
                workout("u1", "Calisthenics", 0, None),
            ],
            ..Snapshot::default()
        });

        let mock = MockProvider::new();
        mock.add_reply("Bench 100kg", Ok(workout_json("Push Power", true)));
        let w = service(&mock).generate_adaptive(&store, "u1").await.unwrap();

        assert!(w.rationale.is_some());
        // 80 kg, born 1980 -> 46, HIIT for 30 minutes.
        assert_eq!(w.estimated_calories, Some(calories::estimate("HIIT", 30, Some(80.0), Some(46), Some("male"))));

        let user = &mock.calls()[0].user;
        assert!(user.contains("\"type\":\"HIIT\""));
        assert!(user.contains("\"type\":\"Strength\""));
        assert!(user.contains("\"type\":\"Cardio\""));
        assert!(!user.contains("Yoga"));
        assert!(!user.contains("Calisthenics"));
        assert!(user.find("HIIT").unwrap() < user.find("Cardio").unwrap());
    }

    #[tokio::test]
    async fn adaptive_without_history_or_profile() {
        let store = MemoryStore::default();
        let mock = MockProvider::new();
        mock.add_reply("No previous workouts", Ok(workout_json("Fresh Start", true)));
        let w = service(&mock).generate_adaptive(&store, "ghost").await.unwrap();
        assert_eq!(w.title, "Fresh Start");
        assert!(mock.calls()[0].user.contains("general fitness"));
    }

    #[tokio::test]
    async fn adaptive_requires_rationale() {
        let store = MemoryStore::default();
        let mock = MockProvider::new();
        mock.add_reply("No previous workouts", Ok(workout_json("Fresh Start", false)));
        let err = service(&mock).generate_adaptive(&store, "ghost").await.unwrap_err();
        assert!(matches!(err, CoachError::Validation(ValidationError::MissingField("rationale"))));
    }

    #[tokio::test]
    async fn daily_accepts_workout_without_rationale() {
        let recipient = recipient("Keep moving");
        let mock = MockProvider::new();
        mock.add_reply("Keep moving", Ok(workout_json("Quiet Day", false)));
        let w = service(&mock).generate_daily(&recipient).await.unwrap();
        assert_eq!(w.title, "Quiet Day");
        assert!(w.rationale.is_none());
    }

    #[tokio::test]
    async fn daily_fills_type_and_duration_defaults() {
        let recipient = recipient("Stay active");
        let mock = MockProvider::new();
        mock.add_reply(
            "Stay active",
            Ok(r#"{"title": "Walk & Stretch", "rationale": "Easy day.", "sections": [{"title": "Main", "exercises": [{"name": "Brisk walk", "details": "20 min"}]}]}"#.into()),
        );
        let w = service(&mock).generate_daily(&recipient).await.unwrap();
        assert_eq!(w.workout_type.as_deref(), Some("General"));
        assert_eq!(w.duration_minutes, Some(30));
        assert_eq!(w.estimated_calories, Some(175));
    }
}
