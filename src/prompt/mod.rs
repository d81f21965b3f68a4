use serde::Serialize;

use crate::wire::{HistoryEntry, Instruction, OnDemandRequest, Recipient, DEFAULT_GOAL};

fn workout_schema(with_rationale: bool) -> String {
    let rationale = if with_rationale {
        "\n  \"rationale\": \"string - why this workout is right for the user today (2-3 sentences)\","
    } else {
        ""
    };
    format!(
        r#"{{
  "title": "string - creative workout name",
  "type": "string - workout type (e.g. Strength Training, Cardio, HIIT, Yoga)",
  "duration_minutes": number,{rationale}
  "sections": [
    {{
      "title": "Warm-up" | "Main Workout" | "Cool-down",
      "exercises": [
        {{
          "name": "string - exercise name",
          "details": "string - sets x reps, duration or instructions",
          "category": "strength" | "cardio" | "flexibility" | "plyometric" | "core" | "balance",
          "muscle_group": "string - primary muscle worked (e.g. chest, back, legs, shoulders, arms, core)"
        }}
      ]
    }}
  ]
}}"#
    )
}

/// Empty when no equipment is known; otherwise names what is allowed and
/// forbids everything else.
pub fn equipment_constraint(equipment: &[String]) -> String {
    let items: Vec<&str> = equipment
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();
    if items.is_empty() {
        return String::new();
    }
    format!(
        "\n\nIMPORTANT: Only use exercises that can be performed with this available equipment: {}. \
Do NOT include exercises requiring equipment not listed.",
        items.join(", ")
    )
}

fn goal_or_default(goal: Option<&str>) -> &str {
    goal.map(str::trim).filter(|g| !g.is_empty()).unwrap_or(DEFAULT_GOAL)
}

pub fn on_demand(req: &OnDemandRequest) -> Instruction {
    let system = format!(
        "You are a professional fitness trainer creating structured workout plans.
Always return a valid JSON object with this exact structure:
{schema}

Make the workout challenging but achievable. Include proper warm-up and cool-down sections.{constraint}",
        schema = workout_schema(false),
        constraint = equipment_constraint(&req.equipment),
    );

    let muscles = if req.target_muscles.is_empty() {
        "the full body".to_string()
    } else {
        req.target_muscles.join(", ")
    };

    let user = format!(
        "Create a {duration}-minute {kind} workout targeting {muscles}.
User's fitness goal: {goal}.
Use current fitness trends and proven exercise science. Make it engaging and effective.",
        duration = req.duration_minutes,
        kind = req.workout_type,
        goal = goal_or_default(req.user_goal.as_deref()),
    );

    Instruction { system, user }
}

#[derive(Serialize)]
struct HistorySummary<'a> {
    feedback: Option<&'a str>,
    difficulty: Option<u8>,
    #[serde(rename = "type")]
    workout_type: &'a str,
    duration_minutes: u32,
}

/// JSON digest of recent sessions, or the explicit empty-history marker.
pub fn history_summary(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "No previous workouts".to_string();
    }
    let rows: Vec<HistorySummary<'_>> = history
        .iter()
        .map(|h| HistorySummary {
            feedback: h.feedback.as_deref(),
            difficulty: h.difficulty,
            workout_type: &h.workout_type,
            duration_minutes: h.duration_minutes,
        })
        .collect();
    // Plain structs of strings and integers always serialize.
    serde_json::to_string(&rows).unwrap_or_default()
}

pub fn adaptive(goal: &str, history: &[HistoryEntry]) -> Instruction {
    let system = format!(
        "You are a professional fitness trainer creating personalized workout suggestions.
Return a valid JSON object with this structure:
{schema}

IMPORTANT: Include category and muscle_group for EVERY exercise.",
        schema = workout_schema(true),
    );

    let user = format!(
        "Create a personalized workout suggestion based on:
- User's goal: {goal}
- Recent workout history: {history}

Consider their feedback and difficulty ratings to adjust intensity. Vary the workout so it does not repeat recent sessions. Make it fresh and motivating.",
        goal = goal_or_default(Some(goal)),
        history = history_summary(history),
    );

    Instruction { system, user }
}

pub fn daily(recipient: &Recipient) -> Instruction {
    let system = format!(
        "You are a fitness coach creating a personalized daily workout suggestion. Create a workout that:
- Is varied from recent workouts to prevent plateaus
- Considers the user's goals and available equipment
- Is achievable and motivating
- Takes about 30-45 minutes

Return ONLY valid JSON with this structure:
{schema}{constraint}",
        schema = workout_schema(true),
        constraint = equipment_constraint(&recipient.equipment),
    );

    let equipment = if recipient.equipment.is_empty() {
        "Bodyweight only".to_string()
    } else {
        recipient.equipment.join(", ")
    };
    let recent = if recipient.recent_workout_types.is_empty() {
        "None".to_string()
    } else {
        recipient.recent_workout_types.join(", ")
    };

    let user = format!(
        "Create today's workout for:
- Goal: {goal}
- Available equipment: {equipment}
- Recent workouts: {recent}

Generate a balanced workout that complements their recent activity.",
        goal = goal_or_default(Some(&recipient.goal)),
    );

    Instruction { system, user }
}
