use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::ValidationError;
use crate::wire::Workout;

static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\n?\s*```\s*$").expect("fence regex")
});

/// Stage one: turn raw completion text into a JSON object.
///
/// Accepts a bare object, an object wrapped in a markdown fence, or the first
/// balanced `{...}` embedded in prose. Anything else is `Unparsable`.
pub fn parse_candidate(raw: &str) -> Result<Value, ValidationError> {
    let text = match FENCE.captures(raw) {
        Some(c) => c.get(1).map(|m| m.as_str()).unwrap_or_default(),
        None => raw,
    }
    .trim();

    if text.is_empty() {
        return Err(ValidationError::Unparsable("empty output".into()));
    }

    let value = match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        Err(strict_err) => {
            let obj = extract_first_json_object(text)
                .ok_or_else(|| ValidationError::Unparsable(strict_err.to_string()))?;
            serde_json::from_str::<Value>(obj)
                .map_err(|e| ValidationError::Unparsable(e.to_string()))?
        }
    };

    if !value.is_object() {
        return Err(ValidationError::Unparsable("top-level value is not an object".into()));
    }
    Ok(value)
}

/// Stage two: check the candidate's shape and build a typed `Workout`.
///
/// Checks run in order and stop at the first failure. Nothing is repaired.
pub fn validate(candidate: &Value) -> Result<Workout, ValidationError> {
    let obj = candidate.as_object().ok_or(ValidationError::NotAnObject)?;

    match obj.get("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        _ => return Err(ValidationError::MissingField("title")),
    }

    let sections = match obj.get("sections") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("sections")),
        Some(Value::Array(a)) => a,
        Some(_) => {
            return Err(ValidationError::WrongType { field: "sections", expected: "an array" })
        }
    };

    let total: usize = sections
        .iter()
        .filter_map(|s| s.get("exercises").and_then(Value::as_array))
        .map(Vec::len)
        .sum();
    if total == 0 {
        return Err(ValidationError::NoExercises);
    }

    if let Some(d) = obj.get("duration_minutes").filter(|d| !d.is_null()) {
        check_duration(d)?;
    }

    let mut normalized = candidate.clone();
    if let Some(o) = normalized.as_object_mut() {
        o.remove("estimated_calories");
        if let Some(d) = o.get("duration_minutes").and_then(Value::as_f64) {
            o.insert("duration_minutes".into(), Value::from(d as u64));
        }
    }

    let workout: Workout =
        serde_json::from_value(normalized).map_err(|e| ValidationError::Shape(e.to_string()))?;

    if workout
        .sections
        .iter()
        .flat_map(|s| s.exercises.iter())
        .any(|e| e.name.trim().is_empty())
    {
        return Err(ValidationError::InvalidField {
            field: "sections[].exercises[].name",
            reason: "exercise name is empty".into(),
        });
    }

    Ok(workout)
}

/// Adaptive and daily suggestions must explain themselves.
pub fn validate_suggestion(candidate: &Value) -> Result<Workout, ValidationError> {
    let workout = validate(candidate)?;
    match workout.rationale.as_deref() {
        Some(r) if !r.trim().is_empty() => Ok(workout),
        _ => Err(ValidationError::MissingField("rationale")),
    }
}

fn check_duration(d: &Value) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidField {
        field: "duration_minutes",
        reason: reason.to_string(),
    };
    let n = d.as_f64().ok_or_else(|| invalid("not a number"))?;
    if n.fract() != 0.0 {
        return Err(invalid("not a whole number of minutes"));
    }
    if n < 1.0 || n > f64::from(u32::MAX) {
        return Err(invalid("must be a positive integer"));
    }
    Ok(())
}

/// Extracts the first top-level JSON object substring from a string.
/// Braces inside string literals are ignored; returns None if no object closes.
fn extract_first_json_object(s: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                start.get_or_insert(i);
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|st| &s[st..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
