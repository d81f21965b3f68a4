/// Metabolic equivalents, matched in order against the workout type.
///
/// Matching is a case-insensitive substring test and the first hit wins, so
/// longer or more specific patterns must sit above the generic ones they
/// contain (e.g. "Strength Training" before "Strength").
pub const MET_TABLE: &[(&str, f64)] = &[
    ("Strength Training", 5.0),
    ("Strength", 5.0),
    ("Cardio", 7.0),
    ("HIIT", 8.0),
    ("Yoga", 3.0),
    ("Calisthenics", 5.5),
    ("Circuit Training", 6.5),
    ("Full Body", 5.5),
    ("Upper Body", 5.0),
    ("Lower Body", 5.5),
];

pub const DEFAULT_MET: f64 = 5.0;
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

pub fn met_for(workout_type: &str) -> f64 {
    let needle = workout_type.to_lowercase();
    MET_TABLE
        .iter()
        .find(|(pattern, _)| needle.contains(&pattern.to_lowercase()))
        .map(|(_, met)| *met)
        .unwrap_or(DEFAULT_MET)
}

/// Estimated kilocalories for a session. Missing inputs fall back to
/// defaults; never fails.
pub fn estimate(
    workout_type: &str,
    duration_minutes: u32,
    weight_kg: Option<f64>,
    age: Option<u32>,
    gender: Option<&str>,
) -> u32 {
    let weight = weight_kg
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(DEFAULT_WEIGHT_KG);

    let mut calories = met_for(workout_type) * weight * (f64::from(duration_minutes) / 60.0);

    if let Some(age) = age {
        if age > 40 {
            calories *= 0.95;
        }
        if age > 50 {
            calories *= 0.90;
        }
        if age > 60 {
            calories *= 0.85;
        }
    }

    if gender.is_some_and(|g| g.trim().eq_ignore_ascii_case("female")) {
        calories *= 0.9;
    }

    calories.round().max(0.0) as u32
}

/// Whole years between `birth_year` and `current_year`; `None` for
/// impossible (future) birth years.
pub fn age_from_birth_year(birth_year: Option<i32>, current_year: i32) -> Option<u32> {
    birth_year
        .and_then(|y| current_year.checked_sub(y))
        .and_then(|age| u32::try_from(age).ok())
}
