use std::fmt::Write;

use crate::wire::Workout;

pub const FALLBACK_RATIONALE: &str =
    "This workout is designed to help you reach your fitness goals with a balanced approach.";

/// Model output ends up in the email body, so every interpolated value goes
/// through here.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn subject(workout: &Workout) -> String {
    format!("Your Daily Workout: {}", workout.title.trim())
}

fn stat(label: &str, value: &str) -> String {
    format!(
        r#"<td style="padding: 8px 16px; background-color: #262626; border-radius: 8px;">
  <span style="color: #a3a3a3; font-size: 12px;">{label}</span><br>
  <span style="color: #ffffff; font-size: 14px; font-weight: 500;">{value}</span>
</td>"#
    )
}

pub fn html(workout: &Workout, app_url: &str) -> String {
    let app_url = escape_html(app_url);
    let kind = escape_html(workout.workout_type.as_deref().unwrap_or("General"));
    let duration = workout
        .duration_minutes
        .map(|d| format!("{d} min"))
        .unwrap_or_else(|| "-".into());
    let calories = workout
        .estimated_calories
        .map(|c| format!("~{c} cal"))
        .unwrap_or_else(|| "-".into());
    let rationale = escape_html(
        workout
            .rationale
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(FALLBACK_RATIONALE),
    );

    let mut sections = String::new();
    for section in &workout.sections {
        if section.exercises.is_empty() {
            continue;
        }
        let _ = write!(
            sections,
            r#"<h3 style="margin: 24px 0 8px; color: #0ea5e9; font-size: 16px;">{}</h3><ul style="margin: 0; padding-left: 20px; color: #d4d4d4; font-size: 14px; line-height: 1.6;">"#,
            escape_html(&section.title)
        );
        for ex in &section.exercises {
            let _ = write!(sections, "<li><strong>{}</strong>", escape_html(&ex.name));
            if !ex.details.trim().is_empty() {
                let _ = write!(sections, " &middot; {}", escape_html(&ex.details));
            }
            sections.push_str("</li>");
        }
        sections.push_str("</ul>");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; background-color: #0a0a0a; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;">
  <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #0a0a0a; padding: 40px 20px;">
    <tr><td align="center">
      <table width="100%" style="max-width: 600px; background-color: #171717; border-radius: 12px; overflow: hidden;">
        <tr><td style="padding: 32px 32px 24px; background: linear-gradient(135deg, #0ea5e9 0%, #3b82f6 100%);">
          <h1 style="margin: 0; color: white; font-size: 24px; font-weight: 600;">Your Daily Workout</h1>
          <p style="margin: 8px 0 0; color: rgba(255,255,255,0.9); font-size: 14px;">Good morning! Here's your personalized workout for today.</p>
        </td></tr>
        <tr><td style="padding: 32px;">
          <h2 style="margin: 0 0 16px; color: #ffffff; font-size: 20px; font-weight: 600;">{title}</h2>
          <table width="100%" cellspacing="0" cellpadding="0" style="margin-bottom: 24px;"><tr>
{type_stat}
<td width="8"></td>
{duration_stat}
<td width="8"></td>
{calories_stat}
          </tr></table>
          <div style="background-color: #262626; border-radius: 8px; padding: 16px; margin-bottom: 24px;">
            <p style="margin: 0; color: #d4d4d4; font-size: 14px; line-height: 1.6;">
              <strong style="color: #0ea5e9;">Why this workout?</strong><br>
              {rationale}
            </p>
          </div>
          {sections}
          <table width="100%" cellspacing="0" cellpadding="0" style="margin-top: 32px;"><tr><td align="center">
            <a href="{app_url}" style="display: inline-block; padding: 14px 32px; background: linear-gradient(135deg, #0ea5e9 0%, #3b82f6 100%); color: white; text-decoration: none; border-radius: 8px; font-weight: 600; font-size: 16px;">Go to Workout &rarr;</a>
          </td></tr></table>
        </td></tr>
        <tr><td style="padding: 24px 32px; border-top: 1px solid #262626;">
          <p style="margin: 0; color: #737373; font-size: 12px; text-align: center;">
            You're receiving this because you enabled daily workout notifications.<br>
            <a href="{app_url}" style="color: #0ea5e9; text-decoration: none;">Update your preferences</a>
          </p>
        </td></tr>
      </table>
    </td></tr>
  </table>
</body>
</html>"#,
        title = escape_html(&workout.title),
        type_stat = stat("Type", &kind),
        duration_stat = stat("Duration", &duration),
        calories_stat = stat("Est. Calories", &calories),
    )
}
