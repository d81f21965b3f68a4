use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::wire::{BatchReport, Workout};

/// Spinner shown while waiting on the model. Hidden when output is JSON.
pub fn spinner(msg: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn show_workout(workout: &Workout) {
    println!("\n=== WORKOUT ===");
    println!("{}", workout.title.bold());
    println!(
        "  {}: {}   {}: {}   {}: {}   {}: {}",
        "Type".cyan().bold(),
        workout.workout_type.as_deref().unwrap_or("-"),
        "Duration".cyan().bold(),
        workout.duration_minutes.map(|d| format!("{d} min")).unwrap_or_else(|| "-".into()),
        "Calories".cyan().bold(),
        workout.estimated_calories.map(|c| format!("~{c}")).unwrap_or_else(|| "-".into()),
        "Exercises".cyan().bold(),
        workout.exercise_count(),
    );

    if let Some(r) = workout.rationale.as_deref().filter(|r| !r.trim().is_empty()) {
        println!("\n{}", "Why this workout?".yellow().bold());
        println!("{}", indent(r, 2));
    }

    for section in &workout.sections {
        if section.exercises.is_empty() {
            continue;
        }
        println!("\n{}", section.title.green().bold());
        for (i, ex) in section.exercises.iter().enumerate() {
            if ex.details.trim().is_empty() {
                println!("  {}. {}", i + 1, ex.name);
            } else {
                println!("  {}. {}  {}", i + 1, ex.name, ex.details.dimmed());
            }
        }
    }
    println!();
}

pub fn print_batch_dashboard(report: &BatchReport) {
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━ Daily Run ━━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!(
        "  {}: {}   {}: {}   {}: {}   {}: {}   {}: {}",
        "Processed".bold(), report.processed,
        "Sent".green().bold(), report.succeeded(),
        "Failed".red().bold(), report.failed(),
        "Skipped".yellow().bold(), report.skipped.len(),
        "Cancelled".magenta().bold(), report.cancelled.len()
    );
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());

    for r in &report.results {
        if r.success {
            println!("{} {}  {}", "[SENT]".green().bold(), r.user_id, r.target.dimmed());
        } else {
            println!(
                "{} {}  {}",
                "[FAILED]".red().bold(),
                r.user_id,
                r.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    for s in &report.skipped {
        println!("{} {}  {}", "[SKIPPED]".yellow().bold(), s.user_id, s.reason);
    }
    for id in &report.cancelled {
        println!("{} {}", "[CANCELLED]".magenta().bold(), id);
    }
    println!();
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines()
        .map(|l| format!("{}{}", pad, l))
        .collect::<Vec<_>>()
        .join("\n")
}
