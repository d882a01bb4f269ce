//! Completion command handlers

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};

use cadence_core::Tracker;

use crate::commands::habit::resolve_habit;
use crate::output::Output;

/// Toggle a completion, or bulk-set every scheduled habit with --all
pub async fn done(
    tracker: &mut Tracker,
    habit: Option<String>,
    date: Option<NaiveDate>,
    all: bool,
    undo: bool,
    output: &Output,
) -> Result<()> {
    if all {
        return done_all(tracker, date, !undo, output).await;
    }

    let Some(reference) = habit else {
        bail!("Provide a habit, or use --all to mark every scheduled habit.");
    };

    let habit = resolve_habit(tracker, &reference)?;
    let completion = tracker
        .toggle_completion(habit.id, date)
        .await
        .context("Failed to toggle completion")?;

    output.print_completion(&habit, &completion);
    Ok(())
}

/// Set the completed flag for every active habit scheduled on the date
async fn done_all(
    tracker: &mut Tracker,
    date: Option<NaiveDate>,
    completed: bool,
    output: &Output,
) -> Result<()> {
    let date = date.unwrap_or(tracker.view().selected_date);
    let scheduled: Vec<_> = tracker
        .active_habits()
        .iter()
        .filter(|h| h.schedule.is_scheduled(date.weekday()))
        .map(|h| h.id)
        .collect();

    if scheduled.is_empty() {
        output.message(&format!("No habits scheduled on {}.", date));
        return Ok(());
    }

    let completions = tracker
        .bulk_toggle_completions(&scheduled, date, completed)
        .await
        .context("Failed to update completions")?;

    let verb = if completed { "Completed" } else { "Cleared" };
    output.success(&format!("{} {} habit(s) on {}", verb, completions.len(), date));
    Ok(())
}

/// Record a quantitative value for a habit on a date
pub async fn log(
    tracker: &mut Tracker,
    habit: String,
    value: f64,
    date: Option<NaiveDate>,
    notes: Option<String>,
    output: &Output,
) -> Result<()> {
    let habit = resolve_habit(tracker, &habit)?;
    let date = date.unwrap_or(tracker.view().selected_date);

    let completion = tracker
        .set_completion_value(habit.id, date, value, notes)
        .await
        .context("Failed to record value")?;

    output.print_completion(&habit, &completion);
    Ok(())
}
