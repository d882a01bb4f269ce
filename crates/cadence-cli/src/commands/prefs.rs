//! Preference command handlers

use anyhow::{bail, Context, Result};

use cadence_core::{Theme, Tracker, ViewMode, WeekStart};

use crate::output::Output;
use crate::PrefsCommands;

/// Dispatch a prefs subcommand; no subcommand shows the current values
pub async fn handle(
    command: Option<PrefsCommands>,
    tracker: &mut Tracker,
    output: &Output,
) -> Result<()> {
    match command {
        Some(PrefsCommands::Show) | None => show(tracker, output),
        Some(PrefsCommands::Set { key, value }) => set(tracker, key, value, output).await,
    }
}

/// Show current preferences
fn show(tracker: &Tracker, output: &Output) -> Result<()> {
    output.print_preferences(tracker.preferences());
    Ok(())
}

/// Set a preference value
async fn set(tracker: &mut Tracker, key: String, value: String, output: &Output) -> Result<()> {
    match key.as_str() {
        "theme" => {
            let theme: Theme = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            tracker.set_theme(theme).await?;
        }
        "week_start" => {
            let day: WeekStart = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            tracker.set_weekly_start_day(day).await?;
        }
        "default_view" => {
            let mode: ViewMode = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let mut prefs = tracker.preferences().clone();
            prefs.default_view = mode;
            tracker.update_preferences(prefs).await?;
        }
        "notifications" => {
            let enabled = parse_bool(&value)?;
            if tracker.preferences().notifications.enabled != enabled {
                tracker.toggle_notifications().await?;
            }
        }
        "morning_time" => {
            let mut prefs = tracker.preferences().clone();
            prefs.notifications.morning_time = value.clone();
            tracker
                .update_preferences(prefs)
                .await
                .context("Invalid time")?;
        }
        "evening_time" => {
            let mut prefs = tracker.preferences().clone();
            prefs.notifications.evening_time = value.clone();
            tracker
                .update_preferences(prefs)
                .await
                .context("Invalid time")?;
        }
        "quotes" => {
            let mut prefs = tracker.preferences().clone();
            prefs.show_motivational_quotes = parse_bool(&value)?;
            tracker.update_preferences(prefs).await?;
        }
        "vibration" => {
            let mut prefs = tracker.preferences().clone();
            prefs.vibration_enabled = parse_bool(&value)?;
            tracker.update_preferences(prefs).await?;
        }
        "sound" => {
            let mut prefs = tracker.preferences().clone();
            prefs.sound_enabled = parse_bool(&value)?;
            tracker.update_preferences(prefs).await?;
        }
        _ => {
            bail!(
                "Unknown preference key: '{}'\n\
                 Valid keys: theme, week_start, default_view, notifications, \
                 morning_time, evening_time, quotes, vibration, sound",
                key
            );
        }
    }

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => bail!("Invalid value '{}'. Use 'on' or 'off'.", other),
    }
}
