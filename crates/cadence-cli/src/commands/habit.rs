//! Habit command handlers

use anyhow::{bail, Context, Result};
use chrono::Weekday;
use uuid::Uuid;

use cadence_core::{Habit, HabitDraft, Schedule, Tracker};

use crate::output::Output;
use crate::prompt::{confirm, prompt_with_default};

/// Arguments for habit creation
pub struct CreateArgs {
    pub name: String,
    pub icon: String,
    pub color: String,
    pub goal: u8,
    pub days: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// Create a new habit
pub async fn create(tracker: &mut Tracker, args: CreateArgs, output: &Output) -> Result<()> {
    let mut draft = HabitDraft::new(args.name, args.icon);
    draft.color = args.color;
    draft.goal = args.goal;
    draft.description = args.description;
    draft.category = args.category;
    draft.tags = args.tags;
    if let Some(ref days) = args.days {
        draft.schedule = parse_schedule(days)?;
    }

    let habit = tracker
        .add_habit(draft)
        .await
        .context("Failed to create habit")?;

    output.success(&format!("Created habit: {}", habit.id));
    output.print_habit(&habit, None);

    Ok(())
}

/// List habits, active by default
pub fn list(tracker: &Tracker, all: bool, output: &Output) -> Result<()> {
    let habits = if all {
        tracker.habits().to_vec()
    } else {
        tracker.active_habits()
    };

    output.print_habits(&habits);
    Ok(())
}

/// Show a single habit with its streak
pub fn show(tracker: &Tracker, id: String, output: &Output) -> Result<()> {
    let habit = resolve_habit(tracker, &id)?;
    let streak = tracker.habit_streak(habit.id);
    output.print_habit(&habit, Some(streak));
    Ok(())
}

/// Edit a habit interactively
pub async fn edit(tracker: &mut Tracker, id: String, output: &Output) -> Result<()> {
    let mut habit = resolve_habit(tracker, &id)?;

    println!("Editing habit: {}", habit.id);
    println!("Press Enter to keep current value, or type new value.\n");

    if let Some(new_name) = prompt_with_default("Name", &habit.name)? {
        habit.set_name(new_name);
    }

    let current_desc = habit.description.as_deref().unwrap_or("");
    if let Some(new_desc) = prompt_with_default("Description", current_desc)? {
        habit.set_description(if new_desc.is_empty() {
            None
        } else {
            Some(new_desc)
        });
    }

    if let Some(new_icon) = prompt_with_default("Icon", &habit.icon)? {
        habit.set_icon(new_icon);
    }

    if let Some(new_color) = prompt_with_default("Color", &habit.color)? {
        habit.set_color(new_color);
    }

    if let Some(new_goal) = prompt_with_default("Goal (1-7)", &habit.goal.to_string())? {
        habit.set_goal(new_goal.parse().context("Goal must be a number")?);
    }

    let current_days = schedule_to_days(&habit.schedule);
    if let Some(new_days) = prompt_with_default("Days", &current_days)? {
        habit.set_schedule(parse_schedule(&new_days)?);
    }

    let current_tags = habit.tags.join(", ");
    if let Some(new_tags) = prompt_with_default("Tags (comma-separated)", &current_tags)? {
        let tags: Vec<String> = new_tags
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        habit.set_tags(tags);
    }

    let updated = tracker
        .update_habit(habit)
        .await
        .context("Failed to update habit")?;

    output.success("Habit updated");
    output.print_habit(&updated, None);

    Ok(())
}

/// Archive or unarchive a habit
pub async fn archive(tracker: &mut Tracker, id: String, output: &Output) -> Result<()> {
    let habit = resolve_habit(tracker, &id)?;

    let updated = tracker
        .toggle_habit_archived(habit.id)
        .await
        .context("Failed to archive habit")?;

    if updated.archived {
        output.success(&format!("Archived habit: {}", updated.name));
    } else {
        output.success(&format!("Unarchived habit: {}", updated.name));
    }

    Ok(())
}

/// Delete a habit and its completions
pub async fn delete(tracker: &mut Tracker, id: String, output: &Output) -> Result<()> {
    let habit = resolve_habit(tracker, &id)?;

    if output.should_prompt() {
        println!(
            "Delete habit: {} - {} (including its history)",
            &habit.id.to_string()[..8],
            habit.name
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    tracker
        .delete_habit(habit.id)
        .await
        .context("Failed to delete habit")?;

    output.success(&format!("Deleted habit: {}", habit.id));

    Ok(())
}

/// Resolve a habit reference: full UUID, id prefix, or name
pub fn resolve_habit(tracker: &Tracker, reference: &str) -> Result<Habit> {
    if let Ok(uuid) = Uuid::parse_str(reference) {
        return tracker
            .habit(uuid)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Habit not found: {}", reference));
    }

    let habits = tracker.habits();

    // Prefix match on the id
    let matches: Vec<&Habit> = habits
        .iter()
        .filter(|h| h.id.to_string().starts_with(reference))
        .collect();
    match matches.len() {
        1 => return Ok(matches[0].clone()),
        0 => {}
        _ => {
            eprintln!("Multiple habits match '{}':", reference);
            for habit in &matches {
                eprintln!("  {} - {}", habit.id, habit.name);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }

    // Fall back to a case-insensitive name match
    let named: Vec<&Habit> = habits
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case(reference))
        .collect();
    match named.len() {
        1 => Ok(named[0].clone()),
        0 => bail!("No habit found matching: {}", reference),
        _ => bail!("Multiple habits named '{}'. Use the ID instead.", reference),
    }
}

/// Parse a comma-separated day list like "mon,wed,fri"
pub fn parse_schedule(days: &str) -> Result<Schedule> {
    let mut schedule = Schedule::default();
    for day in days.split(',') {
        let day = day.trim().to_lowercase();
        if day.is_empty() {
            continue;
        }
        let weekday = match day.as_str() {
            "mon" | "monday" => Weekday::Mon,
            "tue" | "tuesday" => Weekday::Tue,
            "wed" | "wednesday" => Weekday::Wed,
            "thu" | "thursday" => Weekday::Thu,
            "fri" | "friday" => Weekday::Fri,
            "sat" | "saturday" => Weekday::Sat,
            "sun" | "sunday" => Weekday::Sun,
            other => bail!("Unknown day: '{}'. Use mon, tue, wed, thu, fri, sat, sun.", other),
        };
        schedule.set(weekday, true);
    }
    if schedule.scheduled_days() == 0 {
        bail!("Schedule needs at least one day");
    }
    Ok(schedule)
}

fn schedule_to_days(schedule: &Schedule) -> String {
    let days = [
        (schedule.monday, "mon"),
        (schedule.tuesday, "tue"),
        (schedule.wednesday, "wed"),
        (schedule.thursday, "thu"),
        (schedule.friday, "fri"),
        (schedule.saturday, "sat"),
        (schedule.sunday, "sun"),
    ];
    days.iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(",")
}
