//! Input validation
//!
//! Schema constraints applied before any state mutation. A failure leaves
//! every collection untouched.

use chrono::NaiveTime;

use crate::error::{StoreError, StoreResult};
use crate::models::{Habit, HabitDraft, UserPreferences};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 30;
pub const MAX_TAG_LEN: usize = 20;
pub const MAX_TAGS: usize = 5;
pub const MAX_NOTES_LEN: usize = 500;
pub const MIN_GOAL: u8 = 1;
pub const MAX_GOAL: u8 = 7;

/// Validate user-supplied fields for habit creation
pub fn validate_draft(draft: &HabitDraft) -> StoreResult<()> {
    validate_habit_fields(
        &draft.name,
        draft.description.as_deref(),
        &draft.color,
        &draft.icon,
        draft.goal,
        draft.category.as_deref(),
        &draft.tags,
    )
}

/// Validate a full habit (used on the update path)
pub fn validate_habit(habit: &Habit) -> StoreResult<()> {
    validate_habit_fields(
        &habit.name,
        habit.description.as_deref(),
        &habit.color,
        &habit.icon,
        habit.goal,
        habit.category.as_deref(),
        &habit.tags,
    )
}

fn validate_habit_fields(
    name: &str,
    description: Option<&str>,
    color: &str,
    icon: &str,
    goal: u8,
    category: Option<&str>,
    tags: &[String],
) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::validation("name", "name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::validation(
            "name",
            format!("must not exceed {} characters", MAX_NAME_LEN),
        ));
    }
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(StoreError::validation(
                "description",
                format!("must not exceed {} characters", MAX_DESCRIPTION_LEN),
            ));
        }
    }
    if !is_hex_color(color) {
        return Err(StoreError::validation(
            "color",
            "must be a 6-digit hex color like #4F46E5",
        ));
    }
    if icon.is_empty() {
        return Err(StoreError::validation("icon", "icon is required"));
    }
    if !(MIN_GOAL..=MAX_GOAL).contains(&goal) {
        return Err(StoreError::validation(
            "goal",
            format!("must be between {} and {}", MIN_GOAL, MAX_GOAL),
        ));
    }
    if let Some(category) = category {
        if category.chars().count() > MAX_CATEGORY_LEN {
            return Err(StoreError::validation(
                "category",
                format!("must not exceed {} characters", MAX_CATEGORY_LEN),
            ));
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(StoreError::validation(
            "tags",
            format!("at most {} tags allowed", MAX_TAGS),
        ));
    }
    for tag in tags {
        if tag.is_empty() {
            return Err(StoreError::validation("tags", "tags must not be empty"));
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(StoreError::validation(
                "tags",
                format!("each tag must not exceed {} characters", MAX_TAG_LEN),
            ));
        }
    }
    Ok(())
}

/// Validate a quantitative completion value
pub fn validate_value(value: f64) -> StoreResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(StoreError::validation(
            "value",
            "must be between 0 and 100",
        ));
    }
    Ok(())
}

/// Validate a completion note
pub fn validate_notes(notes: &str) -> StoreResult<()> {
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(StoreError::validation(
            "notes",
            format!("must not exceed {} characters", MAX_NOTES_LEN),
        ));
    }
    Ok(())
}

/// Validate preference fields (notification times)
pub fn validate_preferences(prefs: &UserPreferences) -> StoreResult<()> {
    validate_clock_time("notifications.morningTime", &prefs.notifications.morning_time)?;
    validate_clock_time("notifications.eveningTime", &prefs.notifications.evening_time)?;
    Ok(())
}

fn validate_clock_time(field: &'static str, time: &str) -> StoreResult<()> {
    // HH:MM with zero-padded hour, matching the stored format
    if time.len() != 5 || NaiveTime::parse_from_str(time, "%H:%M").is_err() {
        return Err(StoreError::validation(
            field,
            "must be a 24-hour HH:MM time",
        ));
    }
    Ok(())
}

/// Strict `#RRGGBB` check, case-insensitive hex digits
pub fn is_hex_color(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('#') && s.len() == 7 && chars.all(|c| c.is_ascii_hexdigit())
}
