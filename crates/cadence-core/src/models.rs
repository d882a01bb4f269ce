//! Data models for Cadence
//!
//! Defines the core data structures: Habit, Completion, UserPreferences,
//! and the derived Analytics snapshot. Fields serialize in camelCase so
//! exported JSON matches the established export file format.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which days of the week a habit is scheduled on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl Schedule {
    /// Schedule covering all seven days
    pub fn every_day() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: true,
            sunday: true,
        }
    }

    /// Schedule covering Monday through Friday
    pub fn weekdays() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            ..Self::default()
        }
    }

    /// Number of scheduled days in the week
    pub fn scheduled_days(&self) -> usize {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
        .iter()
        .filter(|d| **d)
        .count()
    }

    /// Whether the given weekday is scheduled
    pub fn is_scheduled(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// Set a single weekday on or off
    pub fn set(&mut self, weekday: Weekday, scheduled: bool) {
        match weekday {
            Weekday::Mon => self.monday = scheduled,
            Weekday::Tue => self.tuesday = scheduled,
            Weekday::Wed => self.wednesday = scheduled,
            Weekday::Thu => self.thursday = scheduled,
            Weekday::Fri => self.friday = scheduled,
            Weekday::Sat => self.saturday = scheduled,
            Weekday::Sun => self.sunday = scheduled,
        }
    }
}

/// User-supplied fields for creating a habit
///
/// Identifier, timestamps, and the archived flag are assigned by
/// [`Habit::new`]; validation happens before construction.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitDraft {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub goal: u8,
    pub schedule: Schedule,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl HabitDraft {
    /// Create a draft with sensible defaults for the optional fields
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: "#6366F1".to_string(),
            icon: icon.into(),
            goal: 7,
            schedule: Schedule::every_day(),
            category: None,
            tags: Vec::new(),
        }
    }
}

/// A tracked habit with a weekly schedule and goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Optional longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display color as a 6-digit hex string (`#RRGGBB`)
    pub color: String,
    /// Single glyph or emoji shown next to the name
    pub icon: String,
    /// Target completions per week, 1 through 7
    pub goal: u8,
    /// Which weekdays the habit is scheduled on
    pub schedule: Schedule,
    /// Optional category label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Tags for organization
    #[serde(default)]
    pub tags: Vec<String>,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// When this habit was last updated
    pub updated_at: DateTime<Utc>,
    /// Archived habits are excluded from active views but keep history
    #[serde(default)]
    pub archived: bool,
}

impl Habit {
    /// Create a new habit from a validated draft
    pub fn new(draft: HabitDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            color: draft.color,
            icon: draft.icon,
            goal: draft.goal,
            schedule: draft.schedule,
            category: draft.category,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
            archived: false,
        }
    }

    /// Update the name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Update the description
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.updated_at = Utc::now();
    }

    /// Update the display color
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
        self.updated_at = Utc::now();
    }

    /// Update the icon
    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.icon = icon.into();
        self.updated_at = Utc::now();
    }

    /// Update the weekly goal
    pub fn set_goal(&mut self, goal: u8) {
        self.goal = goal;
        self.updated_at = Utc::now();
    }

    /// Replace the schedule
    pub fn set_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
        self.updated_at = Utc::now();
    }

    /// Update the category
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
        self.updated_at = Utc::now();
    }

    /// Add a tag if not already present
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
            self.updated_at = Utc::now();
        }
    }

    /// Remove a tag
    pub fn remove_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
            self.updated_at = Utc::now();
        }
    }

    /// Set all tags (replacing existing)
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
        self.updated_at = Utc::now();
    }

    /// Set the archived flag
    pub fn set_archived(&mut self, archived: bool) {
        self.archived = archived;
        self.updated_at = Utc::now();
    }
}

/// A record of whether a habit was done on a calendar date
///
/// At most one completion exists per `(habit_id, date)` pair; the pair is
/// the natural composite key for lookups and mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Unique identifier
    pub id: Uuid,
    /// The habit this completion belongs to
    pub habit_id: Uuid,
    /// Calendar date, no time component
    pub date: NaiveDate,
    /// Whether the habit was done on this date
    pub completed: bool,
    /// Optional magnitude in [0, 100] for quantitative habits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Optional free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Instant of last mutation
    pub timestamp: DateTime<Utc>,
}

impl Completion {
    /// Create a completed record for a habit on a date
    pub fn new(habit_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit_id,
            date,
            completed: true,
            value: None,
            notes: None,
            timestamp: Utc::now(),
        }
    }

    /// Flip the completed flag
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
        self.timestamp = Utc::now();
    }

    /// Set the quantitative value; completed tracks `value > 0`
    pub fn set_value(&mut self, value: f64) {
        self.value = Some(value);
        self.completed = value > 0.0;
        self.timestamp = Utc::now();
    }

    /// Set the completed flag directly
    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
        self.timestamp = Utc::now();
    }

    /// Set the note
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
        self.timestamp = Utc::now();
    }
}

/// Color theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
            Theme::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// First day of the week for weekly views and goal windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    /// The chrono weekday this week start corresponds to
    pub fn as_weekday(&self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }
}

impl std::fmt::Display for WeekStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeekStart::Monday => write!(f, "monday"),
            WeekStart::Sunday => write!(f, "sunday"),
        }
    }
}

impl std::str::FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monday" => Ok(WeekStart::Monday),
            "sunday" => Ok(WeekStart::Sunday),
            other => Err(format!("unknown week start: {}", other)),
        }
    }
}

/// Default view mode for the UI layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Daily => write!(f, "daily"),
            ViewMode::Weekly => write!(f, "weekly"),
            ViewMode::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ViewMode::Daily),
            "weekly" => Ok(ViewMode::Weekly),
            "monthly" => Ok(ViewMode::Monthly),
            other => Err(format!("unknown view mode: {}", other)),
        }
    }
}

/// Reminder configuration; times are `HH:MM` 24-hour strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    pub morning_time: String,
    pub evening_time: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            morning_time: "08:00".to_string(),
            evening_time: "20:00".to_string(),
        }
    }
}

/// Singleton user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub theme: Theme,
    pub weekly_start_day: WeekStart,
    pub notifications: NotificationSettings,
    pub default_view: ViewMode,
    pub show_motivational_quotes: bool,
    pub vibration_enabled: bool,
    pub sound_enabled: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            weekly_start_day: WeekStart::Monday,
            notifications: NotificationSettings::default(),
            default_view: ViewMode::Daily,
            show_motivational_quotes: true,
            vibration_enabled: true,
            sound_enabled: true,
        }
    }
}

/// Derived metrics, recomputed after every habit or completion mutation
///
/// Never mutated independently; see the analytics module for the
/// computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_habits: usize,
    pub active_habits: usize,
    pub total_completions: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completion_rate: f64,
    pub weekly_goal_progress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_counts() {
        assert_eq!(Schedule::every_day().scheduled_days(), 7);
        assert_eq!(Schedule::weekdays().scheduled_days(), 5);
        assert_eq!(Schedule::default().scheduled_days(), 0);
    }

    #[test]
    fn test_schedule_is_scheduled() {
        let sched = Schedule::weekdays();
        assert!(sched.is_scheduled(Weekday::Mon));
        assert!(sched.is_scheduled(Weekday::Fri));
        assert!(!sched.is_scheduled(Weekday::Sat));
        assert!(!sched.is_scheduled(Weekday::Sun));
    }

    #[test]
    fn test_schedule_set() {
        let mut sched = Schedule::default();
        sched.set(Weekday::Wed, true);
        assert!(sched.wednesday);
        sched.set(Weekday::Wed, false);
        assert!(!sched.wednesday);
    }

    #[test]
    fn test_habit_new() {
        let habit = Habit::new(HabitDraft::new("Meditate", "🧘"));
        assert_eq!(habit.name, "Meditate");
        assert_eq!(habit.icon, "🧘");
        assert_eq!(habit.goal, 7);
        assert!(!habit.archived);
        assert!(habit.tags.is_empty());
        assert_eq!(habit.created_at, habit.updated_at);
    }

    #[test]
    fn test_habit_set_name_bumps_updated_at() {
        let mut habit = Habit::new(HabitDraft::new("Read", "📚"));
        let original_updated = habit.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(10));
        habit.set_name("Read more");
        assert_eq!(habit.name, "Read more");
        assert!(habit.updated_at > original_updated);
    }

    #[test]
    fn test_habit_tags() {
        let mut habit = Habit::new(HabitDraft::new("Run", "🏃"));
        habit.add_tag("health");
        habit.add_tag("morning");
        assert_eq!(habit.tags, vec!["health", "morning"]);

        // Adding duplicate should not add again
        habit.add_tag("health");
        assert_eq!(habit.tags.len(), 2);

        habit.remove_tag("health");
        assert_eq!(habit.tags, vec!["morning"]);
    }

    #[test]
    fn test_completion_new() {
        let habit_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let completion = Completion::new(habit_id, date);
        assert_eq!(completion.habit_id, habit_id);
        assert_eq!(completion.date, date);
        assert!(completion.completed);
        assert!(completion.value.is_none());
    }

    #[test]
    fn test_completion_toggle() {
        let mut completion =
            Completion::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(completion.completed);
        completion.toggle();
        assert!(!completion.completed);
        completion.toggle();
        assert!(completion.completed);
    }

    #[test]
    fn test_completion_value_tracks_completed() {
        let mut completion =
            Completion::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        completion.set_value(42.0);
        assert!(completion.completed);
        assert_eq!(completion.value, Some(42.0));

        completion.set_value(0.0);
        assert!(!completion.completed);
    }

    #[test]
    fn test_preferences_defaults() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.theme, Theme::System);
        assert_eq!(prefs.weekly_start_day, WeekStart::Monday);
        assert!(!prefs.notifications.enabled);
        assert_eq!(prefs.notifications.morning_time, "08:00");
        assert_eq!(prefs.default_view, ViewMode::Daily);
        assert!(prefs.show_motivational_quotes);
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!("sunday".parse::<WeekStart>().unwrap(), WeekStart::Sunday);
        assert_eq!("weekly".parse::<ViewMode>().unwrap(), ViewMode::Weekly);
        assert!("purple".parse::<Theme>().is_err());
    }

    #[test]
    fn test_habit_serialization_camel_case() {
        let habit = Habit::new(HabitDraft::new("Stretch", "🤸"));
        let json = serde_json::to_string(&habit).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
        assert!(!json.contains("\"created_at\""));

        let deserialized: Habit = serde_json::from_str(&json).unwrap();
        assert_eq!(habit, deserialized);
    }

    #[test]
    fn test_completion_serialization() {
        let mut completion =
            Completion::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        completion.set_value(30.0);
        completion.set_notes(Some("felt good".to_string()));

        let json = serde_json::to_string(&completion).unwrap();
        assert!(json.contains("\"habitId\""));
        assert!(json.contains("\"2024-03-15\""));

        let deserialized: Completion = serde_json::from_str(&json).unwrap();
        assert_eq!(completion, deserialized);
    }
}
