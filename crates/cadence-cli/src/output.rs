//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use cadence_core::{
    Analytics, Completion, DayProgress, Habit, StoreStats, Streak, UserPreferences,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single habit with its streak
    pub fn print_habit(&self, habit: &Habit, streak: Option<Streak>) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", habit.id);
                println!("Name:        {} {}", habit.icon, habit.name);
                if let Some(ref desc) = habit.description {
                    println!("Description: {}", desc);
                }
                println!("Color:       {}", habit.color);
                println!("Goal:        {}/week", habit.goal);
                println!("Schedule:    {}", schedule_summary(habit));
                if let Some(ref category) = habit.category {
                    println!("Category:    {}", category);
                }
                if !habit.tags.is_empty() {
                    println!("Tags:        {}", habit.tags.join(", "));
                }
                if let Some(streak) = streak {
                    println!(
                        "Streak:      {} current, {} longest",
                        streak.current, streak.longest
                    );
                }
                if habit.archived {
                    println!("Archived:    yes");
                }
                println!("Created:     {}", habit.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:     {}", habit.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(habit).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", habit.id);
            }
        }
    }

    /// Print a list of habits
    pub fn print_habits(&self, habits: &[Habit]) {
        match self.format {
            OutputFormat::Human => {
                if habits.is_empty() {
                    println!("No habits found.");
                    return;
                }
                for habit in habits {
                    let archived = if habit.archived { " [archived]" } else { "" };
                    println!(
                        "{} | {} {}{} | {}/week | {}",
                        &habit.id.to_string()[..8],
                        habit.icon,
                        truncate(&habit.name, 30),
                        archived,
                        habit.goal,
                        schedule_summary(habit),
                    );
                }
                println!("\n{} habit(s)", habits.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(habits).unwrap());
            }
            OutputFormat::Quiet => {
                for habit in habits {
                    println!("{}", habit.id);
                }
            }
        }
    }

    /// Print the result of a completion mutation
    pub fn print_completion(&self, habit: &Habit, completion: &Completion) {
        match self.format {
            OutputFormat::Human => {
                let mark = if completion.completed { "✓" } else { "○" };
                let value = completion
                    .value
                    .map(|v| format!(" ({})", v))
                    .unwrap_or_default();
                println!(
                    "{} {} {} on {}{}",
                    mark, habit.icon, habit.name, completion.date, value
                );
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(completion).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", completion.id);
            }
        }
    }

    /// Print the analytics snapshot
    pub fn print_analytics(&self, analytics: &Analytics) {
        match self.format {
            OutputFormat::Human => {
                println!("Habits:           {} total, {} active", analytics.total_habits, analytics.active_habits);
                println!("Completions:      {}", analytics.total_completions);
                println!("Current streak:   {} day(s)", analytics.current_streak);
                println!("Longest streak:   {} day(s)", analytics.longest_streak);
                println!("Completion rate:  {:.0}% (last 7 days)", analytics.completion_rate);
                println!("Weekly goal:      {:.0}%", analytics.weekly_goal_progress);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(analytics).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", analytics.current_streak);
            }
        }
    }

    /// Print per-day progress for a week
    pub fn print_week(&self, days: &[DayProgress]) {
        match self.format {
            OutputFormat::Human => {
                for day in days {
                    let bar = progress_bar(day.progress, 20);
                    println!(
                        "{} {}  {}/{} ({:.0}%)",
                        day.date.format("%a %Y-%m-%d"),
                        bar,
                        day.completed,
                        day.total,
                        day.progress
                    );
                }
            }
            OutputFormat::Json => {
                let json_days: Vec<_> = days
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "date": d.date.to_string(),
                            "completed": d.completed,
                            "total": d.total,
                            "progress": d.progress,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json_days).unwrap());
            }
            OutputFormat::Quiet => {
                for day in days {
                    println!("{} {}", day.date, day.completed);
                }
            }
        }
    }

    /// Print storage statistics
    pub fn print_stats(&self, stats: &StoreStats) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(stats).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", stats.total_records);
            }
            OutputFormat::Human => {
                println!("Habits:      {}", stats.habit_count);
                println!("Completions: {}", stats.completion_count);
                println!("Preferences: {}", stats.preference_count);
                println!("Total:       {} record(s)", stats.total_records);
                match stats.storage_used {
                    Some(bytes) => println!("Storage:     {}", human_size(bytes)),
                    None => println!("Storage:     (unavailable)"),
                }
            }
        }
    }

    /// Print preferences
    pub fn print_preferences(&self, prefs: &UserPreferences) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(prefs).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", prefs.theme);
            }
            OutputFormat::Human => {
                println!("theme:         {}", prefs.theme);
                println!("week_start:    {}", prefs.weekly_start_day);
                println!("default_view:  {}", prefs.default_view);
                println!(
                    "notifications: {} ({} / {})",
                    if prefs.notifications.enabled { "on" } else { "off" },
                    prefs.notifications.morning_time,
                    prefs.notifications.evening_time
                );
                println!("quotes:        {}", on_off(prefs.show_motivational_quotes));
                println!("vibration:     {}", on_off(prefs.vibration_enabled));
                println!("sound:         {}", on_off(prefs.sound_enabled));
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Compact weekday summary like "mon tue wed thu fri"
fn schedule_summary(habit: &Habit) -> String {
    let days = [
        (habit.schedule.monday, "mon"),
        (habit.schedule.tuesday, "tue"),
        (habit.schedule.wednesday, "wed"),
        (habit.schedule.thursday, "thu"),
        (habit.schedule.friday, "fri"),
        (habit.schedule.saturday, "sat"),
        (habit.schedule.sunday, "sun"),
    ];
    if days.iter().all(|(on, _)| *on) {
        return "every day".to_string();
    }
    let active: Vec<&str> = days
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
    if active.is_empty() {
        "unscheduled".to_string()
    } else {
        active.join(" ")
    }
}

fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round().min(width as f64) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
