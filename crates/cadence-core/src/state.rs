//! Reactive state store
//!
//! An explicitly constructed, observable container for the four state
//! slices (habits, completions, preferences, view) plus the derived
//! analytics snapshot. Every action mutates its slice and synchronously
//! recomputes analytics before returning, so observers never see
//! analytics that are stale relative to the mutation that produced them.
//!
//! Change notification is per-slice: each slice owns a watch channel
//! carrying a version counter, bumped only when that slice actually
//! changes value. Subscribers of one slice are not woken by mutations to
//! another.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::analytics::compute_analytics;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Analytics, Completion, Habit, Theme, UserPreferences, ViewMode, WeekStart,
};

/// Lightweight UI state persisted with the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub selected_date: NaiveDate,
    pub view_mode: ViewMode,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            selected_date: today(),
            view_mode: ViewMode::default(),
        }
    }
}

/// State slices a consumer can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    Habits,
    Completions,
    Preferences,
    View,
    Analytics,
}

struct SliceChannels {
    habits: watch::Sender<u64>,
    completions: watch::Sender<u64>,
    preferences: watch::Sender<u64>,
    view: watch::Sender<u64>,
    analytics: watch::Sender<u64>,
}

impl Default for SliceChannels {
    fn default() -> Self {
        Self {
            habits: watch::channel(0).0,
            completions: watch::channel(0).0,
            preferences: watch::channel(0).0,
            view: watch::channel(0).0,
            analytics: watch::channel(0).0,
        }
    }
}

impl SliceChannels {
    fn bump(&self, slice: Slice) {
        let tx = match slice {
            Slice::Habits => &self.habits,
            Slice::Completions => &self.completions,
            Slice::Preferences => &self.preferences,
            Slice::View => &self.view,
            Slice::Analytics => &self.analytics,
        };
        tx.send_modify(|v| *v += 1);
    }
}

/// Observable container for habits, completions, preferences, and view
/// state, with derived analytics
pub struct StateStore {
    habits: Vec<Habit>,
    completions: Vec<Completion>,
    preferences: UserPreferences,
    view: ViewState,
    analytics: Analytics,
    channels: SliceChannels,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Create an empty store with default preferences and view state
    pub fn new() -> Self {
        Self::with_data(
            Vec::new(),
            Vec::new(),
            UserPreferences::default(),
            ViewState::default(),
        )
    }

    /// Create a store from loaded collections
    pub fn with_data(
        habits: Vec<Habit>,
        completions: Vec<Completion>,
        preferences: UserPreferences,
        view: ViewState,
    ) -> Self {
        let analytics = compute_analytics(
            &habits,
            &completions,
            today(),
            preferences.weekly_start_day,
        );
        Self {
            habits,
            completions,
            preferences,
            view,
            analytics,
            channels: SliceChannels::default(),
        }
    }

    // ==================== Selectors ====================

    /// All habits
    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    /// Non-archived habits only
    pub fn active_habits(&self) -> Vec<Habit> {
        self.habits.iter().filter(|h| !h.archived).cloned().collect()
    }

    /// Look up one habit
    pub fn habit(&self, id: Uuid) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    /// All completions
    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    /// Completions for one date
    pub fn completions_on(&self, date: NaiveDate) -> Vec<Completion> {
        self.completions
            .iter()
            .filter(|c| c.date == date)
            .cloned()
            .collect()
    }

    /// Completions for today
    pub fn today_completions(&self) -> Vec<Completion> {
        self.completions_on(today())
    }

    /// Composite lookup by `(habit_id, date)`
    pub fn completion_for(&self, habit_id: Uuid, date: NaiveDate) -> Option<&Completion> {
        self.completions
            .iter()
            .find(|c| c.habit_id == habit_id && c.date == date)
    }

    /// Current preferences
    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Current view state
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// The derived analytics snapshot
    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    // ==================== Subscriptions ====================

    /// Subscribe to changes of one slice
    ///
    /// The receiver yields a version counter; it changes exactly when the
    /// slice changes value.
    pub fn subscribe(&self, slice: Slice) -> watch::Receiver<u64> {
        match slice {
            Slice::Habits => self.channels.habits.subscribe(),
            Slice::Completions => self.channels.completions.subscribe(),
            Slice::Preferences => self.channels.preferences.subscribe(),
            Slice::View => self.channels.view.subscribe(),
            Slice::Analytics => self.channels.analytics.subscribe(),
        }
    }

    // ==================== Habit Actions ====================

    /// Add a habit (already validated)
    pub fn add_habit(&mut self, habit: Habit) {
        self.habits.push(habit);
        self.channels.bump(Slice::Habits);
        self.recompute_analytics();
    }

    /// Replace an existing habit
    pub fn update_habit(&mut self, habit: Habit) -> StoreResult<Habit> {
        let slot = self
            .habits
            .iter_mut()
            .find(|h| h.id == habit.id)
            .ok_or_else(|| StoreError::not_found("habit", habit.id))?;
        *slot = habit.clone();
        self.channels.bump(Slice::Habits);
        self.recompute_analytics();
        Ok(habit)
    }

    /// Remove a habit and all of its completions
    ///
    /// Returns the removed habit and completions so callers can mirror
    /// the cascade durably.
    pub fn delete_habit(&mut self, id: Uuid) -> StoreResult<(Habit, Vec<Completion>)> {
        let pos = self
            .habits
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| StoreError::not_found("habit", id))?;
        let habit = self.habits.remove(pos);

        let (removed, kept): (Vec<Completion>, Vec<Completion>) = self
            .completions
            .drain(..)
            .partition(|c| c.habit_id == id);
        self.completions = kept;

        self.channels.bump(Slice::Habits);
        if !removed.is_empty() {
            self.channels.bump(Slice::Completions);
        }
        self.recompute_analytics();
        debug!(habit_id = %id, completions = removed.len(), "removed habit from state");
        Ok((habit, removed))
    }

    /// Flip a habit's archived flag
    pub fn toggle_habit_archived(&mut self, id: Uuid) -> StoreResult<Habit> {
        let habit = self
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| StoreError::not_found("habit", id))?;
        let archived = habit.archived;
        habit.set_archived(!archived);
        let updated = habit.clone();
        self.channels.bump(Slice::Habits);
        self.recompute_analytics();
        Ok(updated)
    }

    // ==================== Completion Actions ====================

    /// Toggle the completion for `(habit_id, date)`
    ///
    /// Flips the existing record's flag, or creates a completed record if
    /// none exists. Applying it twice returns to the original state and
    /// leaves exactly one record for the pair.
    pub fn toggle_completion(
        &mut self,
        habit_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Completion> {
        self.ensure_habit(habit_id)?;

        let result = match self
            .completions
            .iter_mut()
            .find(|c| c.habit_id == habit_id && c.date == date)
        {
            Some(existing) => {
                existing.toggle();
                existing.clone()
            }
            None => {
                let completion = Completion::new(habit_id, date);
                self.completions.push(completion.clone());
                completion
            }
        };

        self.channels.bump(Slice::Completions);
        self.recompute_analytics();
        Ok(result)
    }

    /// Set the quantitative value for `(habit_id, date)`
    ///
    /// Creates the record if needed; `completed` tracks `value > 0`.
    pub fn set_completion_value(
        &mut self,
        habit_id: Uuid,
        date: NaiveDate,
        value: f64,
        notes: Option<String>,
    ) -> StoreResult<Completion> {
        self.ensure_habit(habit_id)?;

        let result = match self
            .completions
            .iter_mut()
            .find(|c| c.habit_id == habit_id && c.date == date)
        {
            Some(existing) => {
                existing.set_value(value);
                if notes.is_some() {
                    existing.set_notes(notes);
                }
                existing.clone()
            }
            None => {
                let mut completion = Completion::new(habit_id, date);
                completion.set_value(value);
                completion.notes = notes;
                self.completions.push(completion.clone());
                completion
            }
        };

        self.channels.bump(Slice::Completions);
        self.recompute_analytics();
        Ok(result)
    }

    /// Set the completed flag for several habits on one date
    pub fn bulk_toggle_completions(
        &mut self,
        habit_ids: &[Uuid],
        date: NaiveDate,
        completed: bool,
    ) -> StoreResult<Vec<Completion>> {
        for id in habit_ids {
            self.ensure_habit(*id)?;
        }

        let mut results = Vec::with_capacity(habit_ids.len());
        for id in habit_ids {
            let result = match self
                .completions
                .iter_mut()
                .find(|c| c.habit_id == *id && c.date == date)
            {
                Some(existing) => {
                    existing.set_completed(completed);
                    existing.clone()
                }
                None => {
                    let mut completion = Completion::new(*id, date);
                    completion.completed = completed;
                    self.completions.push(completion.clone());
                    completion
                }
            };
            results.push(result);
        }

        if !results.is_empty() {
            self.channels.bump(Slice::Completions);
            self.recompute_analytics();
        }
        Ok(results)
    }

    // ==================== Preference Actions ====================

    /// Set the color theme
    pub fn set_theme(&mut self, theme: Theme) {
        if self.preferences.theme != theme {
            self.preferences.theme = theme;
            self.channels.bump(Slice::Preferences);
        }
    }

    /// Set the first day of the week
    ///
    /// Also recomputes analytics since the weekly window moves.
    pub fn set_weekly_start_day(&mut self, day: WeekStart) {
        if self.preferences.weekly_start_day != day {
            self.preferences.weekly_start_day = day;
            self.channels.bump(Slice::Preferences);
            self.recompute_analytics();
        }
    }

    /// Flip the notifications master switch; returns the new value
    pub fn toggle_notifications(&mut self) -> bool {
        self.preferences.notifications.enabled = !self.preferences.notifications.enabled;
        self.channels.bump(Slice::Preferences);
        self.preferences.notifications.enabled
    }

    /// Replace the preferences wholesale
    pub fn update_preferences(&mut self, prefs: UserPreferences) {
        if self.preferences != prefs {
            let week_changed = self.preferences.weekly_start_day != prefs.weekly_start_day;
            self.preferences = prefs;
            self.channels.bump(Slice::Preferences);
            if week_changed {
                self.recompute_analytics();
            }
        }
    }

    // ==================== View Actions ====================

    /// Change the selected date
    pub fn set_selected_date(&mut self, date: NaiveDate) {
        if self.view.selected_date != date {
            self.view.selected_date = date;
            self.channels.bump(Slice::View);
        }
    }

    /// Change the view mode
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view.view_mode != mode {
            self.view.view_mode = mode;
            self.channels.bump(Slice::View);
        }
    }

    // ==================== Store-wide Actions ====================

    /// Hard reset of every slice to its default value
    pub fn reset(&mut self) {
        self.habits.clear();
        self.completions.clear();
        self.preferences = UserPreferences::default();
        self.view = ViewState::default();
        self.channels.bump(Slice::Habits);
        self.channels.bump(Slice::Completions);
        self.channels.bump(Slice::Preferences);
        self.channels.bump(Slice::View);
        self.recompute_analytics();
        debug!("state store reset");
    }

    /// Wholesale replacement of the habit and completion collections
    ///
    /// The caller is responsible for having validated the shape; the
    /// store does not revalidate imported entities.
    pub fn import_data(&mut self, habits: Vec<Habit>, completions: Vec<Completion>) {
        self.habits = habits;
        self.completions = completions;
        self.channels.bump(Slice::Habits);
        self.channels.bump(Slice::Completions);
        self.recompute_analytics();
    }

    fn ensure_habit(&self, id: Uuid) -> StoreResult<()> {
        if self.habit(id).is_none() {
            return Err(StoreError::not_found("habit", id));
        }
        Ok(())
    }

    fn recompute_analytics(&mut self) {
        let analytics = compute_analytics(
            &self.habits,
            &self.completions,
            today(),
            self.preferences.weekly_start_day,
        );
        if analytics != self.analytics {
            self.analytics = analytics;
            self.channels.bump(Slice::Analytics);
        }
    }
}

/// Today's calendar date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
