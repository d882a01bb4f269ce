//! Unified tracker interface
//!
//! The `Tracker` coordinates the pieces of the store:
//! - SQLite database (source of truth for habits, completions, preferences)
//! - In-memory state store (observable cache, analytics)
//! - Optimistic writer (immediate in-memory reflection, background writes)
//! - Session file (preferences + view state across restarts)
//!
//! Every action follows the same sequence: validate, claim the operation
//! key, apply the result to observable state, enqueue the durable write,
//! and return the computed result immediately. Durable failures surface
//! on the failure channel; `reload` re-reads durable truth when a caller
//! needs to reconcile.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tracker = Tracker::open()?;
//!
//! let habit = tracker.add_habit(HabitDraft::new("Meditate", "🧘")).await?;
//! tracker.toggle_completion(habit.id, None).await?;
//!
//! let analytics = tracker.analytics();
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::analytics::{self, DayProgress, Streak};
use crate::config::Config;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Analytics, Completion, Habit, HabitDraft, Theme, UserPreferences, ViewMode, WeekStart,
};
use crate::optimistic::{MutationFailure, OptimisticWriter, SharedDb, WriteStatus};
use crate::session::Session;
use crate::state::{today, Slice, StateStore, ViewState};
use crate::transfer::{self, ExportDocument, ImportSummary, StoreStats};
use crate::validate;

/// Coordinating facade over the state store, database, and writer
pub struct Tracker {
    state: StateStore,
    db: SharedDb,
    writer: OptimisticWriter,
    failures: Option<mpsc::UnboundedReceiver<MutationFailure>>,
    config: Config,
}

impl Tracker {
    /// Open the tracker using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the tracker with a specific configuration
    ///
    /// Opens (or creates) the database, runs pending migrations, loads
    /// the collections into the state store, and restores the session.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let database =
            Database::open(&config.sqlite_path()).context("Failed to open database")?;

        let habits = database.list_habits().context("Failed to load habits")?;
        let completions = database
            .list_completions(None)
            .context("Failed to load completions")?;

        let session = Session::load(&config.session_path());
        // The database copy wins when both exist; the session copy seeds
        // fresh installs
        let preferences = match database.get_preferences()? {
            Some(prefs) => prefs,
            None => session.preferences.clone(),
        };

        let state = StateStore::with_data(habits, completions, preferences, session.view);
        let db: SharedDb = Arc::new(Mutex::new(database));
        let (writer, failure_rx) = OptimisticWriter::new(Arc::clone(&db));

        debug!(data_dir = %config.data_dir.display(), "tracker opened");
        Ok(Self {
            state,
            db,
            writer,
            failures: Some(failure_rx),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Selectors ====================

    /// All habits
    pub fn habits(&self) -> &[Habit] {
        self.state.habits()
    }

    /// Non-archived habits
    pub fn active_habits(&self) -> Vec<Habit> {
        self.state.active_habits()
    }

    /// Look up one habit
    pub fn habit(&self, id: Uuid) -> Option<&Habit> {
        self.state.habit(id)
    }

    /// All completions
    pub fn completions(&self) -> &[Completion] {
        self.state.completions()
    }

    /// Completions for one date
    pub fn completions_on(&self, date: NaiveDate) -> Vec<Completion> {
        self.state.completions_on(date)
    }

    /// Completions for today
    pub fn today_completions(&self) -> Vec<Completion> {
        self.state.today_completions()
    }

    /// The derived analytics snapshot
    pub fn analytics(&self) -> &Analytics {
        self.state.analytics()
    }

    /// Streak for one habit
    pub fn habit_streak(&self, id: Uuid) -> Streak {
        analytics::habit_streak(self.state.completions(), id, today())
    }

    /// Per-day progress across the week containing the selected date
    pub fn week_progress(&self) -> Vec<DayProgress> {
        let (begin, _) = analytics::week_window(
            self.state.view().selected_date,
            self.state.preferences().weekly_start_day,
        );
        (0..7)
            .map(|offset| {
                let date = begin + chrono::Duration::days(offset);
                analytics::daily_progress(self.state.habits(), self.state.completions(), date)
            })
            .collect()
    }

    /// Current preferences
    pub fn preferences(&self) -> &UserPreferences {
        self.state.preferences()
    }

    /// Current view state
    pub fn view(&self) -> &ViewState {
        self.state.view()
    }

    /// Subscribe to changes of one state slice
    pub fn subscribe(&self, slice: Slice) -> tokio::sync::watch::Receiver<u64> {
        self.state.subscribe(slice)
    }

    // ==================== Habit Actions ====================

    /// Create a habit
    pub async fn add_habit(&mut self, draft: HabitDraft) -> StoreResult<Habit> {
        validate::validate_draft(&draft)?;
        let habit = Habit::new(draft);

        let ticket = self.writer.begin(format!("add-habit-{}", habit.id)).await?;
        self.state.add_habit(habit.clone());

        let durable = habit.clone();
        self.writer
            .commit(ticket, move |db| db.insert_habit(&durable))
            .await;
        Ok(habit)
    }

    /// Update a habit
    ///
    /// Callers fetch the habit, mutate it through its setters, and pass
    /// it back; the whole record is revalidated and replaced.
    pub async fn update_habit(&mut self, mut habit: Habit) -> StoreResult<Habit> {
        habit.updated_at = Utc::now();
        validate::validate_habit(&habit)?;
        if self.state.habit(habit.id).is_none() {
            return Err(StoreError::not_found("habit", habit.id));
        }

        let ticket = self
            .writer
            .begin(format!("update-habit-{}", habit.id))
            .await?;
        let applied = self.state.update_habit(habit)?;

        let durable = applied.clone();
        self.writer
            .commit(ticket, move |db| db.update_habit(&durable))
            .await;
        Ok(applied)
    }

    /// Delete a habit and all of its completions
    pub async fn delete_habit(&mut self, id: Uuid) -> StoreResult<()> {
        if self.state.habit(id).is_none() {
            return Err(StoreError::not_found("habit", id));
        }

        let ticket = self.writer.begin(format!("delete-habit-{}", id)).await?;
        self.state.delete_habit(id)?;

        self.writer
            .commit(ticket, move |db| db.delete_habit(id))
            .await;
        Ok(())
    }

    /// Flip a habit's archived flag
    pub async fn toggle_habit_archived(&mut self, id: Uuid) -> StoreResult<Habit> {
        if self.state.habit(id).is_none() {
            return Err(StoreError::not_found("habit", id));
        }

        // Shares the update key so concurrent edits to the same habit
        // cannot race
        let ticket = self.writer.begin(format!("update-habit-{}", id)).await?;
        let updated = self.state.toggle_habit_archived(id)?;

        let durable = updated.clone();
        self.writer
            .commit(ticket, move |db| db.update_habit(&durable))
            .await;
        Ok(updated)
    }

    /// Replace several habits in one durable transaction
    pub async fn bulk_update_habits(&mut self, habits: Vec<Habit>) -> StoreResult<Vec<Habit>> {
        let mut stamped = Vec::with_capacity(habits.len());
        for mut habit in habits {
            habit.updated_at = Utc::now();
            validate::validate_habit(&habit)?;
            if self.state.habit(habit.id).is_none() {
                return Err(StoreError::not_found("habit", habit.id));
            }
            stamped.push(habit);
        }

        let ticket = self.writer.begin("bulk-update-habits").await?;
        for habit in &stamped {
            self.state.update_habit(habit.clone())?;
        }

        let durable = stamped.clone();
        self.writer
            .commit(ticket, move |db| db.bulk_update_habits(&durable))
            .await;
        Ok(stamped)
    }

    // ==================== Completion Actions ====================

    /// Toggle the completion for a habit
    ///
    /// Defaults to the selected date when no date is given.
    pub async fn toggle_completion(
        &mut self,
        habit_id: Uuid,
        date: Option<NaiveDate>,
    ) -> StoreResult<Completion> {
        let date = date.unwrap_or(self.state.view().selected_date);
        if self.state.habit(habit_id).is_none() {
            return Err(StoreError::not_found("habit", habit_id));
        }

        let ticket = self
            .writer
            .begin(format!("toggle-completion-{}-{}", habit_id, date))
            .await?;
        let completion = self.state.toggle_completion(habit_id, date)?;

        let durable = completion.clone();
        self.writer
            .commit(ticket, move |db| db.upsert_completion(&durable))
            .await;
        Ok(completion)
    }

    /// Record a quantitative completion value
    pub async fn set_completion_value(
        &mut self,
        habit_id: Uuid,
        date: NaiveDate,
        value: f64,
        notes: Option<String>,
    ) -> StoreResult<Completion> {
        validate::validate_value(value)?;
        if let Some(ref notes) = notes {
            validate::validate_notes(notes)?;
        }
        if self.state.habit(habit_id).is_none() {
            return Err(StoreError::not_found("habit", habit_id));
        }

        let ticket = self
            .writer
            .begin(format!("set-completion-{}-{}", habit_id, date))
            .await?;
        let completion = self
            .state
            .set_completion_value(habit_id, date, value, notes)?;

        let durable = completion.clone();
        self.writer
            .commit(ticket, move |db| db.upsert_completion(&durable))
            .await;
        Ok(completion)
    }

    /// Set the completed flag for several habits on one date, durably in
    /// one transaction
    pub async fn bulk_toggle_completions(
        &mut self,
        habit_ids: &[Uuid],
        date: NaiveDate,
        completed: bool,
    ) -> StoreResult<Vec<Completion>> {
        for id in habit_ids {
            if self.state.habit(*id).is_none() {
                return Err(StoreError::not_found("habit", *id));
            }
        }

        let ticket = self
            .writer
            .begin(format!("bulk-toggle-completions-{}", date))
            .await?;
        let completions = self
            .state
            .bulk_toggle_completions(habit_ids, date, completed)?;

        let durable = completions.clone();
        self.writer
            .commit(ticket, move |db| db.bulk_upsert_completions(&durable))
            .await;
        Ok(completions)
    }

    // ==================== Preference Actions ====================

    /// Set the color theme
    pub async fn set_theme(&mut self, theme: Theme) -> StoreResult<()> {
        self.state.set_theme(theme);
        self.persist_preferences().await
    }

    /// Set the first day of the week
    pub async fn set_weekly_start_day(&mut self, day: WeekStart) -> StoreResult<()> {
        self.state.set_weekly_start_day(day);
        self.persist_preferences().await
    }

    /// Flip the notifications master switch; returns the new value
    pub async fn toggle_notifications(&mut self) -> StoreResult<bool> {
        let enabled = self.state.toggle_notifications();
        self.persist_preferences().await?;
        Ok(enabled)
    }

    /// Replace the preferences wholesale
    pub async fn update_preferences(&mut self, prefs: UserPreferences) -> StoreResult<()> {
        validate::validate_preferences(&prefs)?;
        self.state.update_preferences(prefs);
        self.persist_preferences().await
    }

    // ==================== View Actions ====================

    /// Change the selected date
    pub fn set_selected_date(&mut self, date: NaiveDate) -> StoreResult<()> {
        self.state.set_selected_date(date);
        self.save_session()
    }

    /// Change the view mode
    pub fn set_view_mode(&mut self, mode: ViewMode) -> StoreResult<()> {
        self.state.set_view_mode(mode);
        self.save_session()
    }

    // ==================== Import / Export / Maintenance ====================

    /// Snapshot all three collections from the database
    pub async fn export_data(&self) -> StoreResult<ExportDocument> {
        let db = self.db.lock().await;
        let habits = db.list_habits()?;
        let completions = db.list_completions(None)?;
        let preferences: Vec<UserPreferences> = db.get_preferences()?.into_iter().collect();
        Ok(ExportDocument::new(habits, completions, preferences))
    }

    /// Replace all three collections from an export document
    ///
    /// The durable replacement is one transaction; the in-memory slices
    /// follow once it commits.
    pub async fn import_data(&mut self, json: &str) -> StoreResult<ImportSummary> {
        let doc = transfer::parse_import(json)?;

        {
            let mut db = self.db.lock().await;
            db.replace_all(&doc.habits, &doc.completions, &doc.preferences)?;
        }

        if let Some(prefs) = doc.preferences.first() {
            self.state.update_preferences(prefs.clone());
        }
        let summary = ImportSummary {
            habits: doc.habits.len(),
            completions: doc.completions.len(),
            preferences: doc.preferences.len(),
        };
        self.state.import_data(doc.habits, doc.completions);
        self.save_session()?;
        Ok(summary)
    }

    /// Collection counts and best-effort storage figures
    pub async fn stats(&self) -> StoreResult<StoreStats> {
        let db = self.db.lock().await;
        let habit_count = db.habit_count()?;
        let completion_count = db.completion_count()?;
        let preference_count = db.preference_count()?;

        // Best-effort only; absent when the filesystem cannot say
        let storage_used = std::fs::metadata(self.config.sqlite_path())
            .ok()
            .map(|m| m.len());

        Ok(StoreStats {
            habit_count,
            completion_count,
            preference_count,
            total_records: habit_count + completion_count + preference_count,
            storage_used,
            storage_quota: None,
            last_updated: Utc::now(),
        })
    }

    /// Empty all three collections and reset observable state
    pub async fn clear_all(&mut self) -> StoreResult<()> {
        {
            let mut db = self.db.lock().await;
            db.clear_all()?;
        }
        self.state.reset();
        self.save_session()
    }

    // ==================== Reconciliation ====================

    /// Re-read durable truth into the state store
    ///
    /// Waits for outstanding writes, then replaces the in-memory
    /// collections with the database contents. This is the recovery path
    /// after a durable write failure.
    pub async fn reload(&mut self) -> StoreResult<()> {
        self.writer.flush().await;

        let (habits, completions, preferences) = {
            let db = self.db.lock().await;
            (
                db.list_habits()?,
                db.list_completions(None)?,
                db.get_preferences()?,
            )
        };

        if let Some(prefs) = preferences {
            self.state.update_preferences(prefs);
        }
        self.state.import_data(habits, completions);
        Ok(())
    }

    /// Take the mutation-failure receiver
    ///
    /// Failures of background durable writes are delivered here; the
    /// optimistic value stays visible until the caller reconciles.
    pub fn take_failures(&mut self) -> Option<mpsc::UnboundedReceiver<MutationFailure>> {
        self.failures.take()
    }

    /// Last known durable-write status for an operation key
    pub async fn write_status(&self, key: &str) -> Option<WriteStatus> {
        self.writer.status(key).await
    }

    /// Await every outstanding durable write
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    fn save_session(&self) -> StoreResult<()> {
        let session = Session {
            preferences: self.state.preferences().clone(),
            view: self.state.view().clone(),
        };
        session.save(&self.config.session_path())
    }

    async fn persist_preferences(&mut self) -> StoreResult<()> {
        self.save_session()?;
        let prefs = self.state.preferences().clone();
        let mut db = self.db.lock().await;
        db.put_preferences(&prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
        }
    }

    fn draft(name: &str) -> HabitDraft {
        HabitDraft::new(name, "✓")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let tracker = Tracker::open_with_config(config.clone()).unwrap();
        assert!(config.sqlite_path().exists());
        assert!(tracker.habits().is_empty());
    }

    #[tokio::test]
    async fn test_add_habit_is_immediately_visible() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Meditate")).await.unwrap();

        // Visible before the durable write settles
        assert_eq!(tracker.habits().len(), 1);
        assert_eq!(tracker.analytics().total_habits, 1);

        tracker.flush().await;
        assert_eq!(
            tracker
                .write_status(&format!("add-habit-{}", habit.id))
                .await,
            Some(WriteStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let habit = {
            let mut tracker = Tracker::open_with_config(config.clone()).unwrap();
            let habit = tracker.add_habit(draft("Persist")).await.unwrap();
            tracker
                .toggle_completion(habit.id, Some(date(2024, 1, 1)))
                .await
                .unwrap();
            tracker.flush().await;
            habit
        };

        let tracker = Tracker::open_with_config(config).unwrap();
        assert_eq!(tracker.habits().len(), 1);
        assert_eq!(tracker.habits()[0].id, habit.id);
        assert_eq!(tracker.completions().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_store_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let err = tracker.add_habit(draft(&"x".repeat(51))).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert!(tracker.habits().is_empty());

        tracker.flush().await;
        let db = tracker.db.lock().await;
        assert_eq!(db.habit_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_habit() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let mut habit = tracker.add_habit(draft("Run")).await.unwrap();
        habit.set_name("Run 5k");
        let updated = tracker.update_habit(habit.clone()).await.unwrap();
        assert_eq!(updated.name, "Run 5k");
        assert!(updated.updated_at >= updated.created_at);

        tracker.flush().await;
        let db = tracker.db.lock().await;
        assert_eq!(db.get_habit(habit.id).unwrap().unwrap().name, "Run 5k");
    }

    #[tokio::test]
    async fn test_update_missing_habit() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = Habit::new(draft("Ghost"));
        let err = tracker.update_habit(habit).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_habit_cascades_atomically() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let mut tracker = Tracker::open_with_config(config.clone()).unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        let other = tracker.add_habit(draft("Read")).await.unwrap();
        tracker
            .toggle_completion(habit.id, Some(date(2024, 1, 1)))
            .await
            .unwrap();
        tracker
            .toggle_completion(other.id, Some(date(2024, 1, 1)))
            .await
            .unwrap();

        tracker.delete_habit(habit.id).await.unwrap();

        // In-memory view reflects the cascade immediately
        assert_eq!(tracker.habits().len(), 1);
        assert_eq!(tracker.completions().len(), 1);
        assert_eq!(tracker.completions()[0].habit_id, other.id);

        tracker.flush().await;
        drop(tracker);

        // Durable view agrees after reopen
        let tracker = Tracker::open_with_config(config).unwrap();
        assert_eq!(tracker.habits().len(), 1);
        assert_eq!(tracker.completions().len(), 1);
        assert_eq!(tracker.completions()[0].habit_id, other.id);
    }

    #[tokio::test]
    async fn test_toggle_completion_defaults_to_selected_date() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        tracker.set_selected_date(date(2024, 3, 1)).unwrap();

        let completion = tracker.toggle_completion(habit.id, None).await.unwrap();
        assert_eq!(completion.date, date(2024, 3, 1));
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        let day = date(2024, 3, 1);

        let first = tracker.toggle_completion(habit.id, Some(day)).await.unwrap();
        assert!(first.completed);
        tracker.flush().await;

        let second = tracker.toggle_completion(habit.id, Some(day)).await.unwrap();
        assert!(!second.completed);
        tracker.flush().await;

        // Exactly one record for the pair, durably too
        assert_eq!(tracker.completions().len(), 1);
        let db = tracker.db.lock().await;
        assert_eq!(db.completion_count().unwrap(), 1);
        let stored = db.completion_for(habit.id, day).unwrap().unwrap();
        assert!(!stored.completed);
    }

    #[tokio::test]
    async fn test_concurrent_updates_same_habit_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        tracker.flush().await;

        // Hold the database lock so the first update cannot settle
        let db = Arc::clone(&tracker.db);
        let guard = db.lock().await;

        let mut edit = habit.clone();
        edit.set_name("First edit");
        tracker.update_habit(edit).await.unwrap();

        let mut racing = habit.clone();
        racing.set_name("Second edit");
        let err = tracker.update_habit(racing).await.unwrap_err();
        assert_eq!(err.code(), "OPERATION_IN_PROGRESS");

        drop(guard);
        tracker.flush().await;

        // Once settled the key is free again
        let mut later = tracker.habit(habit.id).unwrap().clone();
        later.set_name("Third edit");
        tracker.update_habit(later).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_write_keeps_optimistic_value_until_reload() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();
        let mut failures = tracker.take_failures().unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        tracker.flush().await;

        // Out-of-band delete makes the next durable update fail
        tracker.db.lock().await.delete_habit(habit.id).unwrap();

        let mut edit = habit.clone();
        edit.set_name("Doomed edit");
        tracker.update_habit(edit).await.unwrap();
        tracker.flush().await;

        let failure = failures.recv().await.unwrap();
        assert_eq!(failure.op_key, format!("update-habit-{}", habit.id));
        assert_eq!(failure.error.code(), "NOT_FOUND");

        // Optimistic value is still visible
        assert_eq!(tracker.habit(habit.id).unwrap().name, "Doomed edit");
        assert_eq!(
            tracker.write_status(&failure.op_key).await,
            Some(WriteStatus::Failed)
        );

        // Reconciliation brings observable state back to durable truth
        tracker.reload().await.unwrap();
        assert!(tracker.habit(habit.id).is_none());
    }

    #[tokio::test]
    async fn test_bulk_toggle_completions() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let first = tracker.add_habit(draft("One")).await.unwrap();
        let second = tracker.add_habit(draft("Two")).await.unwrap();
        let day = date(2024, 3, 1);

        let completions = tracker
            .bulk_toggle_completions(&[first.id, second.id], day, true)
            .await
            .unwrap();
        assert_eq!(completions.len(), 2);

        tracker.flush().await;
        let db = tracker.db.lock().await;
        assert_eq!(db.completion_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        tracker
            .toggle_completion(habit.id, Some(date(2024, 1, 1)))
            .await
            .unwrap();
        tracker.set_theme(Theme::Dark).await.unwrap();
        tracker.flush().await;

        let before = tracker.export_data().await.unwrap();
        let summary = tracker
            .import_data(&before.to_json().unwrap())
            .await
            .unwrap();
        assert_eq!(summary.habits, 1);
        assert_eq!(summary.completions, 1);

        let after = tracker.export_data().await.unwrap();
        assert_eq!(after.habits, before.habits);
        assert_eq!(after.completions, before.completions);
        assert_eq!(after.preferences, before.preferences);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_shape() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Keep me")).await.unwrap();
        tracker.flush().await;

        let err = tracker
            .import_data(r#"{"habits": []}"#)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_FORMAT");

        // Nothing was replaced
        assert_eq!(tracker.habits().len(), 1);
        assert_eq!(tracker.habit(habit.id).unwrap().name, "Keep me");
    }

    #[tokio::test]
    async fn test_stats() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        tracker
            .toggle_completion(habit.id, Some(date(2024, 1, 1)))
            .await
            .unwrap();
        tracker.set_theme(Theme::Dark).await.unwrap();
        tracker.flush().await;

        let stats = tracker.stats().await.unwrap();
        assert_eq!(stats.habit_count, 1);
        assert_eq!(stats.completion_count, 1);
        assert_eq!(stats.preference_count, 1);
        assert_eq!(stats.total_records, 3);
        assert!(stats.storage_used.is_some());
        assert!(stats.storage_quota.is_none());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        tracker.toggle_completion(habit.id, None).await.unwrap();
        tracker.flush().await;

        tracker.clear_all().await.unwrap();

        assert!(tracker.habits().is_empty());
        assert!(tracker.completions().is_empty());
        let db = tracker.db.lock().await;
        assert_eq!(db.habit_count().unwrap(), 0);
        assert_eq!(db.completion_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preferences_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        {
            let mut tracker = Tracker::open_with_config(config.clone()).unwrap();
            tracker.set_theme(Theme::Dark).await.unwrap();
            tracker
                .set_weekly_start_day(WeekStart::Sunday)
                .await
                .unwrap();
            tracker.set_view_mode(ViewMode::Weekly).unwrap();
            tracker.flush().await;
        }

        let tracker = Tracker::open_with_config(config).unwrap();
        assert_eq!(tracker.preferences().theme, Theme::Dark);
        assert_eq!(tracker.preferences().weekly_start_day, WeekStart::Sunday);
        assert_eq!(tracker.view().view_mode, ViewMode::Weekly);
    }

    #[tokio::test]
    async fn test_archived_habit_excluded_from_active() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Old")).await.unwrap();
        let updated = tracker.toggle_habit_archived(habit.id).await.unwrap();
        assert!(updated.archived);
        assert!(tracker.active_habits().is_empty());
        assert_eq!(tracker.habits().len(), 1);
    }

    #[tokio::test]
    async fn test_habit_streak_selector() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open_with_config(test_config(&temp_dir)).unwrap();

        let habit = tracker.add_habit(draft("Run")).await.unwrap();
        let today = today();
        tracker
            .toggle_completion(habit.id, Some(today - chrono::Duration::days(1)))
            .await
            .unwrap();
        tracker.toggle_completion(habit.id, Some(today)).await.unwrap();

        let streak = tracker.habit_streak(habit.id);
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 2);
    }
}
