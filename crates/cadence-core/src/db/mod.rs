//! Durable document store
//!
//! SQLite-backed storage for the three collections. The database is the
//! single source of truth for habits, completions, and preferences; the
//! in-memory state store is a cache kept consistent through the mutation
//! layer.
//!
//! ## Guarantees
//!
//! - `insert_*` fails with a duplicate-key error on id collision, and on
//!   a second completion for the same `(habit_id, date)` pair.
//! - `update_*`/`delete_*` fail with not-found on a missing id.
//! - Habit deletion cascades to the habit's completions inside one
//!   transaction; readers never observe a partial cascade.
//! - Bulk operations run in a single transaction.

pub mod schema;

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Completion, Habit, Schedule, UserPreferences};

/// Row id for the preferences singleton
const PREFERENCES_ID: &str = "default";

/// SQLite-backed store for habits, completions, and preferences
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the given path
    ///
    /// Runs any pending schema migrations.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if schema::needs_init(&conn) {
            schema::init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    // ==================== Habit Operations ====================

    /// Insert a new habit
    pub fn insert_habit(&mut self, habit: &Habit) -> StoreResult<()> {
        if self.get_habit(habit.id)?.is_some() {
            return Err(StoreError::duplicate("habit", habit.id));
        }
        let tx = self.conn.transaction()?;
        insert_habit_row(&tx, habit)?;
        tx.commit()?;
        debug!(habit_id = %habit.id, "inserted habit");
        Ok(())
    }

    /// Replace an existing habit
    pub fn update_habit(&mut self, habit: &Habit) -> StoreResult<()> {
        let rows = update_habit_row(&self.conn, habit)?;
        if rows == 0 {
            return Err(StoreError::not_found("habit", habit.id));
        }
        Ok(())
    }

    /// Delete a habit and all of its completions in one transaction
    pub fn delete_habit(&mut self, id: Uuid) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let rows = tx.execute("DELETE FROM habits WHERE id = ?", params![id.to_string()])?;
        if rows == 0 {
            return Err(StoreError::not_found("habit", id));
        }
        let removed = tx.execute(
            "DELETE FROM completions WHERE habit_id = ?",
            params![id.to_string()],
        )?;
        tx.commit()?;
        debug!(habit_id = %id, completions = removed, "deleted habit with cascade");
        Ok(())
    }

    /// Get a habit by id
    pub fn get_habit(&self, id: Uuid) -> StoreResult<Option<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM habits WHERE id = ?",
            HABIT_COLUMNS
        ))?;
        let habit = stmt
            .query_row(params![id.to_string()], row_to_habit)
            .optional()?;
        Ok(habit)
    }

    /// Get all habits in creation order
    pub fn list_habits(&self) -> StoreResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM habits ORDER BY created_at, id",
            HABIT_COLUMNS
        ))?;
        let habits = stmt
            .query_map([], row_to_habit)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(habits)
    }

    /// Insert many habits in one transaction
    pub fn bulk_insert_habits(&mut self, habits: &[Habit]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        for habit in habits {
            insert_habit_row(&tx, habit)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Replace many habits in one transaction
    ///
    /// A missing id aborts the whole batch.
    pub fn bulk_update_habits(&mut self, habits: &[Habit]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        for habit in habits {
            let rows = update_habit_row(&tx, habit)?;
            if rows == 0 {
                return Err(StoreError::not_found("habit", habit.id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Get count of habits
    pub fn habit_count(&self) -> StoreResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM habits", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== Completion Operations ====================

    /// Insert a new completion
    ///
    /// Fails when the id or the `(habit_id, date)` pair already exists.
    pub fn insert_completion(&mut self, completion: &Completion) -> StoreResult<()> {
        if self.get_completion(completion.id)?.is_some() {
            return Err(StoreError::duplicate("completion", completion.id));
        }
        if self
            .completion_for(completion.habit_id, completion.date)?
            .is_some()
        {
            return Err(StoreError::duplicate(
                "completion",
                format!("{}@{}", completion.habit_id, completion.date),
            ));
        }
        let tx = self.conn.transaction()?;
        insert_completion_row(&tx, completion)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace an existing completion
    pub fn update_completion(&mut self, completion: &Completion) -> StoreResult<()> {
        let rows = update_completion_row(&self.conn, completion)?;
        if rows == 0 {
            return Err(StoreError::not_found("completion", completion.id));
        }
        Ok(())
    }

    /// Insert or replace the completion for its `(habit_id, date)` pair
    pub fn upsert_completion(&mut self, completion: &Completion) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        upsert_completion_row(&tx, completion)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a completion by id
    pub fn delete_completion(&mut self, id: Uuid) -> StoreResult<()> {
        let rows = self.conn.execute(
            "DELETE FROM completions WHERE id = ?",
            params![id.to_string()],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("completion", id));
        }
        Ok(())
    }

    /// Get a completion by id
    pub fn get_completion(&self, id: Uuid) -> StoreResult<Option<Completion>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM completions WHERE id = ?",
            COMPLETION_COLUMNS
        ))?;
        let completion = stmt
            .query_row(params![id.to_string()], row_to_completion)
            .optional()?;
        Ok(completion)
    }

    /// Composite lookup by `(habit_id, date)`
    pub fn completion_for(
        &self,
        habit_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<Completion>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM completions WHERE habit_id = ? AND date = ?",
            COMPLETION_COLUMNS
        ))?;
        let completion = stmt
            .query_row(
                params![habit_id.to_string(), date.to_string()],
                row_to_completion,
            )
            .optional()?;
        Ok(completion)
    }

    /// Get completions, optionally restricted to one date
    pub fn list_completions(&self, date: Option<NaiveDate>) -> StoreResult<Vec<Completion>> {
        let completions = match date {
            Some(date) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM completions WHERE date = ? ORDER BY date, habit_id",
                    COMPLETION_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![date.to_string()], row_to_completion)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM completions ORDER BY date, habit_id",
                    COMPLETION_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], row_to_completion)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(completions)
    }

    /// Insert many completions in one transaction
    pub fn bulk_insert_completions(&mut self, completions: &[Completion]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        for completion in completions {
            insert_completion_row(&tx, completion)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Upsert many completions in one transaction
    pub fn bulk_upsert_completions(&mut self, completions: &[Completion]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        for completion in completions {
            upsert_completion_row(&tx, completion)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Get count of completions
    pub fn completion_count(&self) -> StoreResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM completions", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== Preferences ====================

    /// Get the preferences singleton
    pub fn get_preferences(&self) -> StoreResult<Option<UserPreferences>> {
        let mut stmt = self.conn.prepare("SELECT data FROM preferences WHERE id = ?")?;
        let data: Option<String> = stmt
            .query_row(params![PREFERENCES_ID], |row| row.get(0))
            .optional()?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Store the preferences singleton
    pub fn put_preferences(&mut self, prefs: &UserPreferences) -> StoreResult<()> {
        let json = serde_json::to_string(prefs)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO preferences (id, data) VALUES (?, ?)",
            params![PREFERENCES_ID, json],
        )?;
        Ok(())
    }

    /// Get count of preference records
    pub fn preference_count(&self) -> StoreResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM preferences", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== Maintenance ====================

    /// Empty all three collections in one transaction
    pub fn clear_all(&mut self) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM completions", [])?;
        tx.execute("DELETE FROM habits", [])?;
        tx.execute("DELETE FROM preferences", [])?;
        tx.commit()?;
        debug!("cleared all collections");
        Ok(())
    }

    /// Atomically replace all three collections (the import path)
    ///
    /// Clear-then-bulk-insert inside a single transaction; a failure
    /// leaves the previous contents intact.
    pub fn replace_all(
        &mut self,
        habits: &[Habit],
        completions: &[Completion],
        preferences: &[UserPreferences],
    ) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM completions", [])?;
        tx.execute("DELETE FROM habits", [])?;
        tx.execute("DELETE FROM preferences", [])?;
        for habit in habits {
            insert_habit_row(&tx, habit)?;
        }
        for completion in completions {
            insert_completion_row(&tx, completion)?;
        }
        if let Some(prefs) = preferences.first() {
            let json = serde_json::to_string(prefs)?;
            tx.execute(
                "INSERT OR REPLACE INTO preferences (id, data) VALUES (?, ?)",
                params![PREFERENCES_ID, json],
            )?;
        }
        tx.commit()?;
        debug!(
            habits = habits.len(),
            completions = completions.len(),
            "replaced all collections"
        );
        Ok(())
    }
}

const HABIT_COLUMNS: &str =
    "id, name, description, color, icon, goal, schedule, category, tags, created_at, updated_at, archived";

const COMPLETION_COLUMNS: &str = "id, habit_id, date, completed, value, notes, timestamp";

fn insert_habit_row(conn: &Connection, habit: &Habit) -> StoreResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO habits ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            HABIT_COLUMNS
        ),
        params![
            habit.id.to_string(),
            habit.name,
            habit.description,
            habit.color,
            habit.icon,
            habit.goal,
            serde_json::to_string(&habit.schedule)?,
            habit.category,
            serde_json::to_string(&habit.tags)?,
            habit.created_at.timestamp(),
            habit.updated_at.timestamp(),
            habit.archived,
        ],
    )?;
    Ok(())
}

fn update_habit_row(conn: &Connection, habit: &Habit) -> StoreResult<usize> {
    let rows = conn.execute(
        "UPDATE habits SET name = ?, description = ?, color = ?, icon = ?, goal = ?,
         schedule = ?, category = ?, tags = ?, created_at = ?, updated_at = ?, archived = ?
         WHERE id = ?",
        params![
            habit.name,
            habit.description,
            habit.color,
            habit.icon,
            habit.goal,
            serde_json::to_string(&habit.schedule)?,
            habit.category,
            serde_json::to_string(&habit.tags)?,
            habit.created_at.timestamp(),
            habit.updated_at.timestamp(),
            habit.archived,
            habit.id.to_string(),
        ],
    )?;
    Ok(rows)
}

fn insert_completion_row(conn: &Connection, completion: &Completion) -> StoreResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO completions ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
            COMPLETION_COLUMNS
        ),
        params![
            completion.id.to_string(),
            completion.habit_id.to_string(),
            completion.date.to_string(),
            completion.completed,
            completion.value,
            completion.notes,
            completion.timestamp.timestamp(),
        ],
    )?;
    Ok(())
}

fn update_completion_row(conn: &Connection, completion: &Completion) -> StoreResult<usize> {
    let rows = conn.execute(
        "UPDATE completions SET habit_id = ?, date = ?, completed = ?, value = ?,
         notes = ?, timestamp = ? WHERE id = ?",
        params![
            completion.habit_id.to_string(),
            completion.date.to_string(),
            completion.completed,
            completion.value,
            completion.notes,
            completion.timestamp.timestamp(),
            completion.id.to_string(),
        ],
    )?;
    Ok(rows)
}

fn upsert_completion_row(conn: &Connection, completion: &Completion) -> StoreResult<()> {
    // Keyed on the (habit_id, date) pair so a toggle after an optimistic
    // create lands on the same row
    conn.execute(
        "DELETE FROM completions WHERE habit_id = ? AND date = ?",
        params![
            completion.habit_id.to_string(),
            completion.date.to_string()
        ],
    )?;
    insert_completion_row(conn, completion)
}

fn row_to_habit(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let schedule_json: String = row.get(6)?;
    let schedule: Schedule = serde_json::from_str(&schedule_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    let tags_json: String = row.get(8)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(Habit {
        id: parse_uuid(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
        goal: row.get(5)?,
        schedule,
        category: row.get(7)?,
        tags,
        created_at: parse_timestamp(row, 9)?,
        updated_at: parse_timestamp(row, 10)?,
        archived: row.get(11)?,
    })
}

fn row_to_completion(row: &Row<'_>) -> rusqlite::Result<Completion> {
    let date_str: String = row.get(2)?;
    let date = date_str
        .parse::<NaiveDate>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(Completion {
        id: parse_uuid(row, 0)?,
        habit_id: parse_uuid(row, 1)?,
        date,
        completed: row.get(3)?,
        value: row.get(4)?,
        notes: row.get(5)?,
        timestamp: parse_timestamp(row, 6)?,
    })
}

fn parse_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {}", secs).into(),
        )
    })
}
