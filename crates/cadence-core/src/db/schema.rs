//! SQLite schema and migrations
//!
//! The database holds three tables: `habits`, `completions`, and
//! `preferences`. Schema changes are applied as stepwise migrations
//! tracked through a version row in `schema_info`; each step runs once
//! and is safe to re-apply.

use rusqlite::Connection;

use crate::error::StoreResult;

/// Current schema version
///
/// Increment when adding a migration step.
pub const SCHEMA_VERSION: i32 = 3;

/// Initialize or upgrade the database schema
///
/// Runs every migration step newer than the stored version, then records
/// the current version.
pub fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;

    let from_version = get_schema_version(conn)?.unwrap_or(0);
    run_migrations(conn, from_version)?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the schema version recorded in the database
pub fn get_schema_version(conn: &Connection) -> StoreResult<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String, _> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Check if the schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}

fn run_migrations(conn: &Connection, from_version: i32) -> StoreResult<()> {
    if from_version < 1 {
        migration_v1(conn)?;
    }
    if from_version < 2 {
        migration_v2(conn)?;
    }
    if from_version < 3 {
        migration_v3(conn)?;
    }
    Ok(())
}

/// v1: the three base tables and their indexes
fn migration_v1(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS habits (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            color TEXT NOT NULL,
            icon TEXT NOT NULL,
            goal INTEGER NOT NULL,
            schedule TEXT NOT NULL,
            category TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            archived INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS completions (
            id TEXT PRIMARY KEY,
            habit_id TEXT NOT NULL,
            date TEXT NOT NULL,
            completed INTEGER NOT NULL,
            value REAL,
            notes TEXT,
            timestamp INTEGER NOT NULL,
            UNIQUE (habit_id, date)
        );

        CREATE TABLE IF NOT EXISTS preferences (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );

        -- Query completions by day and by habit
        CREATE INDEX IF NOT EXISTS idx_completions_date ON completions(date);
        CREATE INDEX IF NOT EXISTS idx_completions_habit_id ON completions(habit_id);

        -- Query habits by state and creation order
        CREATE INDEX IF NOT EXISTS idx_habits_archived ON habits(archived);
        CREATE INDEX IF NOT EXISTS idx_habits_created_at ON habits(created_at);
        "#,
    )?;
    Ok(())
}

/// v2: tags column, backfilled so every habit has an array
fn migration_v2(conn: &Connection) -> StoreResult<()> {
    if !has_column(conn, "habits", "tags")? {
        conn.execute_batch("ALTER TABLE habits ADD COLUMN tags TEXT NOT NULL DEFAULT '[]';")?;
    }
    conn.execute(
        "UPDATE habits SET tags = '[]' WHERE tags IS NULL OR tags = ''",
        [],
    )?;
    Ok(())
}

/// v3: composite index used by streak queries
fn migration_v3(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_completions_habit_date ON completions(habit_id, date);",
    )?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}
