//! Cadence Core Library
//!
//! This crate provides the core functionality for Cadence, a local-first
//! habit tracker: habits with weekly schedules and goals, daily
//! completions, and derived analytics (streaks, completion rates, weekly
//! goal progress).
//!
//! # Architecture
//!
//! - **SQLite**: durable source of truth for habits, completions, and
//!   preferences, with versioned schema migrations
//! - **State store**: an observable in-memory cache with per-slice change
//!   notification; analytics are recomputed synchronously after every
//!   mutation
//! - **Optimistic writer**: mutations are visible immediately, persisted
//!   in the background, and serialized per entity by operation keys
//!
//! # Quick Start
//!
//! ```text
//! let mut tracker = Tracker::open()?;
//!
//! // Add a habit
//! let habit = tracker.add_habit(HabitDraft::new("Meditate", "🧘")).await?;
//!
//! // Mark it done today
//! tracker.toggle_completion(habit.id, None).await?;
//!
//! // Read derived metrics
//! let analytics = tracker.analytics();
//! ```
//!
//! # Modules
//!
//! - `tracker`: unified tracker interface (main entry point)
//! - `models`: data structures for habits, completions, and preferences
//! - `state`: observable state store with derived analytics
//! - `analytics`: pure streak/rate/progress computation
//! - `db`: SQLite persistence and migrations
//! - `optimistic`: write-through layer with operation-key guards
//! - `transfer`: import/export and store statistics
//! - `session`: persisted preferences + view state
//! - `config`: application configuration

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod optimistic;
pub mod session;
pub mod state;
pub mod tracker;
pub mod transfer;
pub mod validate;

pub use analytics::{compute_analytics, habit_streak, DayProgress, Streak};
pub use config::Config;
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use models::{
    Analytics, Completion, Habit, HabitDraft, NotificationSettings, Schedule, Theme,
    UserPreferences, ViewMode, WeekStart,
};
pub use optimistic::{MutationFailure, OptimisticWriter, WriteStatus};
pub use session::Session;
pub use state::{Slice, StateStore, ViewState};
pub use tracker::Tracker;
pub use transfer::{ExportDocument, ImportSummary, StoreStats, EXPORT_VERSION};
