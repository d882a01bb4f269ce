//! Optimistic write-through layer
//!
//! Mutations are reflected in observable state immediately; the durable
//! write runs as a spawned task against the shared database. Each
//! mutation carries an operation key derived from its kind and target,
//! and a second mutation sharing an in-flight key is rejected rather than
//! interleaved.
//!
//! On write failure the optimistic value is not retracted here: the key's
//! status becomes `Failed` and the error is delivered on the failure
//! channel, leaving reconciliation to the caller (see `Tracker::reload`).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Database shared between the action layer and spawned writes
pub type SharedDb = Arc<Mutex<Database>>;

/// Durable-write status of one operation key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The write has been enqueued but has not settled
    Pending,
    /// The write settled successfully; the optimistic value was correct
    Confirmed,
    /// The write failed; observable state may differ from durable truth
    Failed,
}

/// A durable write that failed after its optimistic value was published
#[derive(Debug)]
pub struct MutationFailure {
    pub op_key: String,
    pub error: StoreError,
}

/// Ticket proving an operation key has been claimed
///
/// Obtained from [`OptimisticWriter::begin`] and consumed by
/// [`OptimisticWriter::commit`] or [`OptimisticWriter::abort`].
#[derive(Debug)]
pub struct OpTicket {
    key: String,
}

impl OpTicket {
    /// The operation key this ticket holds
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Write-through coordinator for optimistic mutations
pub struct OptimisticWriter {
    db: SharedDb,
    in_flight: Arc<Mutex<HashSet<String>>>,
    statuses: Arc<Mutex<HashMap<String, WriteStatus>>>,
    failure_tx: mpsc::UnboundedSender<MutationFailure>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl OptimisticWriter {
    /// Create a writer over the shared database
    ///
    /// Returns the writer and the receiving end of the failure channel.
    pub fn new(db: SharedDb) -> (Self, mpsc::UnboundedReceiver<MutationFailure>) {
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        let writer = Self {
            db,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            statuses: Arc::new(Mutex::new(HashMap::new())),
            failure_tx,
            tasks: Arc::new(Mutex::new(Vec::new())),
        };
        (writer, failure_rx)
    }

    /// Claim an operation key
    ///
    /// Fails with `OperationInProgress` while a mutation with the same
    /// key has not settled.
    pub async fn begin(&self, key: impl Into<String>) -> StoreResult<OpTicket> {
        let key = key.into();
        let mut in_flight = self.in_flight.lock().await;
        if !in_flight.insert(key.clone()) {
            return Err(StoreError::OperationInProgress { key });
        }
        self.statuses
            .lock()
            .await
            .insert(key.clone(), WriteStatus::Pending);
        Ok(OpTicket { key })
    }

    /// Release a claimed key without writing
    ///
    /// Used when the in-memory apply fails after the key was claimed.
    pub async fn abort(&self, ticket: OpTicket) {
        self.in_flight.lock().await.remove(&ticket.key);
        self.statuses.lock().await.remove(&ticket.key);
    }

    /// Enqueue the durable write for a claimed key
    ///
    /// The write runs on a spawned task; this call returns immediately.
    /// On success the pending marker clears with no further state change.
    /// On failure the key's status becomes `Failed` and a
    /// [`MutationFailure`] is sent on the failure channel.
    pub async fn commit<F>(&self, ticket: OpTicket, write: F)
    where
        F: FnOnce(&mut Database) -> StoreResult<()> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let in_flight = Arc::clone(&self.in_flight);
        let statuses = Arc::clone(&self.statuses);
        let failure_tx = self.failure_tx.clone();

        let handle = tokio::spawn(async move {
            let result = {
                let mut db = db.lock().await;
                write(&mut db)
            };
            in_flight.lock().await.remove(&ticket.key);
            match result {
                Ok(()) => {
                    statuses
                        .lock()
                        .await
                        .insert(ticket.key.clone(), WriteStatus::Confirmed);
                    debug!(op_key = %ticket.key, "durable write confirmed");
                }
                Err(error) => {
                    warn!(op_key = %ticket.key, %error, "durable write failed");
                    statuses
                        .lock()
                        .await
                        .insert(ticket.key.clone(), WriteStatus::Failed);
                    let _ = failure_tx.send(MutationFailure {
                        op_key: ticket.key,
                        error,
                    });
                }
            }
        });

        self.tasks.lock().await.push(handle);
    }

    /// Last known status for an operation key
    pub async fn status(&self, key: &str) -> Option<WriteStatus> {
        self.statuses.lock().await.get(key).copied()
    }

    /// Await every outstanding durable write
    pub async fn flush(&self) {
        loop {
            let drained: Vec<JoinHandle<()>> = {
                let mut tasks = self.tasks.lock().await;
                tasks.drain(..).collect()
            };
            if drained.is_empty() {
                return;
            }
            for handle in drained {
                let _ = handle.await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Habit, HabitDraft};

    fn shared_db() -> SharedDb {
        Arc::new(Mutex::new(Database::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_begin_rejects_duplicate_key() {
        let (writer, _rx) = OptimisticWriter::new(shared_db());

        let ticket = writer.begin("update-habit-1").await.unwrap();
        let err = writer.begin("update-habit-1").await.unwrap_err();
        assert_eq!(err.code(), "OPERATION_IN_PROGRESS");

        // A different key is unaffected
        let other = writer.begin("update-habit-2").await.unwrap();
        writer.abort(other).await;
        writer.abort(ticket).await;
    }

    #[tokio::test]
    async fn test_key_free_after_commit_settles() {
        let (writer, _rx) = OptimisticWriter::new(shared_db());
        let habit = Habit::new(HabitDraft::new("Run", "🏃"));

        let ticket = writer.begin("add-habit-1").await.unwrap();
        let h = habit.clone();
        writer.commit(ticket, move |db| db.insert_habit(&h)).await;
        writer.flush().await;

        assert_eq!(
            writer.status("add-habit-1").await,
            Some(WriteStatus::Confirmed)
        );
        // The key can be claimed again
        let ticket = writer.begin("add-habit-1").await.unwrap();
        writer.abort(ticket).await;
    }

    #[tokio::test]
    async fn test_failed_write_reports_on_channel() {
        let db = shared_db();
        let (writer, mut rx) = OptimisticWriter::new(Arc::clone(&db));
        let habit = Habit::new(HabitDraft::new("Run", "🏃"));

        db.lock().await.insert_habit(&habit).unwrap();

        // Inserting the same id again fails durably
        let ticket = writer.begin(format!("add-habit-{}", habit.id)).await.unwrap();
        let h = habit.clone();
        writer.commit(ticket, move |db| db.insert_habit(&h)).await;
        writer.flush().await;

        let failure = rx.recv().await.unwrap();
        assert_eq!(failure.op_key, format!("add-habit-{}", habit.id));
        assert_eq!(failure.error.code(), "DUPLICATE_KEY");
        assert_eq!(
            writer.status(&failure.op_key).await,
            Some(WriteStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_abort_releases_key() {
        let (writer, _rx) = OptimisticWriter::new(shared_db());

        let ticket = writer.begin("delete-habit-1").await.unwrap();
        writer.abort(ticket).await;

        assert!(writer.begin("delete-habit-1").await.is_ok());
        assert_eq!(writer.status("delete-habit-1").await, Some(WriteStatus::Pending));
    }

    #[tokio::test]
    async fn test_concurrent_writes_on_different_keys() {
        let (writer, _rx) = OptimisticWriter::new(shared_db());
        let first = Habit::new(HabitDraft::new("One", "1"));
        let second = Habit::new(HabitDraft::new("Two", "2"));

        let t1 = writer.begin(format!("add-habit-{}", first.id)).await.unwrap();
        let t2 = writer.begin(format!("add-habit-{}", second.id)).await.unwrap();

        let h1 = first.clone();
        let h2 = second.clone();
        writer.commit(t1, move |db| db.insert_habit(&h1)).await;
        writer.commit(t2, move |db| db.insert_habit(&h2)).await;
        writer.flush().await;

        let db = writer.db.lock().await;
        assert_eq!(db.habit_count().unwrap(), 2);
    }
}
