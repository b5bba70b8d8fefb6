//! Fire-and-forget validation requests.
//!
//! Callers enqueue a [`ValidationJob`] and return immediately; a single background
//! task drains the channel in FIFO order and runs the internal heuristic against
//! the shared store, one job at a time.
//! Failures are logged and never reach the caller.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::internal::InternalHeuristic;
use super::lifecycle::run_validation;
use crate::db::{with_db, SharedDb};

/// A request to score one memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationJob {
    pub memory_id: i64,
    pub validator: String,
    /// Logged only; the verdict is still persisted.
    pub simulate: bool,
}

impl ValidationJob {
    pub fn new(memory_id: i64, validator: impl Into<String>) -> Self {
        Self {
            memory_id,
            validator: validator.into(),
            simulate: false,
        }
    }
}

/// Sending half of the validation channel.
#[derive(Debug, Clone)]
pub struct ValidationQueue {
    tx: UnboundedSender<ValidationJob>,
}

impl ValidationQueue {
    pub fn channel() -> (Self, UnboundedReceiver<ValidationJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, job: ValidationJob) -> Result<()> {
        tracing::debug!(memory_id = job.memory_id, validator = %job.validator, "validation enqueued");
        self.tx
            .send(job)
            .map_err(|_| anyhow!("validation worker is not running"))
    }
}

/// Process one job against an open connection, logging instead of failing.
fn process(conn: &mut Connection, job: &ValidationJob) {
    if job.simulate {
        tracing::info!(memory_id = job.memory_id, "simulated validation requested");
    }
    if let Err(e) = run_validation(conn, job.memory_id, &job.validator, &InternalHeuristic) {
        tracing::error!(
            memory_id = job.memory_id,
            validator = %job.validator,
            "background validation failed: {e:#}"
        );
    }
}

/// Spawn the task that drains `rx` until every sender is dropped. The next job is
/// received only after the previous one has finished.
pub fn spawn_validation_worker(
    db: SharedDb,
    mut rx: UnboundedReceiver<ValidationJob>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let result = with_db(&db, move |conn| {
                process(conn, &job);
                Ok(())
            })
            .await;
            if let Err(e) = result {
                tracing::error!("validation task failed: {e:#}");
            }
        }
        tracing::debug!("validation worker stopped");
    })
}

/// Run every job already queued, synchronously. Returns how many were processed.
pub fn drain_pending(conn: &mut Connection, rx: &mut UnboundedReceiver<ValidationJob>) -> usize {
    let mut processed = 0;
    while let Ok(job) = rx.try_recv() {
        process(conn, &job);
        processed += 1;
    }
    processed
}
