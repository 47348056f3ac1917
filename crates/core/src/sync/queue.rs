//! Durable queue of pending mutations
//!
//! Entries live in memory behind a `tokio::sync::Mutex` and the whole queue
//! is re-serialized under [`QUEUE_STORAGE_KEY`] after every change. Storage
//! failures are logged and never surface to callers: the in-memory queue
//! stays authoritative for the session.
//!
//! Entries are never de-duplicated and drain in insertion order. An entry
//! whose attempt count reaches the limit stays in the queue, flagged failed,
//! until it is cleared, retried or aged out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use carelog_common::testing::Clock;
use carelog_domain::constants::{MAX_SYNC_ATTEMPTS, QUEUE_STORAGE_KEY};
use carelog_domain::{NewOperation, PriorityCount, QueueStatus, QueuedOperation};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::storage::{load_json, save_json, LocalStore};

/// Durable, insertion-ordered mutation queue
pub struct MutationQueue {
    entries: Mutex<Vec<QueuedOperation>>,
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
    draining: AtomicBool,
    max_attempts: u32,
}

/// Held for the duration of a drain; releases the in-flight flag on drop.
#[must_use = "the drain flag is released as soon as the guard is dropped"]
pub struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl MutationQueue {
    /// Load the queue persisted in `store`.
    ///
    /// A missing key yields an empty queue. Unreadable or malformed content
    /// also yields an empty queue, with a warning.
    pub async fn load(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        let entries = match load_json::<Vec<QueuedOperation>>(store.as_ref(), QUEUE_STORAGE_KEY)
            .await
        {
            Ok(Some(entries)) => {
                info!(count = entries.len(), "loaded persisted mutation queue");
                entries
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "persisted mutation queue is unreadable, starting empty");
                Vec::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            store,
            clock,
            draining: AtomicBool::new(false),
            max_attempts: MAX_SYNC_ATTEMPTS,
        }
    }

    /// Override the attempt limit (default 3).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Attempt limit in effect
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// True when `op` has used all of its attempts
    pub const fn is_failed(&self, op: &QueuedOperation) -> bool {
        op.attempts >= self.max_attempts
    }

    /// Append a mutation and persist. Returns the new entry's id.
    #[instrument(skip(self, op), fields(entity = %op.entity, op_type = %op.op_type))]
    pub async fn enqueue(&self, op: NewOperation) -> Uuid {
        let entry = QueuedOperation::from_new(op, self.clock.now_utc());
        let id = entry.id;

        let mut entries = self.entries.lock().await;
        entries.push(entry);
        self.persist(&entries).await;

        debug!(operation_id = %id, queued = entries.len(), "mutation enqueued");
        id
    }

    /// Remove one entry. Returns false when no entry has that id.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if removed {
            self.persist(&entries).await;
        }
        removed
    }

    /// Delete every failed entry. Returns how many were removed.
    #[instrument(skip(self))]
    pub async fn clear_failed(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| !self.is_failed(entry));
        let cleared = before - entries.len();
        if cleared > 0 {
            self.persist(&entries).await;
            info!(cleared, "cleared failed mutations");
        }
        cleared
    }

    /// Give every failed entry a fresh set of attempts. Returns how many were
    /// reset.
    #[instrument(skip(self))]
    pub async fn retry_failed(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let mut reset = 0;
        for entry in entries.iter_mut().filter(|entry| entry.attempts >= self.max_attempts) {
            entry.attempts = 0;
            entry.last_error = None;
            reset += 1;
        }
        if reset > 0 {
            self.persist(&entries).await;
            info!(reset, "failed mutations reset for retry");
        }
        reset
    }

    /// Drop entries enqueued before `now - max_age`, failed or not.
    #[instrument(skip(self))]
    pub async fn cleanup_older_than(&self, max_age: chrono::Duration) -> usize {
        let cutoff = self.clock.now_utc() - max_age;
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| entry.enqueued_at >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            self.persist(&entries).await;
            info!(removed, cutoff = %cutoff, "expired mutations removed");
        }
        removed
    }

    /// Counts by state and priority
    pub async fn status(&self) -> QueueStatus {
        let entries = self.entries.lock().await;
        let mut priority_count = PriorityCount::default();
        let mut failed = 0;
        let mut oldest: Option<DateTime<Utc>> = None;

        for entry in entries.iter() {
            priority_count.record(entry.priority);
            if self.is_failed(entry) {
                failed += 1;
            }
            oldest = Some(oldest.map_or(entry.enqueued_at, |o| o.min(entry.enqueued_at)));
        }

        QueueStatus {
            total: entries.len(),
            pending: entries.len() - failed,
            failed,
            is_processing: self.is_processing(),
            priority_count,
            oldest_operation: oldest,
        }
    }

    /// Copy of every entry, in drain order
    pub async fn operations(&self) -> Vec<QueuedOperation> {
        self.entries.lock().await.clone()
    }

    /// Copy of entries still eligible for a drain
    pub async fn pending_operations(&self) -> Vec<QueuedOperation> {
        self.entries.lock().await.iter().filter(|e| !self.is_failed(e)).cloned().collect()
    }

    /// Copy of failed entries
    pub async fn failed_operations(&self) -> Vec<QueuedOperation> {
        self.entries.lock().await.iter().filter(|e| self.is_failed(e)).cloned().collect()
    }

    /// Number of entries
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True when nothing is queued
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// True while a drain holds the in-flight flag
    pub fn is_processing(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Take the in-flight flag. `None` when another drain already holds it.
    pub fn try_begin_drain(&self) -> Option<DrainGuard<'_>> {
        self.draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DrainGuard { flag: &self.draining })
    }

    /// Record a failed delivery attempt.
    ///
    /// Bumps `attempts`, stamps `last_attempt_at` and `last_error`. A fatal
    /// failure raises `attempts` straight to the limit. Returns the updated
    /// entry, or `None` if it was removed in the meantime.
    pub async fn record_failure(
        &self,
        id: Uuid,
        message: &str,
        fatal: bool,
    ) -> Option<QueuedOperation> {
        let now = self.clock.now_utc();
        let mut entries = self.entries.lock().await;
        let entry = entries.iter_mut().find(|entry| entry.id == id)?;

        entry.attempts = entry.attempts.saturating_add(1);
        if fatal {
            entry.attempts = entry.attempts.max(self.max_attempts);
        }
        entry.last_attempt_at = Some(now);
        entry.last_error = Some(message.to_string());
        let updated = entry.clone();

        self.persist(&entries).await;
        Some(updated)
    }

    async fn persist(&self, entries: &[QueuedOperation]) {
        if let Err(err) = save_json(self.store.as_ref(), QUEUE_STORAGE_KEY, &entries).await {
            warn!(error = %err, count = entries.len(), "failed to persist mutation queue");
        }
    }
}
