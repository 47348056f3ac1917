//! Drains the mutation queue against the remote backend
//!
//! A drain is one sequential pass over the entries that have attempts left.
//! Each entry gets a single delivery attempt per pass; retries happen across
//! passes through the queue's attempt bookkeeping. A pass never fails as a
//! whole: per-entry failures are folded into the returned [`SyncReport`].

use std::sync::Arc;

use carelog_common::resilience::ClassifyFailure;
use carelog_domain::{Identity, OperationType, QueuedOperation, SyncFailure, SyncReport};
use tracing::{debug, info, instrument, warn};

use super::errors::RemoteError;
use super::ports::RemoteBackend;
use super::queue::MutationQueue;

/// Delivers queued mutations to the remote backend
pub struct SyncProcessor {
    queue: Arc<MutationQueue>,
    backend: Arc<dyn RemoteBackend>,
}

impl SyncProcessor {
    /// Create a processor for `queue`
    pub fn new(queue: Arc<MutationQueue>, backend: Arc<dyn RemoteBackend>) -> Self {
        Self { queue, backend }
    }

    /// Queue this processor drains
    pub fn queue(&self) -> &Arc<MutationQueue> {
        &self.queue
    }

    /// Run one drain pass.
    ///
    /// Returns `None` when another drain is already in flight. Without an
    /// identity the backend is not contacted and an empty report is returned.
    #[instrument(skip_all, fields(user_id = identity.map(|i| i.user_id.as_str())))]
    pub async fn drain(&self, identity: Option<&Identity>) -> Option<SyncReport> {
        let Some(identity) = identity else {
            debug!("drain skipped: no identity");
            return Some(SyncReport::default());
        };

        let Some(_guard) = self.queue.try_begin_drain() else {
            debug!("drain skipped: another drain is in flight");
            return None;
        };

        let pending = self.queue.pending_operations().await;
        if pending.is_empty() {
            return Some(SyncReport::default());
        }

        info!(count = pending.len(), "draining mutation queue");
        let mut report = SyncReport::default();

        for op in pending {
            match self.deliver(identity, &op).await {
                Ok(()) => {
                    self.queue.remove(op.id).await;
                    report.success += 1;
                    debug!(operation_id = %op.id, entity = %op.entity, "mutation delivered");
                }
                Err(err) => {
                    report.failed += 1;
                    self.handle_failure(&op, &err, &mut report).await;
                }
            }
        }

        info!(
            success = report.success,
            failed = report.failed,
            flagged = report.errors.len(),
            "drain pass complete"
        );
        Some(report)
    }

    async fn deliver(&self, identity: &Identity, op: &QueuedOperation) -> Result<(), RemoteError> {
        let target = op.entity_ref();
        match op.op_type {
            OperationType::Add => self.backend.add(identity, &target, &op.payload).await,
            OperationType::Update => self.backend.update(identity, &target, &op.payload).await,
            OperationType::Delete => self.backend.delete(identity, &target).await,
        }
    }

    async fn handle_failure(&self, op: &QueuedOperation, err: &RemoteError, report: &mut SyncReport) {
        let class = err.failure_class();
        let message = err.to_string();
        let fatal = !class.is_retryable();

        let Some(updated) = self.queue.record_failure(op.id, &message, fatal).await else {
            debug!(operation_id = %op.id, "entry removed during drain");
            return;
        };

        warn!(
            operation_id = %op.id,
            entity = %op.entity,
            op_type = %op.op_type,
            attempts = updated.attempts,
            class = %class,
            error = %message,
            "mutation delivery failed"
        );

        if self.queue.is_failed(&updated) {
            report.errors.push(SyncFailure {
                operation_id: updated.id,
                op_type: updated.op_type,
                entity: updated.entity,
                entity_id: updated.entity_id,
                message,
            });
        }
    }
}
