//! Mutation queue records and the reports derived from them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::impl_wire_name_conversions;

/// Kind of mutation applied to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Add,
    Update,
    Delete,
}

impl_wire_name_conversions!(OperationType {
    Add => "add",
    Update => "update",
    Delete => "delete",
});

/// Entity collection a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Log,
    Profile,
    Appointment,
    Reminder,
    Inventory,
}

impl_wire_name_conversions!(EntityKind {
    Log => "log",
    Profile => "profile",
    Appointment => "appointment",
    Reminder => "reminder",
    Inventory => "inventory",
});

impl EntityKind {
    /// Plural collection name used by remote endpoints.
    pub const fn collection(&self) -> &'static str {
        match self {
            Self::Log => "logs",
            Self::Profile => "profiles",
            Self::Appointment => "appointments",
            Self::Reminder => "reminders",
            Self::Inventory => "inventories",
        }
    }
}

/// Informational priority. Drain order is always insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl_wire_name_conversions!(Priority {
    High => "high",
    Medium => "medium",
    Low => "low",
});

/// Address of a single remote entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub kind: EntityKind,
    /// Owning profile, when the entity is profile-scoped.
    pub scope_id: Option<String>,
    pub entity_id: String,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope_id {
            Some(scope) => write!(f, "{}/{}/{}", self.kind, scope, self.entity_id),
            None => write!(f, "{}/{}", self.kind, self.entity_id),
        }
    }
}

/// A mutation as handed to the queue, before it is stamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOperation {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub entity: EntityKind,
    pub entity_id: String,
    #[serde(default)]
    pub scope_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub priority: Priority,
}

impl NewOperation {
    /// Build a mutation with default priority and an empty payload.
    pub fn new(op_type: OperationType, entity: EntityKind, entity_id: impl Into<String>) -> Self {
        Self {
            op_type,
            entity,
            entity_id: entity_id.into(),
            scope_id: None,
            payload: Value::Null,
            priority: Priority::default(),
        }
    }

    /// Set the owning profile.
    #[must_use]
    pub fn with_scope(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = Some(scope_id.into());
        self
    }

    /// Set the entity body.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Remote address of the target entity.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.entity,
            scope_id: self.scope_id.clone(),
            entity_id: self.entity_id.clone(),
        }
    }
}

/// A pending mutation waiting to reach the remote backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub entity: EntityKind,
    pub entity_id: String,
    #[serde(default)]
    pub scope_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl QueuedOperation {
    /// Stamp a new mutation with an id and enqueue time.
    pub fn from_new(op: NewOperation, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            op_type: op.op_type,
            entity: op.entity,
            entity_id: op.entity_id,
            scope_id: op.scope_id,
            payload: op.payload,
            enqueued_at,
            attempts: 0,
            last_attempt_at: None,
            last_error: None,
            priority: op.priority,
        }
    }

    /// Remote address of the target entity.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.entity,
            scope_id: self.scope_id.clone(),
            entity_id: self.entity_id.clone(),
        }
    }
}

/// Per-priority entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCount {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCount {
    /// Count one entry of the given priority.
    pub fn record(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }
}

/// Snapshot of queue health.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub total: usize,
    pub pending: usize,
    pub failed: usize,
    pub is_processing: bool,
    pub priority_count: PriorityCount,
    /// Enqueue time of the oldest entry still queued.
    pub oldest_operation: Option<DateTime<Utc>>,
}

/// One entry that was flagged failed during a drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub operation_id: Uuid,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub entity: EntityKind,
    pub entity_id: String,
    pub message: String,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: {}", self.op_type, self.entity, self.entity_id, self.message)
    }
}

/// Result of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Entries delivered and removed.
    pub success: usize,
    /// Remote calls that failed during the pass.
    pub failed: usize,
    /// Entries that crossed the attempt limit during the pass.
    pub errors: Vec<SyncFailure>,
}

impl SyncReport {
    /// True when nothing was attempted.
    pub fn is_empty(&self) -> bool {
        self.success == 0 && self.failed == 0 && self.errors.is_empty()
    }
}

/// Summary shown to users after an interruption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryInfo {
    pub last_sync_time: Option<DateTime<Utc>>,
    pub queued_items: usize,
    pub backup_count: usize,
    pub is_online: bool,
}

/// Caller context for remote calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl Identity {
    /// Identity without a bearer token.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), access_token: None }
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
