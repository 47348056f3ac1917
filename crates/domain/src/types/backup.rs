//! Full-state snapshots, checkpoints and the export document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::queue::QueueStatus;
use crate::impl_wire_name_conversions;

/// Entity bodies keyed by owning profile id.
pub type ProfileKeyed = BTreeMap<String, Vec<Value>>;

/// Every locally held collection plus settings.
///
/// Entity bodies are opaque JSON. Keyed collections are keyed by profile id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub profiles: Vec<Value>,
    #[serde(default)]
    pub logs: ProfileKeyed,
    #[serde(default)]
    pub inventories: ProfileKeyed,
    #[serde(default)]
    pub reminders: ProfileKeyed,
    #[serde(default)]
    pub appointments: ProfileKeyed,
    #[serde(default)]
    pub custom_activities: Vec<Value>,
    #[serde(default)]
    pub achieved_milestones: ProfileKeyed,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl AppState {
    /// Record counts per collection.
    pub fn change_counters(&self) -> ChangeCounters {
        fn total(map: &ProfileKeyed) -> usize {
            map.values().map(Vec::len).sum()
        }

        ChangeCounters {
            profiles: self.profiles.len(),
            logs: total(&self.logs),
            inventories: total(&self.inventories),
            reminders: total(&self.reminders),
            appointments: total(&self.appointments),
            custom_activities: self.custom_activities.len(),
            achieved_milestones: total(&self.achieved_milestones),
        }
    }

    /// True when no collection holds anything and settings are empty.
    pub fn is_empty(&self) -> bool {
        self.change_counters().total() == 0 && self.settings.is_empty()
    }
}

/// Record counts per collection, used as a cheap change fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounters {
    pub profiles: usize,
    pub logs: usize,
    pub inventories: usize,
    pub reminders: usize,
    pub appointments: usize,
    pub custom_activities: usize,
    pub achieved_milestones: usize,
}

impl ChangeCounters {
    /// Sum over all collections.
    pub const fn total(&self) -> usize {
        self.profiles
            + self.logs
            + self.inventories
            + self.reminders
            + self.appointments
            + self.custom_activities
            + self.achieved_milestones
    }
}

/// Immutable full-state backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub schema_version: u32,
    #[serde(rename = "fullState")]
    pub state: AppState,
}

/// Sync state recorded alongside a checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointStatus {
    #[default]
    Pending,
    Synced,
    Failed,
}

impl_wire_name_conversions!(CheckpointStatus {
    Pending => "pending",
    Synced => "synced",
    Failed => "failed",
});

impl CheckpointStatus {
    /// Derive a checkpoint status from queue health.
    ///
    /// Any failed entry wins over pending ones; an empty queue is synced.
    pub const fn from_queue(status: &QueueStatus) -> Self {
        if status.failed > 0 {
            Self::Failed
        } else if status.pending > 0 {
            Self::Pending
        } else {
            Self::Synced
        }
    }
}

/// Lightweight fingerprint of local state. Carries no payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub status: CheckpointStatus,
    pub content_hash: String,
    pub change_counters: ChangeCounters,
}

/// Document produced by export and accepted by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub app_version: String,
    #[serde(flatten)]
    pub state: AppState,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_state() -> AppState {
        let mut state = AppState {
            profiles: vec![json!({"id": "p1", "name": "Ada"})],
            ..AppState::default()
        };
        state.logs.insert("p1".into(), vec![json!({"id": "l1"}), json!({"id": "l2"})]);
        state.reminders.insert("p1".into(), vec![json!({"id": "r1"})]);
        state.settings.insert("theme".into(), json!("dark"));
        state
    }

    #[test]
    fn test_change_counters_sum_profile_keyed_collections() {
        let counters = sample_state().change_counters();
        assert_eq!(counters.profiles, 1);
        assert_eq!(counters.logs, 2);
        assert_eq!(counters.reminders, 1);
        assert_eq!(counters.total(), 4);
    }

    #[test]
    fn test_export_document_is_flat() {
        let doc = ExportDocument {
            exported_at: Utc::now(),
            app_version: "1.2.3".into(),
            state: sample_state(),
        };

        let value = serde_json::to_value(&doc).unwrap();
        for key in [
            "exportedAt",
            "appVersion",
            "profiles",
            "logs",
            "inventories",
            "reminders",
            "appointments",
            "customActivities",
            "achievedMilestones",
            "settings",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_snapshot_uses_full_state_key() {
        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            schema_version: 1,
            state: AppState::default(),
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("fullState").is_some());
        assert_eq!(value["schemaVersion"], 1);
    }

    #[test]
    fn test_checkpoint_status_from_queue() {
        let mut status = QueueStatus::default();
        assert_eq!(CheckpointStatus::from_queue(&status), CheckpointStatus::Synced);

        status.pending = 2;
        assert_eq!(CheckpointStatus::from_queue(&status), CheckpointStatus::Pending);

        status.failed = 1;
        assert_eq!(CheckpointStatus::from_queue(&status), CheckpointStatus::Failed);
    }

    #[test]
    fn test_empty_state() {
        assert!(AppState::default().is_empty());
        assert!(!sample_state().is_empty());
    }
}
