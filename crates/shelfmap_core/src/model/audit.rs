//! Audit-log entries and their snapshots.
//!
//! # Invariants
//! - `Create` entries carry no `before`, `Delete` entries carry no `after`.
//!   The differ never sees a missing side; `describe_entry` routes first.

use super::NodeId;
use serde::{Deserialize, Serialize};

/// Arbitrary field-name to value mapping captured by the audit log.
pub type Snapshot = serde_json::Map<String, serde_json::Value>;

/// Kind of change recorded by one audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// One historical change to a tracked object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: NodeId,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub actor_id: Option<NodeId>,
    #[serde(default)]
    pub actor_name: Option<String>,
    pub action: AuditAction,
    #[serde(default)]
    pub before: Option<Snapshot>,
    #[serde(default)]
    pub after: Option<Snapshot>,
}
