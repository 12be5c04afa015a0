//! Change-history differencing for audit entries.
//!
//! # Responsibility
//! - Diff two snapshots into flat, path-addressed field changes.
//! - Route create/delete entries to field listings instead of a diff.
//! - Order an entry collection into a display timeline.
//!
//! # Invariants
//! - Only nested mappings are descended into; arrays are opaque values.
//! - Arrays compare by whole value: structurally equal arrays are unchanged,
//!   even when they come from different snapshots.
//! - `compute_diff(a, a)` is empty.
//! - Key order: keys of `before` in order, then keys only in `after`.

use crate::model::audit::{AuditEntry, Snapshot};
use crate::model::NodeId;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shape of one snapshot value as seen by the differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotValue<'a> {
    /// Null, bool, number or string.
    Scalar(&'a Value),
    /// Nested key/value mapping, descended into.
    Mapping(&'a Snapshot),
    /// Array, compared as one opaque value.
    List(&'a [Value]),
}

impl<'a> From<&'a Value> for SnapshotValue<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(map),
            Value::Array(items) => Self::List(items.as_slice()),
            scalar => Self::Scalar(scalar),
        }
    }
}

/// One field-level difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub path: Vec<String>,
    /// `None` when the key is absent before.
    pub old_value: Option<Value>,
    /// `None` when the key is absent after.
    pub new_value: Option<Value>,
}

impl FieldDiff {
    /// Path joined with `.` for display.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// One top-level field of a created or removed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field: String,
    pub value: Value,
}

/// Display-ready change set of one audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", content = "fields", rename_all = "snake_case")]
pub enum EntryChanges {
    /// Only an `after` snapshot exists.
    Created(Vec<FieldValue>),
    /// Only a `before` snapshot exists.
    Removed(Vec<FieldValue>),
    /// Both snapshots exist.
    Updated(Vec<FieldDiff>),
    /// Neither snapshot exists.
    Unchanged,
}

/// Audit entry paired with its computed changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub entry_id: NodeId,
    pub timestamp: i64,
    pub actor_name: Option<String>,
    pub changes: EntryChanges,
}

/// Recursively diffs two present snapshots.
pub fn compute_diff(before: &Snapshot, after: &Snapshot) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    let mut path = Vec::new();
    diff_into(before, after, &mut path, &mut diffs);
    diffs
}

fn diff_into(
    before: &Snapshot,
    after: &Snapshot,
    path: &mut Vec<String>,
    diffs: &mut Vec<FieldDiff>,
) {
    let keys = before
        .keys()
        .chain(after.keys().filter(|key| !before.contains_key(*key)));

    for key in keys {
        let old = before.get(key);
        let new = after.get(key);
        path.push(key.clone());

        match (old.map(SnapshotValue::from), new.map(SnapshotValue::from)) {
            (Some(SnapshotValue::Mapping(old_map)), Some(SnapshotValue::Mapping(new_map))) => {
                diff_into(old_map, new_map, path, diffs);
            }
            _ if old == new => {}
            _ => diffs.push(FieldDiff {
                path: path.clone(),
                old_value: old.cloned(),
                new_value: new.cloned(),
            }),
        }

        path.pop();
    }
}

/// Builds the display change set for one entry.
pub fn describe_entry(entry: &AuditEntry) -> EntryChanges {
    match (&entry.before, &entry.after) {
        (Some(before), Some(after)) => EntryChanges::Updated(compute_diff(before, after)),
        (None, Some(after)) => EntryChanges::Created(field_values(after)),
        (Some(before), None) => EntryChanges::Removed(field_values(before)),
        (None, None) => EntryChanges::Unchanged,
    }
}

/// Orders entries newest first (ties by id) and describes each.
pub fn history_timeline(entries: &[AuditEntry]) -> Vec<TimelineItem> {
    let mut ordered = entries.iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));

    let items = ordered
        .into_iter()
        .map(|entry| TimelineItem {
            entry_id: entry.id,
            timestamp: entry.timestamp,
            actor_name: entry.actor_name.clone(),
            changes: describe_entry(entry),
        })
        .collect::<Vec<_>>();

    debug!(
        "event=history_timeline module=history status=ok entries={}",
        items.len()
    );
    items
}

fn field_values(snapshot: &Snapshot) -> Vec<FieldValue> {
    snapshot
        .iter()
        .map(|(field, value)| FieldValue {
            field: field.clone(),
            value: value.clone(),
        })
        .collect()
}
