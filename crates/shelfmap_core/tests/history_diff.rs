use serde_json::{json, Value};
use shelfmap_core::{
    compute_diff, describe_entry, history_timeline, AuditAction, AuditEntry, EntryChanges,
    FieldDiff, Snapshot,
};
use std::collections::BTreeSet;
use uuid::Uuid;

fn snapshot(value: Value) -> Snapshot {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object: {other}"),
    }
}

fn entry(timestamp: i64, before: Option<Value>, after: Option<Value>) -> AuditEntry {
    let action = match (&before, &after) {
        (None, Some(_)) => AuditAction::Create,
        (Some(_), None) => AuditAction::Delete,
        _ => AuditAction::Update,
    };
    AuditEntry {
        id: Uuid::new_v4(),
        timestamp,
        actor_id: Some(Uuid::new_v4()),
        actor_name: Some("operator".to_string()),
        action,
        before: before.map(snapshot),
        after: after.map(snapshot),
    }
}

fn as_set(diffs: &[FieldDiff]) -> BTreeSet<(String, String, String)> {
    diffs
        .iter()
        .map(|diff| {
            (
                diff.dotted_path(),
                format!("{:?}", diff.old_value),
                format!("{:?}", diff.new_value),
            )
        })
        .collect()
}

#[test]
fn scalar_change_reports_single_path() {
    let before = snapshot(json!({"name": "A", "qty": 1}));
    let after = snapshot(json!({"name": "B", "qty": 1}));

    let diffs = compute_diff(&before, &after);
    assert_eq!(
        diffs,
        vec![FieldDiff {
            path: vec!["name".to_string()],
            old_value: Some(json!("A")),
            new_value: Some(json!("B")),
        }]
    );
}

#[test]
fn identical_snapshots_have_no_diff() {
    let value = snapshot(json!({
        "name": "Pallet",
        "dims": {"w": 120, "h": {"min": 10, "max": 14}},
        "tags": ["fragile", "cold"],
        "note": null
    }));
    assert!(compute_diff(&value, &value).is_empty());
    assert!(compute_diff(&value, &value.clone()).is_empty());
}

#[test]
fn nested_mappings_produce_dotted_paths() {
    let before = snapshot(json!({"location": {"cell": {"row": 1, "level": 2}}, "qty": 5}));
    let after = snapshot(json!({"location": {"cell": {"row": 3, "level": 2}}, "qty": 5}));

    let diffs = compute_diff(&before, &after);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].path, vec!["location", "cell", "row"]);
    assert_eq!(diffs[0].dotted_path(), "location.cell.row");
    assert_eq!(diffs[0].old_value, Some(json!(1)));
    assert_eq!(diffs[0].new_value, Some(json!(3)));
}

#[test]
fn missing_keys_are_reported_as_absent_sides() {
    let before = snapshot(json!({"kept": 1, "dropped": "x"}));
    let after = snapshot(json!({"kept": 1, "added": {"deep": true}}));

    let diffs = compute_diff(&before, &after);
    assert_eq!(diffs.len(), 2);
    assert_eq!(diffs[0].dotted_path(), "dropped");
    assert_eq!(diffs[0].old_value, Some(json!("x")));
    assert_eq!(diffs[0].new_value, None);
    assert_eq!(diffs[1].dotted_path(), "added");
    assert_eq!(diffs[1].old_value, None);
    assert_eq!(diffs[1].new_value, Some(json!({"deep": true})));
}

#[test]
fn null_versus_mapping_is_a_plain_change() {
    let before = snapshot(json!({"address": null}));
    let after = snapshot(json!({"address": {"city": "Moscow"}}));

    let diffs = compute_diff(&before, &after);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].dotted_path(), "address");
    assert_eq!(diffs[0].old_value, Some(Value::Null));
}

#[test]
fn arrays_are_compared_whole_and_never_descended() {
    let before = snapshot(json!({"tags": ["a", {"k": 1}], "same": [1, 2]}));
    let after = snapshot(json!({"tags": ["a", {"k": 2}], "same": [1, 2]}));

    let diffs = compute_diff(&before, &after);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].path, vec!["tags"]);
    assert_eq!(diffs[0].new_value, Some(json!(["a", {"k": 2}])));
}

#[test]
fn swapping_sides_mirrors_the_diff() {
    let a = snapshot(json!({"name": "A", "dims": {"w": 1, "d": 3}, "gone": true, "list": [1]}));
    let b = snapshot(json!({"name": "B", "dims": {"w": 2}, "new": 7, "list": [2]}));

    let forward = compute_diff(&a, &b);
    let mirrored = forward
        .into_iter()
        .map(|diff| FieldDiff {
            path: diff.path,
            old_value: diff.new_value,
            new_value: diff.old_value,
        })
        .collect::<Vec<_>>();
    let backward = compute_diff(&b, &a);

    assert_eq!(as_set(&mirrored), as_set(&backward));
}

#[test]
fn describe_entry_routes_create_and_delete() {
    let created = entry(1, None, Some(json!({"name": "Rack", "cells": 40})));
    match describe_entry(&created) {
        EntryChanges::Created(fields) => {
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0].field, "name");
            assert_eq!(fields[1].value, json!(40));
        }
        other => panic!("unexpected changes: {other:?}"),
    }

    let removed = entry(2, Some(json!({"name": "Rack"})), None);
    assert!(matches!(describe_entry(&removed), EntryChanges::Removed(fields) if fields.len() == 1));

    let updated = entry(3, Some(json!({"name": "A"})), Some(json!({"name": "B"})));
    assert!(matches!(describe_entry(&updated), EntryChanges::Updated(diffs) if diffs.len() == 1));

    let empty = entry(4, None, None);
    assert_eq!(describe_entry(&empty), EntryChanges::Unchanged);
}

#[test]
fn timeline_orders_newest_first() {
    let old = entry(1_700_000_000_000, None, Some(json!({"name": "A"})));
    let new = entry(1_700_000_360_000, Some(json!({"name": "A"})), Some(json!({"name": "B"})));
    let middle = entry(1_700_000_100_000, Some(json!({"qty": 1})), Some(json!({"qty": 1})));

    let timeline = history_timeline(&[old.clone(), new.clone(), middle.clone()]);
    let order = timeline.iter().map(|item| item.entry_id).collect::<Vec<_>>();
    assert_eq!(order, vec![new.id, middle.id, old.id]);
    assert_eq!(timeline[1].changes, EntryChanges::Updated(Vec::new()));
    assert_eq!(timeline[0].actor_name.as_deref(), Some("operator"));
}

#[test]
fn changes_serialize_with_tags() {
    let updated = entry(3, Some(json!({"name": "A"})), Some(json!({"name": "B"})));
    let json = serde_json::to_value(describe_entry(&updated)).unwrap();
    assert_eq!(json["change"], "updated");
    assert_eq!(json["fields"][0]["path"], json!(["name"]));
    assert_eq!(json["fields"][0]["old_value"], "A");
}
