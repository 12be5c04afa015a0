//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the core derived views as sync, JSON-in/JSON-out calls.
//! - Keep error semantics simple: envelopes, never panics.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Payload strings are UTF-8 JSON produced by `serde_json`.

use log::warn;
use serde::Serialize;
use shelfmap_core::{
    aggregate, build_topology, core_version as core_version_inner, describe_entry,
    expanded_ids, filter_tree, history_timeline, init_logging as init_logging_inner,
    load_dataset, ping as ping_inner, AuditEntry, PlacementFilter, SearchQuery,
    WarehouseDataset,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const DATASET_PATH_ENV: &str = "SHELFMAP_DATASET_PATH";
static DATASET_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Response envelope shared by every view call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewResponse {
    /// Whether the view was computed.
    pub ok: bool,
    /// JSON payload; empty on failure.
    pub payload_json: String,
    /// Human-readable diagnostics.
    pub message: String,
}

impl ViewResponse {
    fn success(payload: &impl Serialize, message: impl Into<String>) -> Self {
        match serde_json::to_string(payload) {
            Ok(payload_json) => Self {
                ok: true,
                payload_json,
                message: message.into(),
            },
            Err(err) => Self::failure(format!("payload encoding failed: {err}")),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload_json: String::new(),
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct TopologyView {
    units: Vec<shelfmap_core::UnitTree>,
    expanded_ids: Vec<String>,
}

/// Builds the topology tree, pruned and expanded for `query`.
///
/// `dataset_json` empty means "load from `SHELFMAP_DATASET_PATH`".
#[flutter_rust_bridge::frb(sync)]
pub fn topology_view(dataset_json: String, query: String) -> ViewResponse {
    let (dataset, issues) = match resolve_dataset(&dataset_json) {
        Ok(resolved) => resolved,
        Err(message) => return ViewResponse::failure(format!("topology_view failed: {message}")),
    };

    let trees = build_topology(&dataset.units, &dataset.storage_groups, &dataset.cell_groups);
    let query = SearchQuery::new(query);
    let mut expanded = expanded_ids(&trees, &query)
        .into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>();
    expanded.sort();

    let view = TopologyView {
        units: filter_tree(&trees, &query),
        expanded_ids: expanded,
    };
    let message = with_integrity_note(format!("{} unit(s).", view.units.len()), issues);
    ViewResponse::success(&view, message)
}

/// Builds the placement tree for `filter_json` (a `PlacementFilter` object).
///
/// An empty filter string applies no filters.
#[flutter_rust_bridge::frb(sync)]
pub fn placement_view(dataset_json: String, filter_json: String) -> ViewResponse {
    let (dataset, issues) = match resolve_dataset(&dataset_json) {
        Ok(resolved) => resolved,
        Err(message) => return ViewResponse::failure(format!("placement_view failed: {message}")),
    };
    let filter = match parse_filter(&filter_json) {
        Ok(filter) => filter,
        Err(message) => return ViewResponse::failure(format!("placement_view failed: {message}")),
    };

    let roots = aggregate(&dataset.instances, &filter);
    let message = if roots.is_empty() {
        "No instances.".to_string()
    } else {
        format!("{} top-level row(s).", roots.len())
    };
    ViewResponse::success(&roots, with_integrity_note(message, issues))
}

/// Describes one audit entry (`AuditEntry` JSON) as a display change set.
#[flutter_rust_bridge::frb(sync)]
pub fn audit_entry_changes(entry_json: String) -> ViewResponse {
    match serde_json::from_str::<AuditEntry>(&entry_json) {
        Ok(entry) => ViewResponse::success(&describe_entry(&entry), "Entry described."),
        Err(err) => ViewResponse::failure(format!("audit_entry_changes failed: {err}")),
    }
}

/// Orders and describes the dataset's audit entries.
#[flutter_rust_bridge::frb(sync)]
pub fn history_view(dataset_json: String) -> ViewResponse {
    match resolve_dataset(&dataset_json) {
        Ok((dataset, issues)) => {
            let timeline = history_timeline(&dataset.audit_entries);
            let message = with_integrity_note(format!("{} entries.", timeline.len()), issues);
            ViewResponse::success(&timeline, message)
        }
        Err(message) => ViewResponse::failure(format!("history_view failed: {message}")),
    }
}

fn parse_filter(filter_json: &str) -> Result<PlacementFilter, String> {
    let trimmed = filter_json.trim();
    if trimmed.is_empty() {
        return Ok(PlacementFilter::default());
    }
    serde_json::from_str(trimmed).map_err(|err| format!("invalid filter: {err}"))
}

/// Parses the inline payload, or loads `SHELFMAP_DATASET_PATH` when it is
/// blank. Returns the dataset with its integrity issue count.
fn resolve_dataset(dataset_json: &str) -> Result<(WarehouseDataset, usize), String> {
    let dataset = if dataset_json.trim().is_empty() {
        let path = resolve_dataset_path()
            .ok_or_else(|| format!("no dataset given and `{DATASET_PATH_ENV}` is not set"))?;
        load_dataset(&path).map_err(|err| err.to_string())?
    } else {
        WarehouseDataset::from_json_str(dataset_json).map_err(|err| err.to_string())?
    };

    let issues = dataset.integrity_report().len();
    if issues > 0 {
        warn!(
            "event=dataset_integrity module=ffi status=degraded issues={}",
            issues
        );
    }
    Ok((dataset, issues))
}

fn with_integrity_note(message: String, issues: usize) -> String {
    if issues == 0 {
        message
    } else {
        format!("{message} {issues} integrity issue(s).")
    }
}

fn resolve_dataset_path() -> Option<PathBuf> {
    DATASET_PATH
        .get_or_init(|| {
            let raw = std::env::var(DATASET_PATH_ENV).ok()?;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(PathBuf::from(trimmed))
            }
        })
        .clone()
}
