//! Core derived-view logic for the shelfmap warehouse admin.
//! Builds topology trees, search visibility, placement trees and audit
//! diffs from flat collections. No persistence, no I/O beyond dataset files.

pub mod dataset;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;

pub use dataset::{load_dataset, DatasetError, DatasetResult, IntegrityIssue, WarehouseDataset};
pub use logging::{default_log_level, init_logging, logging_status, resolve_log_level};
pub use model::audit::{AuditAction, AuditEntry, Snapshot};
pub use model::instance::{
    counts_are_consistent, InstanceRef, InventoryInstance, Placement, PlacementAction,
    PlacementNode, PlacementNodeKind, PlacementSegment, SegmentKind,
};
pub use model::topology::{CellGroup, OrganizationalUnit, StorageGroup, TopologyNode, UnitTree};
pub use model::NodeId;
pub use search::matcher::{
    descendant_matches, expanded_ids, filter_tree, matches_self, node_visibility,
    subtree_matches, NodeVisibility, SearchNode, SearchQuery, SearchableNode,
};
pub use service::history_service::{
    compute_diff, describe_entry, history_timeline, EntryChanges, FieldDiff, FieldValue,
    SnapshotValue, TimelineItem,
};
pub use service::placement_service::{aggregate, PlacementFilter};
pub use service::topology_service::build_topology;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
