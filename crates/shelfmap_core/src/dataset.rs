//! Exported warehouse dataset loading and integrity reporting.
//!
//! # Responsibility
//! - Deserialize the flat collections handed over by the data layer.
//! - Report reference problems without repairing them.
//!
//! # Invariants
//! - Missing collections deserialize as empty.
//! - The integrity report is deterministic: grouped by check, input order.

use crate::model::audit::AuditEntry;
use crate::model::instance::InventoryInstance;
use crate::model::topology::{CellGroup, OrganizationalUnit, StorageGroup};
use crate::model::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Result type for dataset loading.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors from dataset loading.
#[derive(Debug)]
pub enum DatasetError {
    /// File could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Content is not a valid dataset document.
    Parse(serde_json::Error),
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read dataset `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid dataset document: {err}"),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Flat collections as fetched from the external store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseDataset {
    pub units: Vec<OrganizationalUnit>,
    pub storage_groups: Vec<StorageGroup>,
    pub cell_groups: Vec<CellGroup>,
    pub instances: Vec<InventoryInstance>,
    pub audit_entries: Vec<AuditEntry>,
}

/// One reference problem found in a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// Id used by more than one record of the same collection.
    DuplicateId { collection: &'static str, id: NodeId },
    /// Record references a unit that does not exist.
    UnknownUnit {
        collection: &'static str,
        id: NodeId,
        unit_id: NodeId,
    },
    /// Storage group parent does not exist.
    DanglingParent { id: NodeId, parent_id: NodeId },
    /// Storage group parent belongs to another unit.
    CrossUnitParent {
        id: NodeId,
        parent_id: NodeId,
        unit_id: NodeId,
        parent_unit_id: NodeId,
    },
    /// Storage group is part of a parent cycle.
    ParentCycle { id: NodeId },
    /// Cell group bound to a storage group that does not exist.
    UnknownStorageGroup { id: NodeId, storage_group_id: NodeId },
    /// Instance has a placement with no segments.
    EmptyPlacementPath { instance_id: NodeId },
}

impl Display for IntegrityIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId { collection, id } => write!(f, "duplicate {collection} id: {id}"),
            Self::UnknownUnit {
                collection,
                id,
                unit_id,
            } => write!(f, "{collection} {id} references unknown unit {unit_id}"),
            Self::DanglingParent { id, parent_id } => {
                write!(f, "storage group {id} references missing parent {parent_id}")
            }
            Self::CrossUnitParent {
                id,
                parent_id,
                unit_id,
                parent_unit_id,
            } => write!(
                f,
                "storage group {id} (unit {unit_id}) has parent {parent_id} in unit {parent_unit_id}"
            ),
            Self::ParentCycle { id } => write!(f, "storage group {id} is part of a parent cycle"),
            Self::UnknownStorageGroup {
                id,
                storage_group_id,
            } => write!(
                f,
                "cell group {id} references unknown storage group {storage_group_id}"
            ),
            Self::EmptyPlacementPath { instance_id } => {
                write!(f, "instance {instance_id} has an empty placement path")
            }
        }
    }
}

/// Reads and parses a dataset file.
pub fn load_dataset(path: impl AsRef<Path>) -> DatasetResult<WarehouseDataset> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    WarehouseDataset::from_json_str(&raw)
}

impl WarehouseDataset {
    /// Parses a dataset from a JSON document.
    pub fn from_json_str(raw: &str) -> DatasetResult<Self> {
        serde_json::from_str(raw).map_err(Into::into)
    }

    /// Lists reference problems. The builders tolerate all of them.
    pub fn integrity_report(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        duplicate_ids("unit", self.units.iter().map(|u| u.id), &mut issues);
        duplicate_ids(
            "storage_group",
            self.storage_groups.iter().map(|g| g.id),
            &mut issues,
        );
        duplicate_ids(
            "cell_group",
            self.cell_groups.iter().map(|c| c.id),
            &mut issues,
        );
        duplicate_ids("instance", self.instances.iter().map(|i| i.id), &mut issues);

        let unit_ids = self.units.iter().map(|u| u.id).collect::<HashSet<_>>();
        for group in &self.storage_groups {
            if !unit_ids.contains(&group.unit_id) {
                issues.push(IntegrityIssue::UnknownUnit {
                    collection: "storage_group",
                    id: group.id,
                    unit_id: group.unit_id,
                });
            }
        }
        for cells in &self.cell_groups {
            if !unit_ids.contains(&cells.unit_id) {
                issues.push(IntegrityIssue::UnknownUnit {
                    collection: "cell_group",
                    id: cells.id,
                    unit_id: cells.unit_id,
                });
            }
        }

        let groups = self
            .storage_groups
            .iter()
            .map(|g| (g.id, g))
            .collect::<HashMap<_, _>>();
        for group in &self.storage_groups {
            let Some(parent_id) = group.parent_id else {
                continue;
            };
            match groups.get(&parent_id) {
                None => issues.push(IntegrityIssue::DanglingParent {
                    id: group.id,
                    parent_id,
                }),
                Some(parent) if parent.unit_id != group.unit_id => {
                    issues.push(IntegrityIssue::CrossUnitParent {
                        id: group.id,
                        parent_id,
                        unit_id: group.unit_id,
                        parent_unit_id: parent.unit_id,
                    })
                }
                Some(_) => {}
            }
        }
        for group in &self.storage_groups {
            if in_parent_cycle(group.id, &groups) {
                issues.push(IntegrityIssue::ParentCycle { id: group.id });
            }
        }

        for cells in &self.cell_groups {
            if let Some(storage_group_id) = cells.storage_group_id {
                if !groups.contains_key(&storage_group_id) {
                    issues.push(IntegrityIssue::UnknownStorageGroup {
                        id: cells.id,
                        storage_group_id,
                    });
                }
            }
        }

        for instance in &self.instances {
            if instance.placement.is_some() && !instance.is_placed() {
                issues.push(IntegrityIssue::EmptyPlacementPath {
                    instance_id: instance.id,
                });
            }
        }

        issues
    }
}

fn duplicate_ids(
    collection: &'static str,
    ids: impl Iterator<Item = NodeId>,
    issues: &mut Vec<IntegrityIssue>,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            issues.push(IntegrityIssue::DuplicateId { collection, id });
        }
    }
}

fn in_parent_cycle(start: NodeId, groups: &HashMap<NodeId, &StorageGroup>) -> bool {
    let mut visited = HashSet::new();
    let mut cursor = groups.get(&start).and_then(|group| group.parent_id);
    while let Some(current) = cursor {
        if current == start {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        cursor = groups.get(&current).and_then(|group| group.parent_id);
    }
    false
}
