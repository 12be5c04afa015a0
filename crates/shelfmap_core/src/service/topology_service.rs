//! Topology tree builder.
//!
//! # Responsibility
//! - Assemble one nested unit tree per organizational unit from flat
//!   storage-group and cell-group collections.
//!
//! # Invariants
//! - Child order is source order: storage groups first, then cell groups.
//! - A storage group whose parent is not reachable from its unit root is
//!   dropped together with its descendants (never re-attached at root).
//! - Each storage-group id is emitted at most once per unit, so malformed
//!   self/duplicate references cannot recurse forever.
//! - Pure: equal inputs produce equal trees.

use crate::model::topology::{CellGroup, OrganizationalUnit, StorageGroup, TopologyNode, UnitTree};
use crate::model::NodeId;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Builds one tree per unit, in unit source order.
pub fn build_topology(
    units: &[OrganizationalUnit],
    storage_groups: &[StorageGroup],
    cell_groups: &[CellGroup],
) -> Vec<UnitTree> {
    let trees = units
        .iter()
        .map(|unit| build_unit_tree(unit, storage_groups, cell_groups))
        .collect::<Vec<_>>();

    debug!(
        "event=topology_built module=topology status=ok units={} storage_groups={} cell_groups={}",
        units.len(),
        storage_groups.len(),
        cell_groups.len()
    );
    trees
}

/// Per-unit child index keyed by parent cursor, preserving source order.
struct UnitIndex<'a> {
    groups_by_parent: HashMap<Option<NodeId>, Vec<&'a StorageGroup>>,
    cells_by_group: HashMap<Option<NodeId>, Vec<&'a CellGroup>>,
}

impl<'a> UnitIndex<'a> {
    fn new(
        unit_id: NodeId,
        storage_groups: &'a [StorageGroup],
        cell_groups: &'a [CellGroup],
    ) -> Self {
        let mut groups_by_parent: HashMap<Option<NodeId>, Vec<&StorageGroup>> = HashMap::new();
        for group in storage_groups.iter().filter(|group| group.unit_id == unit_id) {
            groups_by_parent.entry(group.parent_id).or_default().push(group);
        }

        let mut cells_by_group: HashMap<Option<NodeId>, Vec<&CellGroup>> = HashMap::new();
        for cells in cell_groups.iter().filter(|cells| cells.unit_id == unit_id) {
            cells_by_group
                .entry(cells.storage_group_id)
                .or_default()
                .push(cells);
        }

        Self {
            groups_by_parent,
            cells_by_group,
        }
    }

    fn group_count(&self) -> usize {
        self.groups_by_parent.values().map(Vec::len).sum()
    }
}

fn build_unit_tree(
    unit: &OrganizationalUnit,
    storage_groups: &[StorageGroup],
    cell_groups: &[CellGroup],
) -> UnitTree {
    let index = UnitIndex::new(unit.id, storage_groups, cell_groups);
    let mut emitted = HashSet::new();
    let children = collect_children(&index, None, &mut emitted);

    let dropped = index.group_count().saturating_sub(emitted.len());
    if dropped > 0 {
        warn!(
            "event=topology_orphans module=topology status=dropped unit={} count={}",
            unit.id, dropped
        );
    }

    UnitTree {
        unit: unit.clone(),
        children,
    }
}

fn collect_children(
    index: &UnitIndex<'_>,
    cursor: Option<NodeId>,
    emitted: &mut HashSet<NodeId>,
) -> Vec<TopologyNode> {
    let mut children = Vec::new();

    if let Some(groups) = index.groups_by_parent.get(&cursor) {
        for group in groups {
            if !emitted.insert(group.id) {
                continue;
            }
            let nested = collect_children(index, Some(group.id), emitted);
            children.push(TopologyNode::StorageGroup {
                group: (*group).clone(),
                children: nested,
            });
        }
    }

    if let Some(cells) = index.cells_by_group.get(&cursor) {
        children.extend(cells.iter().map(|group| TopologyNode::CellGroup {
            group: (*group).clone(),
        }));
    }

    children
}

#[cfg(test)]
mod tests {
    use super::build_topology;
    use crate::model::topology::{OrganizationalUnit, StorageGroup, TopologyNode};
    use uuid::Uuid;

    fn unit(name: &str) -> OrganizationalUnit {
        OrganizationalUnit {
            id: Uuid::new_v4(),
            name: name.to_string(),
            alias: String::new(),
            address: None,
        }
    }

    fn group(unit_id: Uuid, parent_id: Option<Uuid>, name: &str) -> StorageGroup {
        StorageGroup {
            id: Uuid::new_v4(),
            unit_id,
            parent_id,
            name: name.to_string(),
            alias: String::new(),
        }
    }

    #[test]
    fn self_parented_group_terminates_and_is_dropped() {
        let site = unit("Moscow");
        let mut looped = group(site.id, None, "Loop");
        looped.parent_id = Some(looped.id);

        let trees = build_topology(&[site], &[looped], &[]);
        assert!(trees[0].children.is_empty());
    }

    #[test]
    fn duplicate_ids_are_emitted_once() {
        let site = unit("Moscow");
        let root = group(site.id, None, "Floor1");
        let mut twin = root.clone();
        twin.parent_id = Some(root.id);
        twin.name = "Floor1-copy".to_string();

        let trees = build_topology(&[site], &[root.clone(), twin], &[]);
        assert_eq!(trees[0].children.len(), 1);
        match &trees[0].children[0] {
            TopologyNode::StorageGroup { group, children } => {
                assert_eq!(group.name, "Floor1");
                assert!(children.is_empty());
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }
}
