//! Instance placement aggregation.
//!
//! # Responsibility
//! - Filter instances by location/item/task scope.
//! - Fold placement paths into one tree of deduplicated locations with one
//!   leaf per instance occurrence.
//!
//! # Invariants
//! - The node arena is local to one `aggregate` call.
//! - Every location node's `instance_count` equals the number of instance
//!   leaves in its subtree.
//! - Leaves are never shared, even for instances in the same cell.
//! - Empty or inconsistent paths are treated as unplaced; nothing panics.

use crate::model::instance::{
    InstanceRef, InventoryInstance, PlacementNode, PlacementNodeKind, PlacementSegment,
};
use crate::model::NodeId;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Scoping filters, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementFilter {
    pub unit_id: Option<NodeId>,
    pub storage_group_id: Option<NodeId>,
    pub cell_group_id: Option<NodeId>,
    pub cell_id: Option<NodeId>,
    pub item_id: Option<NodeId>,
    pub variant_id: Option<NodeId>,
    pub instance_id: Option<NodeId>,
    /// Keeps instances affected by this task.
    pub task_id: Option<NodeId>,
    /// Unplaced instances bypass every other filter when set.
    pub only_unplaced: bool,
}

impl PlacementFilter {
    /// Returns whether `instance` passes the filter set.
    pub fn accepts(&self, instance: &InventoryInstance) -> bool {
        let path = instance.placement_path();
        if self.only_unplaced && path.is_none() {
            return true;
        }

        let on_path = |wanted: Option<NodeId>| match wanted {
            None => true,
            Some(id) => path.is_some_and(|segments| segments.iter().any(|s| s.id == id)),
        };
        let at_cell = match self.cell_id {
            None => true,
            Some(id) => path
                .and_then(|segments| segments.last())
                .is_some_and(|cell| cell.id == id),
        };

        on_path(self.unit_id)
            && on_path(self.storage_group_id)
            && on_path(self.cell_group_id)
            && at_cell
            && self.item_id.map_or(true, |id| instance.item_id == id)
            && self
                .variant_id
                .map_or(true, |id| instance.variant_id == Some(id))
            && self.instance_id.map_or(true, |id| instance.id == id)
            && self
                .task_id
                .map_or(true, |id| instance.task_ids.contains(&id))
    }
}

/// Arena slot while the tree is being folded.
struct Slot {
    node: PlacementNode,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Per-call arena of placement nodes, keyed by location id.
struct PlacementArena {
    slots: Vec<Slot>,
    by_location: HashMap<NodeId, usize>,
    roots: Vec<usize>,
}

impl PlacementArena {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            by_location: HashMap::new(),
            roots: Vec::new(),
        }
    }

    fn push(&mut self, node: PlacementNode, parent: Option<usize>) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot {
            node,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.slots[parent].children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    /// Checks that `path` agrees with every location already in the arena.
    ///
    /// A reused segment must sit under the same parent it was created with,
    /// and a path must not repeat an id.
    fn path_is_consistent(&self, path: &[PlacementSegment]) -> bool {
        let mut seen = HashSet::new();
        if !path.iter().all(|segment| seen.insert(segment.id)) {
            return false;
        }

        let mut parent = None;
        let mut fresh = false;
        for segment in path {
            match self.by_location.get(&segment.id) {
                // Everything below a fresh segment must be fresh as well.
                Some(_) if fresh => return false,
                Some(&index) => {
                    if self.slots[index].parent != parent {
                        return false;
                    }
                    parent = Some(index);
                }
                None => fresh = true,
            }
        }
        true
    }

    fn add_placed(&mut self, instance: &InventoryInstance, path: &[PlacementSegment]) {
        let mut parent = None;
        for segment in path {
            let index = match self.by_location.get(&segment.id) {
                Some(&index) => index,
                None => {
                    let index = self.push(location_node(segment), parent);
                    self.by_location.insert(segment.id, index);
                    index
                }
            };
            self.slots[index].node.instance_count += 1;
            parent = Some(index);
        }
        self.push(occurrence_node(instance, PlacementNodeKind::Occurrence), parent);
    }

    fn add_unplaced(&mut self, instance: &InventoryInstance) {
        self.push(occurrence_node(instance, PlacementNodeKind::Unplaced), None);
    }

    fn into_tree(mut self) -> Vec<PlacementNode> {
        let roots = std::mem::take(&mut self.roots);
        roots
            .into_iter()
            .map(|index| self.materialize(index))
            .collect()
    }

    // Child indices are always greater than their parent's, so this terminates.
    fn materialize(&mut self, index: usize) -> PlacementNode {
        let children = std::mem::take(&mut self.slots[index].children);
        let built = children
            .into_iter()
            .map(|child| self.materialize(child))
            .collect::<Vec<_>>();
        let mut node = std::mem::replace(&mut self.slots[index].node, placeholder());
        node.children = built;
        node
    }
}

/// Folds filtered instances into a placement tree.
///
/// Top-level order follows first appearance: location roots and unplaced
/// leaves interleave in instance order.
pub fn aggregate(instances: &[InventoryInstance], filter: &PlacementFilter) -> Vec<PlacementNode> {
    let mut arena = PlacementArena::new();
    let mut accepted = 0usize;
    let mut malformed = 0usize;

    for instance in instances.iter().filter(|instance| filter.accepts(instance)) {
        accepted += 1;
        match instance.placement_path() {
            Some(path) if arena.path_is_consistent(path) => arena.add_placed(instance, path),
            Some(_) => {
                malformed += 1;
                arena.add_unplaced(instance);
            }
            None => arena.add_unplaced(instance),
        }
    }

    if malformed > 0 {
        warn!(
            "event=placement_malformed_paths module=placement status=degraded count={}",
            malformed
        );
    }
    debug!(
        "event=placement_aggregated module=placement status=ok input={} accepted={} nodes={}",
        instances.len(),
        accepted,
        arena.slots.len()
    );

    arena.into_tree()
}

fn location_node(segment: &PlacementSegment) -> PlacementNode {
    PlacementNode {
        id: segment.id,
        kind: PlacementNodeKind::Location(segment.kind),
        name: segment.name.clone(),
        alias: segment.alias.clone(),
        instance_count: 0,
        row: None,
        level: None,
        position: None,
        instance: None,
        children: Vec::new(),
    }
}

fn occurrence_node(instance: &InventoryInstance, kind: PlacementNodeKind) -> PlacementNode {
    let placement = instance.placement.as_ref();
    PlacementNode {
        id: instance.id,
        kind,
        name: instance.label.clone(),
        alias: String::new(),
        instance_count: 1,
        row: placement.and_then(|p| p.row),
        level: placement.and_then(|p| p.level),
        position: placement.and_then(|p| p.position),
        instance: Some(InstanceRef::from(instance)),
        children: Vec::new(),
    }
}

fn placeholder() -> PlacementNode {
    PlacementNode {
        id: NodeId::nil(),
        kind: PlacementNodeKind::Unplaced,
        name: String::new(),
        alias: String::new(),
        instance_count: 0,
        row: None,
        level: None,
        position: None,
        instance: None,
        children: Vec::new(),
    }
}
