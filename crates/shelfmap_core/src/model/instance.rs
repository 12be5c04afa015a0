//! Inventory instances and their recorded placement.
//!
//! # Responsibility
//! - Describe one physical inventory instance and where it sits.
//! - Describe the placement tree produced by the placement aggregator.
//!
//! # Invariants
//! - `Placement::path` is ordered root-to-cell; segments are contiguous
//!   ancestors of one another.
//! - An empty path is equivalent to no placement at all.

use super::NodeId;
use serde::{Deserialize, Serialize};

/// Location level a placement segment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Unit,
    StorageGroup,
    CellGroup,
    Cell,
}

/// One ancestor location on a placement path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSegment {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub alias: String,
    pub kind: SegmentKind,
}

/// Recorded location of a placed instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Root-to-cell ancestor path, terminal segment is the occupied cell.
    #[serde(default)]
    pub path: Vec<PlacementSegment>,
    #[serde(default)]
    pub row: Option<u32>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub position: Option<u32>,
}

/// One physical occurrence of an item/variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryInstance {
    pub id: NodeId,
    pub item_id: NodeId,
    #[serde(default)]
    pub variant_id: Option<NodeId>,
    /// Display label, e.g. serial number or item name.
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placement: Option<Placement>,
    /// Tasks that touch this instance (moves, picks, audits).
    #[serde(default)]
    pub task_ids: Vec<NodeId>,
}

impl InventoryInstance {
    /// Returns the placement path, or `None` when unplaced or path is empty.
    pub fn placement_path(&self) -> Option<&[PlacementSegment]> {
        self.placement
            .as_ref()
            .map(|placement| placement.path.as_slice())
            .filter(|path| !path.is_empty())
    }

    pub fn is_placed(&self) -> bool {
        self.placement_path().is_some()
    }
}

/// Back-reference from a placement leaf to its source instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRef {
    pub instance_id: NodeId,
    pub item_id: NodeId,
    pub variant_id: Option<NodeId>,
}

impl From<&InventoryInstance> for InstanceRef {
    fn from(value: &InventoryInstance) -> Self {
        Self {
            instance_id: value.id,
            item_id: value.item_id,
            variant_id: value.variant_id,
        }
    }
}

/// Row action offered by the placement table for one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "instance_id", rename_all = "snake_case")]
pub enum PlacementAction {
    /// Navigate to the instance detail view.
    Open(NodeId),
    /// Request deletion of the instance.
    Delete(NodeId),
}

/// Node role inside a placement tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "segment", rename_all = "snake_case")]
pub enum PlacementNodeKind {
    /// Deduplicated ancestor location.
    Location(SegmentKind),
    /// One instance occurrence inside its cell.
    Occurrence,
    /// Top-level entry for an instance without placement.
    Unplaced,
}

/// Node of a placement tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementNode {
    /// Location id for location nodes, instance id for leaves.
    pub id: NodeId,
    pub kind: PlacementNodeKind,
    pub name: String,
    pub alias: String,
    /// Number of instance leaves in this subtree (1 for leaves).
    pub instance_count: u32,
    pub row: Option<u32>,
    pub level: Option<u32>,
    pub position: Option<u32>,
    /// Set on leaves only.
    pub instance: Option<InstanceRef>,
    pub children: Vec<PlacementNode>,
}

impl PlacementNode {
    pub fn is_leaf(&self) -> bool {
        self.instance.is_some()
    }

    /// Counts instance leaves in this subtree, this node included.
    pub fn leaf_count(&self) -> u32 {
        if self.is_leaf() {
            return 1;
        }
        self.children.iter().map(PlacementNode::leaf_count).sum()
    }

    /// Row actions for leaves; location nodes offer none.
    pub fn actions(&self) -> Vec<PlacementAction> {
        match self.instance {
            Some(instance) => vec![
                PlacementAction::Open(instance.instance_id),
                PlacementAction::Delete(instance.instance_id),
            ],
            None => Vec::new(),
        }
    }
}

/// Returns whether every location node's `instance_count` equals its leaf count.
pub fn counts_are_consistent(roots: &[PlacementNode]) -> bool {
    roots.iter().all(|node| {
        let own = node.is_leaf() || node.instance_count == node.leaf_count();
        own && counts_are_consistent(&node.children)
    })
}
