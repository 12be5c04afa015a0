//! Storage topology records and built tree nodes.
//!
//! # Responsibility
//! - Describe units, storage groups and cell groups as fetched (flat).
//! - Describe the nested unit tree produced by the topology builder.
//!
//! # Invariants
//! - `StorageGroup::parent_id`, when set, references a storage group of the
//!   same unit. Violations are reported, never repaired.
//! - Cells are not tree nodes; a cell group only carries its cell count.

use super::NodeId;
use serde::{Deserialize, Serialize};

/// Top-level warehouse site owning one topology tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationalUnit {
    pub id: NodeId,
    pub name: String,
    /// Short code shown next to the name.
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Self-referential storage location (floor, aisle, rack...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageGroup {
    pub id: NodeId,
    pub unit_id: NodeId,
    /// `None` means direct child of the unit.
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    pub name: String,
    #[serde(default)]
    pub alias: String,
}

/// Container of cells. Leaf of the storage topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGroup {
    pub id: NodeId,
    pub unit_id: NodeId,
    /// `None` binds the group directly to its unit.
    #[serde(default)]
    pub storage_group_id: Option<NodeId>,
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub cell_count: u32,
}

/// One built unit with its nested children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTree {
    pub unit: OrganizationalUnit,
    pub children: Vec<TopologyNode>,
}

/// Child node of a built unit tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyNode {
    StorageGroup {
        group: StorageGroup,
        children: Vec<TopologyNode>,
    },
    CellGroup {
        group: CellGroup,
    },
}

impl TopologyNode {
    pub fn id(&self) -> NodeId {
        match self {
            Self::StorageGroup { group, .. } => group.id,
            Self::CellGroup { group } => group.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::StorageGroup { group, .. } => group.name.as_str(),
            Self::CellGroup { group } => group.name.as_str(),
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            Self::StorageGroup { group, .. } => group.alias.as_str(),
            Self::CellGroup { group } => group.alias.as_str(),
        }
    }

    /// Nested children. Always empty for cell groups.
    pub fn children(&self) -> &[TopologyNode] {
        match self {
            Self::StorageGroup { children, .. } => children.as_slice(),
            Self::CellGroup { .. } => &[],
        }
    }

    pub fn is_cell_group(&self) -> bool {
        matches!(self, Self::CellGroup { .. })
    }

    /// Counts this node and every descendant.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(TopologyNode::node_count)
            .sum::<usize>()
    }
}

impl UnitTree {
    /// Creates a unit tree without children.
    pub fn bare(unit: OrganizationalUnit) -> Self {
        Self {
            unit,
            children: Vec::new(),
        }
    }

    /// Counts every node below the unit (the unit itself excluded).
    pub fn node_count(&self) -> usize {
        self.children.iter().map(TopologyNode::node_count).sum()
    }

    /// Finds one descendant node by id, depth-first in child order.
    pub fn find(&self, id: NodeId) -> Option<&TopologyNode> {
        fn walk(nodes: &[TopologyNode], id: NodeId) -> Option<&TopologyNode> {
            for node in nodes {
                if node.id() == id {
                    return Some(node);
                }
                if let Some(found) = walk(node.children(), id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.children, id)
    }

    /// Returns names from the unit down to the node with `id`, inclusive.
    ///
    /// Returns `None` when the node is not part of this tree.
    pub fn path_to(&self, id: NodeId) -> Option<Vec<String>> {
        fn walk(nodes: &[TopologyNode], id: NodeId, trail: &mut Vec<String>) -> bool {
            for node in nodes {
                trail.push(node.name().to_string());
                if node.id() == id || walk(node.children(), id, trail) {
                    return true;
                }
                trail.pop();
            }
            false
        }

        let mut trail = vec![self.unit.name.clone()];
        if self.unit.id == id {
            return Some(trail);
        }
        if walk(&self.children, id, &mut trail) {
            Some(trail)
        } else {
            None
        }
    }
}
