//! Hierarchical search matching over built trees.
//!
//! # Responsibility
//! - Decide per-node visibility for a free-text query.
//! - Propagate descendant hits upward so matched branches auto-expand.
//!
//! # Invariants
//! - Matching is case-insensitive substring containment on name and alias.
//! - An empty (or blank) query matches every node and highlights none.
//! - Units, topology nodes and placement nodes share one matching path.
//! - Walks cover the whole tree: built trees are owned and acyclic, the
//!   builders carry the cycle guards.

use crate::model::instance::PlacementNode;
use crate::model::topology::{TopologyNode, UnitTree};
use crate::model::NodeId;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Borrowed view of any node the matcher can walk.
#[derive(Debug, Clone, Copy)]
pub enum SearchNode<'a> {
    Unit(&'a UnitTree),
    Topology(&'a TopologyNode),
    Placement(&'a PlacementNode),
}

/// Tree node shape the matcher can walk.
pub trait SearchableNode {
    fn node_id(&self) -> NodeId;
    fn node_name(&self) -> &str;
    fn node_alias(&self) -> &str;
    fn child_nodes(&self) -> Vec<SearchNode<'_>>;
}

impl SearchableNode for UnitTree {
    fn node_id(&self) -> NodeId {
        self.unit.id
    }

    fn node_name(&self) -> &str {
        self.unit.name.as_str()
    }

    fn node_alias(&self) -> &str {
        self.unit.alias.as_str()
    }

    fn child_nodes(&self) -> Vec<SearchNode<'_>> {
        self.children.iter().map(SearchNode::Topology).collect()
    }
}

impl SearchableNode for TopologyNode {
    fn node_id(&self) -> NodeId {
        self.id()
    }

    fn node_name(&self) -> &str {
        self.name()
    }

    fn node_alias(&self) -> &str {
        self.alias()
    }

    fn child_nodes(&self) -> Vec<SearchNode<'_>> {
        self.children().iter().map(SearchNode::Topology).collect()
    }
}

impl SearchableNode for PlacementNode {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn node_name(&self) -> &str {
        self.name.as_str()
    }

    fn node_alias(&self) -> &str {
        self.alias.as_str()
    }

    fn child_nodes(&self) -> Vec<SearchNode<'_>> {
        self.children.iter().map(SearchNode::Placement).collect()
    }
}

impl SearchableNode for SearchNode<'_> {
    fn node_id(&self) -> NodeId {
        match self {
            Self::Unit(tree) => tree.node_id(),
            Self::Topology(node) => node.node_id(),
            Self::Placement(node) => node.node_id(),
        }
    }

    fn node_name(&self) -> &str {
        match self {
            Self::Unit(tree) => tree.node_name(),
            Self::Topology(node) => node.node_name(),
            Self::Placement(node) => node.node_name(),
        }
    }

    fn node_alias(&self) -> &str {
        match self {
            Self::Unit(tree) => tree.node_alias(),
            Self::Topology(node) => node.node_alias(),
            Self::Placement(node) => node.node_alias(),
        }
    }

    fn child_nodes(&self) -> Vec<SearchNode<'_>> {
        match self {
            Self::Unit(tree) => tree.child_nodes(),
            Self::Topology(node) => node.child_nodes(),
            Self::Placement(node) => node.child_nodes(),
        }
    }
}

/// Compiled free-text query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    text: String,
    pattern: Option<Regex>,
}

impl SearchQuery {
    /// Trims `text`; a blank query matches everything.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into().trim().to_string();
        // Escaped literal, so compilation cannot fail short of the size limit.
        let pattern = if text.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(&text))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Self { text, pattern }
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn matches_text(&self, value: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(value),
            None if self.text.is_empty() => true,
            None => value.to_lowercase().contains(&self.text.to_lowercase()),
        }
    }
}

/// Render decision for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeVisibility {
    /// Node is rendered under the active query.
    pub visible: bool,
    /// Node itself matched a non-empty query.
    pub highlighted: bool,
    /// Node must be expanded because a descendant matched.
    pub expanded: bool,
}

/// Tests the node's own name and alias.
pub fn matches_self<N: SearchableNode + ?Sized>(node: &N, query: &SearchQuery) -> bool {
    query.is_empty() || query.matches_text(node.node_name()) || query.matches_text(node.node_alias())
}

/// Tests the node or any descendant, depth-first.
pub fn subtree_matches<N: SearchableNode + ?Sized>(node: &N, query: &SearchQuery) -> bool {
    matches_self(node, query) || descendant_matches(node, query)
}

/// Tests whether any descendant (the node itself excluded) matches.
pub fn descendant_matches<N: SearchableNode + ?Sized>(node: &N, query: &SearchQuery) -> bool {
    node.child_nodes()
        .iter()
        .any(|child| subtree_matches(child, query))
}

/// Computes the render decision for one node.
pub fn node_visibility<N: SearchableNode + ?Sized>(node: &N, query: &SearchQuery) -> NodeVisibility {
    if query.is_empty() {
        return NodeVisibility {
            visible: true,
            highlighted: false,
            expanded: false,
        };
    }
    let highlighted = matches_self(node, query);
    let expanded = descendant_matches(node, query);
    NodeVisibility {
        visible: highlighted || expanded,
        highlighted,
        expanded,
    }
}

/// Ids of every root and node that must be force-expanded for `query`.
///
/// Empty for an empty query.
pub fn expanded_ids<N: SearchableNode>(roots: &[N], query: &SearchQuery) -> HashSet<NodeId> {
    let mut ids = HashSet::new();
    if query.is_empty() {
        return ids;
    }
    for root in roots {
        collect_expanded(root, query, &mut ids);
    }
    ids
}

/// Returns whether `node`'s subtree matches, recording expanded ancestors.
fn collect_expanded<N: SearchableNode + ?Sized>(
    node: &N,
    query: &SearchQuery,
    ids: &mut HashSet<NodeId>,
) -> bool {
    let mut any_child = false;
    for child in node.child_nodes() {
        any_child |= collect_expanded(&child, query, ids);
    }
    if any_child {
        ids.insert(node.node_id());
    }
    any_child || matches_self(node, query)
}

/// Prunes trees to the nodes visible under `query`.
///
/// Units are kept when they match or contain a match. A matched node keeps
/// only its matching descendants.
pub fn filter_tree(trees: &[UnitTree], query: &SearchQuery) -> Vec<UnitTree> {
    if query.is_empty() {
        return trees.to_vec();
    }
    trees
        .iter()
        .filter(|tree| subtree_matches(*tree, query))
        .map(|tree| UnitTree {
            unit: tree.unit.clone(),
            children: prune(&tree.children, query),
        })
        .collect()
}

fn prune(nodes: &[TopologyNode], query: &SearchQuery) -> Vec<TopologyNode> {
    nodes
        .iter()
        .filter(|node| subtree_matches(*node, query))
        .map(|node| match node {
            TopologyNode::StorageGroup { group, children } => TopologyNode::StorageGroup {
                group: group.clone(),
                children: prune(children, query),
            },
            TopologyNode::CellGroup { group } => TopologyNode::CellGroup {
                group: group.clone(),
            },
        })
        .collect()
}
