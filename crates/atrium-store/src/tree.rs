// SPDX-License-Identifier: Apache-2.0
//! Eagerly loaded revision subtrees.
//!
//! The revision stores return whole trees — revision, floors, nodes,
//! outgoing edges — because both the publisher and the projections need
//! the full graph in one consistent read.

use atrium_core::revision::{Edge, Floor, Node, Revision};
use atrium_core::NodeId;

/// A revision with its owned subtree resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionTree {
    /// The revision row.
    pub revision: Revision,
    /// Owned floors with their nodes.
    pub floors: Vec<FloorTree>,
}

/// A floor with its nodes resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorTree {
    /// The floor row.
    pub floor: Floor,
    /// Nodes placed on this floor.
    pub nodes: Vec<NodeTree>,
}

/// A node with its outgoing edges resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTree {
    /// The node row.
    pub node: Node,
    /// Directed edges leaving this node.
    pub outgoing: Vec<Edge>,
}

impl RevisionTree {
    /// Orders the tree deterministically: floors by (level index, id),
    /// nodes by (creation time, id), edges by (creation time, id).
    ///
    /// The publish copy iterates in this order so repeated publishes of an
    /// unchanged draft produce structurally identical output.
    pub fn sort_deterministic(&mut self) {
        self.floors
            .sort_by_key(|f| (f.floor.level_index, f.floor.id));
        for floor in &mut self.floors {
            floor.nodes.sort_by_key(|n| (n.node.created_at, n.node.id));
            for node in &mut floor.nodes {
                node.outgoing.sort_by_key(|e| (e.created_at, e.id));
            }
        }
    }

    /// Iterates every node in the tree.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.floors
            .iter()
            .flat_map(|f| f.nodes.iter().map(|n| &n.node))
    }

    /// Iterates every edge in the tree.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.floors
            .iter()
            .flat_map(|f| f.nodes.iter().flat_map(|n| n.outgoing.iter()))
    }

    /// Total node count.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.floors.iter().map(|f| f.nodes.len()).sum()
    }

    /// Navigation entry fallback: the revision's start node when set and
    /// still present, otherwise the earliest-created node on the
    /// lowest-level floor.
    #[must_use]
    pub fn effective_start_node(&self) -> Option<NodeId> {
        if let Some(start) = self.revision.start_node {
            if self.nodes().any(|n| n.id == start) {
                return Some(start);
            }
        }
        self.floors
            .iter()
            .filter(|f| !f.nodes.is_empty())
            .min_by_key(|f| f.floor.level_index)
            .and_then(|floor| {
                floor
                    .nodes
                    .iter()
                    .min_by_key(|n| (n.node.created_at, n.node.id))
                    .map(|n| n.node.id)
            })
    }
}
