// SPDX-License-Identifier: Apache-2.0
//! The publish deep-copy planner.
//!
//! Publishing turns a draft into a new immutable published revision. The
//! copy itself is pure: given the loaded draft tree, [`PublishPlan::build`]
//! materializes every row the transaction must insert — fresh ids for the
//! revision, floors, and nodes; edges translated through the node id map;
//! media and area references preserved by id. Backends then execute the
//! plan inside their own transaction, so both the SQL and the in-memory
//! implementation share one copy algorithm.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use atrium_core::revision::{Edge, Floor, Node, Revision, RevisionStatus};
use atrium_core::{FloorId, NodeId, RevisionId, UserId};

use crate::error::StoreError;
use crate::tree::RevisionTree;

/// Every row a publish transaction inserts, plus the live-pointer target.
#[derive(Debug, Clone)]
pub struct PublishPlan {
    /// The new published revision row.
    pub revision: Revision,
    /// Copied floors, re-parented onto the new revision.
    pub floors: Vec<Floor>,
    /// Copied nodes, re-parented onto the copied floors.
    pub nodes: Vec<Node>,
    /// Copied edges with both endpoints translated to the new node ids.
    pub edges: Vec<Edge>,
}

impl PublishPlan {
    /// Plans the deep-copy of `draft`.
    ///
    /// Two passes: floors-then-nodes builds the old→new node id map, then
    /// edges are translated through it. An edge endpoint absent from the
    /// map means the stored tree violated its ownership invariant — the
    /// whole publish aborts with [`StoreError::DanglingEdge`] rather than
    /// silently dropping the edge.
    ///
    /// Copied floors, nodes, and edges keep their original creation
    /// timestamps so that republishing an unchanged draft is reproducible;
    /// only the revision row is stamped with `now`.
    pub fn build(
        draft: &RevisionTree,
        note: &str,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let mut ordered = draft.clone();
        ordered.sort_deterministic();

        let revision_id = RevisionId::generate();
        let mut floors = Vec::with_capacity(ordered.floors.len());
        let mut nodes = Vec::with_capacity(ordered.node_count());
        let mut node_id_map: BTreeMap<NodeId, NodeId> = BTreeMap::new();

        // Pass 1: floors, then their nodes.
        for floor_tree in &ordered.floors {
            let new_floor_id = FloorId::generate();
            let src = &floor_tree.floor;
            floors.push(Floor {
                id: new_floor_id,
                revision: revision_id,
                ..src.clone()
            });
            for node_tree in &floor_tree.nodes {
                let src = &node_tree.node;
                let new_node_id = NodeId::generate();
                node_id_map.insert(src.id, new_node_id);
                nodes.push(Node {
                    id: new_node_id,
                    floor: new_floor_id,
                    ..src.clone()
                });
            }
        }

        // Pass 2: edges, translated through the node id map.
        let mut edges = Vec::new();
        for floor_tree in &ordered.floors {
            for node_tree in &floor_tree.nodes {
                for edge in &node_tree.outgoing {
                    let (Some(&from), Some(&to)) = (
                        node_id_map.get(&edge.from_node),
                        node_id_map.get(&edge.to_node),
                    ) else {
                        return Err(StoreError::DanglingEdge);
                    };
                    edges.push(Edge {
                        id: atrium_core::EdgeId::generate(),
                        from_node: from,
                        to_node: to,
                        ..edge.clone()
                    });
                }
            }
        }

        // A start node that no longer resolves is dropped rather than
        // carried as a stale pointer.
        let start_node = ordered
            .revision
            .start_node
            .and_then(|id| node_id_map.get(&id).copied());

        let revision = Revision {
            id: revision_id,
            org: ordered.revision.org,
            venue: ordered.revision.venue,
            status: RevisionStatus::Published,
            note: note.to_owned(),
            start_node,
            created_by: actor,
            created_at: now,
        };

        Ok(Self {
            revision,
            floors,
            nodes,
            edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use atrium_core::revision::EdgeKind;
    use atrium_core::{AreaId, AssetId, EdgeId, OrgId, VenueId};
    use proptest::prelude::*;

    use super::*;
    use crate::tree::{FloorTree, NodeTree};

    fn draft_revision() -> Revision {
        Revision {
            id: RevisionId::generate(),
            org: OrgId::generate(),
            venue: VenueId::generate(),
            status: RevisionStatus::Draft,
            note: String::new(),
            start_node: None,
            created_by: UserId::generate(),
            created_at: Utc::now(),
        }
    }

    fn floor(revision: RevisionId, level: i32) -> Floor {
        Floor {
            id: FloorId::generate(),
            revision,
            venue: VenueId::generate(),
            name: format!("L{level}"),
            level_index: level,
            map_image: Some(AssetId::generate()),
            map_width: 1000,
            map_height: 500,
            pixels_per_meter: 10.0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn node(floor: FloorId, x: f64, y: f64) -> Node {
        Node {
            id: NodeId::generate(),
            floor,
            x,
            y,
            panorama_asset: AssetId::generate(),
            rotation_offset: 0.0,
            area: Some(AreaId::generate()),
            label: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn edge(from: NodeId, to: NodeId) -> Edge {
        Edge {
            id: EdgeId::generate(),
            from_node: from,
            to_node: to,
            heading: 135.0,
            distance: 141.42,
            kind: EdgeKind::Walk,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Two floors, three nodes, three edges (one cross-floor).
    fn sample_tree() -> RevisionTree {
        let revision = draft_revision();
        let f0 = floor(revision.id, 0);
        let f1 = floor(revision.id, 1);
        let a = node(f0.id, 100.0, 100.0);
        let b = node(f0.id, 200.0, 200.0);
        let c = node(f1.id, 50.0, 50.0);
        let edges_a = vec![edge(a.id, b.id), edge(a.id, c.id)];
        let edges_b = vec![edge(b.id, a.id)];
        RevisionTree {
            revision,
            floors: vec![
                FloorTree {
                    floor: f0,
                    nodes: vec![
                        NodeTree {
                            node: a,
                            outgoing: edges_a,
                        },
                        NodeTree {
                            node: b,
                            outgoing: edges_b,
                        },
                    ],
                },
                FloorTree {
                    floor: f1,
                    nodes: vec![NodeTree {
                        node: c,
                        outgoing: vec![],
                    }],
                },
            ],
        }
    }

    #[test]
    fn plan_copies_every_row_with_fresh_ids() {
        let tree = sample_tree();
        let plan = PublishPlan::build(&tree, "v1", UserId::generate(), Utc::now()).unwrap();

        assert_eq!(plan.revision.status, RevisionStatus::Published);
        assert_eq!(plan.revision.note, "v1");
        assert_eq!(plan.floors.len(), 2);
        assert_eq!(plan.nodes.len(), 3);
        assert_eq!(plan.edges.len(), 3);

        let old_node_ids: BTreeSet<_> = tree.nodes().map(|n| n.id).collect();
        assert!(plan.nodes.iter().all(|n| !old_node_ids.contains(&n.id)));
        let old_floor_ids: BTreeSet<_> = tree.floors.iter().map(|f| f.floor.id).collect();
        assert!(plan.floors.iter().all(|f| !old_floor_ids.contains(&f.id)));
        assert!(plan.floors.iter().all(|f| f.revision == plan.revision.id));
    }

    #[test]
    fn plan_preserves_media_and_area_references() {
        let tree = sample_tree();
        let plan = PublishPlan::build(&tree, "", UserId::generate(), Utc::now()).unwrap();

        let draft_panoramas: Vec<_> = {
            let mut ordered = tree.clone();
            ordered.sort_deterministic();
            ordered.nodes().map(|n| (n.panorama_asset, n.area)).collect()
        };
        let copied: Vec<_> = plan.nodes.iter().map(|n| (n.panorama_asset, n.area)).collect();
        assert_eq!(draft_panoramas, copied);

        let draft_maps: Vec<_> = {
            let mut ordered = tree.clone();
            ordered.sort_deterministic();
            ordered.floors.iter().map(|f| f.floor.map_image).collect()
        };
        let copied_maps: Vec<_> = plan.floors.iter().map(|f| f.map_image).collect();
        assert_eq!(draft_maps, copied_maps);
    }

    #[test]
    fn plan_translates_edges_referentially_completely() {
        let tree = sample_tree();
        let plan = PublishPlan::build(&tree, "", UserId::generate(), Utc::now()).unwrap();

        // Rebuild the old→new map from positions: nodes keep (x, y).
        let mut by_pos: BTreeMap<(u64, u64), NodeId> = BTreeMap::new();
        for n in &plan.nodes {
            by_pos.insert((n.x.to_bits(), n.y.to_bits()), n.id);
        }
        let old_pos: BTreeMap<NodeId, (u64, u64)> = tree
            .nodes()
            .map(|n| (n.id, (n.x.to_bits(), n.y.to_bits())))
            .collect();

        for old_edge in tree.edges() {
            let from = by_pos[&old_pos[&old_edge.from_node]];
            let to = by_pos[&old_pos[&old_edge.to_node]];
            let translated = plan
                .edges
                .iter()
                .find(|e| e.from_node == from && e.to_node == to)
                .unwrap();
            assert_eq!(translated.heading, old_edge.heading);
            assert_eq!(translated.distance, old_edge.distance);
            assert_eq!(translated.kind, old_edge.kind);
            assert_eq!(translated.is_active, old_edge.is_active);
        }
    }

    #[test]
    fn dangling_edge_aborts_the_plan() {
        let mut tree = sample_tree();
        // Point an edge at a node that is not part of the tree.
        tree.floors[0].nodes[0].outgoing[0].to_node = NodeId::generate();
        let err = PublishPlan::build(&tree, "", UserId::generate(), Utc::now()).unwrap_err();
        assert_eq!(err, StoreError::DanglingEdge);
    }

    #[test]
    fn start_node_is_translated_when_set() {
        let mut tree = sample_tree();
        let start = tree.floors[0].nodes[0].node.id;
        let start_pos = (
            tree.floors[0].nodes[0].node.x.to_bits(),
            tree.floors[0].nodes[0].node.y.to_bits(),
        );
        tree.revision.start_node = Some(start);
        let plan = PublishPlan::build(&tree, "", UserId::generate(), Utc::now()).unwrap();
        let translated = plan.revision.start_node.unwrap();
        let copied = plan.nodes.iter().find(|n| n.id == translated).unwrap();
        assert_eq!((copied.x.to_bits(), copied.y.to_bits()), start_pos);
    }

    #[test]
    fn stale_start_node_is_dropped() {
        let mut tree = sample_tree();
        tree.revision.start_node = Some(NodeId::generate());
        let plan = PublishPlan::build(&tree, "", UserId::generate(), Utc::now()).unwrap();
        assert!(plan.revision.start_node.is_none());
    }

    proptest! {
        /// Random trees: every draft edge whose endpoints exist maps to
        /// exactly one translated edge, and counts line up.
        #[test]
        fn plan_is_complete_for_arbitrary_trees(
            floor_count in 1_usize..4,
            nodes_per_floor in 1_usize..5,
            edge_seed in proptest::collection::vec((0_usize..20, 0_usize..20), 0..25),
        ) {
            let revision = draft_revision();
            let mut floors = Vec::new();
            let mut all_nodes = Vec::new();
            for level in 0..floor_count {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let f = floor(revision.id, level as i32);
                let mut nodes_on_floor = Vec::new();
                for i in 0..nodes_per_floor {
                    #[allow(clippy::cast_precision_loss)]
                    let n = node(f.id, i as f64 * 10.0, level as f64 * 10.0);
                    all_nodes.push(n.id);
                    nodes_on_floor.push(NodeTree { node: n, outgoing: vec![] });
                }
                floors.push(FloorTree { floor: f, nodes: nodes_on_floor });
            }
            let mut edge_count = 0_usize;
            for (from_idx, to_idx) in edge_seed {
                let from = all_nodes[from_idx % all_nodes.len()];
                let to = all_nodes[to_idx % all_nodes.len()];
                let owner = floors
                    .iter_mut()
                    .flat_map(|f| f.nodes.iter_mut())
                    .find(|n| n.node.id == from)
                    .unwrap();
                owner.outgoing.push(edge(from, to));
                edge_count += 1;
            }
            let tree = RevisionTree { revision, floors };
            let plan = PublishPlan::build(&tree, "", UserId::generate(), Utc::now()).unwrap();
            prop_assert_eq!(plan.nodes.len(), tree.node_count());
            prop_assert_eq!(plan.edges.len(), edge_count);
            // Every translated endpoint refers to a copied node.
            let copied: BTreeSet<_> = plan.nodes.iter().map(|n| n.id).collect();
            for e in &plan.edges {
                prop_assert!(copied.contains(&e.from_node));
                prop_assert!(copied.contains(&e.to_node));
            }
        }
    }
}
