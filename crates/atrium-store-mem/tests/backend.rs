// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs)]

use chrono::{Duration, Utc};

use atrium_core::audit::AuditEntry;
use atrium_core::org::Membership;
use atrium_core::rbac::{Role, SystemRole};
use atrium_core::revision::{Edge, EdgeKind, Floor, Node, Revision, RevisionStatus};
use atrium_core::user::User;
use atrium_core::venue::Venue;
use atrium_core::{
    AssetId, AuditId, EdgeId, FloorId, MembershipId, NodeId, OrgId, RoleId, UserId, VenueId,
};
use atrium_store::{AuditQuery, StoreError};
use atrium_store_mem::MemBackend;

fn venue(org: OrgId) -> Venue {
    Venue {
        id: VenueId::generate(),
        org,
        name: "Mall".into(),
        slug: format!("mall-{}", VenueId::generate()),
        description: String::new(),
        live_revision: None,
        draft_revision: None,
        created_at: Utc::now(),
    }
}

fn draft(org: OrgId, venue: VenueId) -> Revision {
    Revision {
        id: atrium_core::RevisionId::generate(),
        org,
        venue,
        status: RevisionStatus::Draft,
        note: String::new(),
        start_node: None,
        created_by: UserId::generate(),
        created_at: Utc::now(),
    }
}

fn floor(revision: atrium_core::RevisionId, venue: VenueId, level: i32) -> Floor {
    Floor {
        id: FloorId::generate(),
        revision,
        venue,
        name: format!("L{level}"),
        level_index: level,
        map_image: None,
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
        area: None,
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

/// Seeds a venue with a one-floor, two-node, one-edge draft.
async fn seed_draft(backend: &MemBackend) -> (VenueId, NodeId, NodeId) {
    use atrium_store::{GraphWriteStore, OrgStore, RevisionStore, VenueStore};

    let org = OrgId::generate();
    OrgStore::insert(
        backend,
        &atrium_core::org::Organization {
            id: org,
            name: "Org".into(),
            slug: format!("org-{org}"),
            is_active: true,
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    let v = venue(org);
    let venue_id = v.id;
    VenueStore::insert(backend, &v).await.unwrap();

    let d = draft(org, venue_id);
    backend.create_draft(&d).await.unwrap();

    let f = floor(d.id, venue_id, 1);
    backend.insert_floor(&f).await.unwrap();
    let a = node(f.id, 100.0, 100.0);
    let b = node(f.id, 200.0, 200.0);
    backend.insert_node(&a).await.unwrap();
    backend.insert_node(&b).await.unwrap();
    backend.insert_edge(&edge(a.id, b.id)).await.unwrap();
    backend.insert_edge(&edge(b.id, a.id)).await.unwrap();

    (venue_id, a.id, b.id)
}

#[tokio::test]
async fn second_draft_is_rejected() {
    use atrium_store::RevisionStore;

    let backend = MemBackend::new();
    let (venue_id, _, _) = seed_draft(&backend).await;
    let tree = backend.draft_tree(venue_id).await.unwrap().unwrap();
    let err = backend
        .create_draft(&draft(tree.revision.org, venue_id))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::DraftExists);
}

#[tokio::test]
async fn publish_flips_live_pointer_and_keeps_draft() {
    use atrium_store::{RevisionStore, VenueStore};

    let backend = MemBackend::new();
    let (venue_id, _, _) = seed_draft(&backend).await;

    let published = backend
        .publish_draft(venue_id, "v1", UserId::generate())
        .await
        .unwrap();

    let venue = backend.by_id(venue_id).await.unwrap().unwrap();
    assert_eq!(venue.live_revision, Some(published));
    assert!(venue.draft_revision.is_some());
    assert_ne!(venue.draft_revision, Some(published));

    let live = backend.live_tree(venue_id).await.unwrap().unwrap();
    assert_eq!(live.revision.status, RevisionStatus::Published);
    assert_eq!(live.revision.note, "v1");
    assert_eq!(live.node_count(), 2);
    assert_eq!(live.edges().count(), 2);

    // Every live edge resolves within the live revision.
    let node_ids: Vec<NodeId> = live.nodes().map(|n| n.id).collect();
    for e in live.edges() {
        assert!(node_ids.contains(&e.from_node));
        assert!(node_ids.contains(&e.to_node));
    }
}

#[tokio::test]
async fn publish_without_draft_fails_no_draft() {
    use atrium_store::{OrgStore, RevisionStore, VenueStore};

    let backend = MemBackend::new();
    let org = OrgId::generate();
    OrgStore::insert(
        &backend,
        &atrium_core::org::Organization {
            id: org,
            name: "Org".into(),
            slug: format!("org-{org}"),
            is_active: true,
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();
    let v = venue(org);
    VenueStore::insert(&backend, &v).await.unwrap();

    let err = backend
        .publish_draft(v.id, "", UserId::generate())
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NoDraft);
}

#[tokio::test]
async fn failed_publish_leaves_no_trace() {
    use atrium_store::{GraphWriteStore, RevisionStore, VenueStore};

    let backend = MemBackend::new();
    let (venue_id, a, _) = seed_draft(&backend).await;

    // Fault injection: an edge whose destination is outside the draft.
    backend
        .insert_edge(&edge(a, NodeId::generate()))
        .await
        .unwrap();

    let before_history = backend.history(venue_id).await.unwrap();
    let err = backend
        .publish_draft(venue_id, "broken", UserId::generate())
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::DanglingEdge);

    let venue = backend.by_id(venue_id).await.unwrap().unwrap();
    assert_eq!(venue.live_revision, None);
    let after_history = backend.history(venue_id).await.unwrap();
    assert_eq!(before_history.len(), after_history.len());
    assert!(after_history
        .iter()
        .all(|r| r.status != RevisionStatus::Published));
}

#[tokio::test]
async fn delete_node_cascades_inbound_edges() {
    use atrium_store::{GraphWriteStore, RevisionStore};

    let backend = MemBackend::new();
    let (venue_id, a, b) = seed_draft(&backend).await;

    backend.delete_node(b).await.unwrap();

    let tree = backend.draft_tree(venue_id).await.unwrap().unwrap();
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.edges().count(), 0, "edge a→b and b→a both removed");
    assert!(tree.nodes().any(|n| n.id == a));
}

#[tokio::test]
async fn last_owner_cannot_be_removed_or_demoted() {
    use atrium_store::{MembershipStore, RoleStore, UserStore};

    let backend = MemBackend::new();
    let org = OrgId::generate();

    let owner_role = Role {
        id: RoleId::generate(),
        org: None,
        name: SystemRole::Owner.name().into(),
        description: String::new(),
        is_system: true,
        permissions: SystemRole::Owner.permissions(),
        created_at: Utc::now(),
    };
    let viewer_role = Role {
        id: RoleId::generate(),
        org: None,
        name: SystemRole::Viewer.name().into(),
        description: String::new(),
        is_system: true,
        permissions: vec![],
        created_at: Utc::now(),
    };
    RoleStore::insert(&backend, &owner_role).await.unwrap();
    RoleStore::insert(&backend, &viewer_role).await.unwrap();

    let user = User {
        id: UserId::generate(),
        email: "solo@x.io".into(),
        password_hash: String::new(),
        full_name: "Solo".into(),
        created_at: Utc::now(),
    };
    UserStore::insert(&backend, &user).await.unwrap();
    MembershipStore::insert(
        &backend,
        &Membership {
            id: MembershipId::generate(),
            org,
            user: user.id,
            role: owner_role.id,
            joined_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    assert_eq!(
        backend.remove(org, user.id).await.unwrap_err(),
        StoreError::LastOwner
    );
    assert_eq!(
        backend
            .update_role(org, user.id, viewer_role.id)
            .await
            .unwrap_err(),
        StoreError::LastOwner
    );

    // A second owner unblocks both mutations.
    let second = User {
        id: UserId::generate(),
        email: "second@x.io".into(),
        password_hash: String::new(),
        full_name: "Second".into(),
        created_at: Utc::now(),
    };
    UserStore::insert(&backend, &second).await.unwrap();
    MembershipStore::insert(
        &backend,
        &Membership {
            id: MembershipId::generate(),
            org,
            user: second.id,
            role: owner_role.id,
            joined_at: Utc::now(),
        },
    )
    .await
    .unwrap();
    backend
        .update_role(org, user.id, viewer_role.id)
        .await
        .unwrap();
    backend.remove(org, user.id).await.unwrap();
}

#[tokio::test]
async fn audit_pages_walk_the_full_set() {
    use atrium_store::AuditStore;

    let backend = MemBackend::new();
    let org = OrgId::generate();
    let base = Utc::now();
    for i in 0..5 {
        backend
            .append(&AuditEntry {
                id: AuditId::generate(),
                org,
                user: None,
                action: "venue.create".into(),
                entity: "venue".into(),
                entity_id: format!("v{i}"),
                details: serde_json::Value::Null,
                ip_address: String::new(),
                created_at: base + Duration::seconds(i),
            })
            .await
            .unwrap();
    }

    let first = backend
        .page(
            org,
            &AuditQuery {
                cursor: None,
                limit: 2,
                action: None,
                user: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(first.entries.len(), 2);
    assert_eq!(first.entries[0].entity_id, "v4", "newest first");
    let cursor = first.next_cursor.unwrap();

    let second = backend
        .page(
            org,
            &AuditQuery {
                cursor: atrium_store::cursor::AuditCursor::decode(&cursor),
                limit: 10,
                action: None,
                user: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(second.entries.len(), 3);
    assert!(second.next_cursor.is_none());
    assert_eq!(second.entries[0].entity_id, "v2");
}
