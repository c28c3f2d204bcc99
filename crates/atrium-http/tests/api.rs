// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs)]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use atrium_auth::token::TokenCodec;
use atrium_blob::FakeBlobStore;
use atrium_http::{router, AppState};
use atrium_service::audit::AuditTrail;
use atrium_service::media::MediaConfig;
use atrium_service::rbac::bootstrap_system_roles;
use atrium_store_mem::MemBackend;

struct TestApp {
    server: TestServer,
    backend: MemBackend,
}

async fn spawn_app() -> TestApp {
    let backend = MemBackend::new();
    let stores = backend.stores();
    bootstrap_system_roles(&stores).await.unwrap();
    let (recorder, _worker) = AuditTrail::spawn(stores.audit.clone(), 256);
    let state = AppState::new(
        stores,
        TokenCodec::new(b"test-secret"),
        Arc::new(FakeBlobStore::new()),
        MediaConfig {
            bucket: "panoramas".into(),
            cdn_base_url: "https://cdn.test".into(),
        },
        recorder,
    );
    let server = TestServer::new(router(state)).unwrap();
    TestApp { server, backend }
}

/// Registers a user+org and returns (token, user_id, org_id).
async fn register(app: &TestApp, name: &str, email: &str, org: &str) -> (String, String, String) {
    let res = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "fullName": name,
            "email": email,
            "password": "pw12345678",
            "organizationName": org,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    let data = &body["data"];
    (
        data["accessToken"].as_str().unwrap().to_owned(),
        data["user"]["id"].as_str().unwrap().to_owned(),
        data["user"]["organizations"][0]["organizationId"]
            .as_str()
            .unwrap()
            .to_owned(),
    )
}

async fn create_venue(app: &TestApp, token: &str, name: &str) -> (String, String) {
    let res = app
        .server
        .post("/api/v1/venues")
        .authorization_bearer(token)
        .json(&json!({ "name": name }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    (
        body["data"]["id"].as_str().unwrap().to_owned(),
        body["data"]["slug"].as_str().unwrap().to_owned(),
    )
}

async fn upload_panorama(app: &TestApp, token: &str) -> String {
    let res = app
        .server
        .post("/api/v1/media/upload-init")
        .authorization_bearer(token)
        .json(&json!({
            "fileName": "pano.jpg",
            "fileType": "image/jpeg",
            "category": "panorama",
            "fileSize": 2048,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    let asset_id = body["data"]["assetId"].as_str().unwrap().to_owned();
    let res = app
        .server
        .post("/api/v1/media/confirm")
        .authorization_bearer(token)
        .json(&json!({ "assetId": asset_id, "width": 8192, "height": 4096 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    asset_id
}

async fn create_floor(app: &TestApp, token: &str, venue_id: &str, level: i32) -> String {
    let res = app
        .server
        .post(&format!("/api/v1/editor/floors?venue_id={venue_id}"))
        .authorization_bearer(token)
        .json(&json!({
            "name": format!("L{level}"),
            "levelIndex": level,
            "width": 1000,
            "height": 500,
            "pixelsPerMeter": 10.0,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    body["data"]["id"].as_str().unwrap().to_owned()
}

async fn create_node(app: &TestApp, token: &str, floor_id: &str, x: f64, y: f64) -> String {
    let pano = upload_panorama(app, token).await;
    let res = app
        .server
        .post("/api/v1/editor/nodes")
        .authorization_bearer(token)
        .json(&json!({
            "floorId": floor_id,
            "x": x,
            "y": y,
            "panoramaAssetId": pano,
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    body["data"]["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn register_then_login() {
    let app = spawn_app().await;
    let res = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "fullName": "A",
            "email": "a@x.io",
            "password": "pw12345678",
            "organizationName": "Org",
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    assert_eq!(body["success"], true);
    assert!(!body["data"]["accessToken"].as_str().unwrap().is_empty());
    assert_eq!(body["data"]["user"]["organizations"][0]["roleName"], "Owner");

    // Duplicate email conflicts.
    let res = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "fullName": "A2",
            "email": "a@x.io",
            "password": "pw12345678",
            "organizationName": "Org2",
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CONFLICT);

    let res = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "a@x.io", "password": "pw12345678" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let token = body["data"]["accessToken"].as_str().unwrap();
    let claims = TokenCodec::new(b"test-secret").verify(token).unwrap();
    assert!(claims
        .perms
        .contains(&atrium_core::rbac::PermissionKey::GraphPublish));

    let res = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "a@x.io", "password": "wrong-password" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn edit_publish_manifest_flow() {
    let app = spawn_app().await;
    let (token, _, _) = register(&app, "A", "a@x.io", "Org").await;
    let (venue_id, slug) = create_venue(&app, &token, "Grand Mall").await;

    let floor_id = create_floor(&app, &token, &venue_id, 1).await;
    let n1 = create_node(&app, &token, &floor_id, 100.0, 100.0).await;
    let n2 = create_node(&app, &token, &floor_id, 200.0, 200.0).await;

    let res = app
        .server
        .post("/api/v1/editor/connections")
        .authorization_bearer(&token)
        .json(&json!({ "fromNodeId": n1, "toNodeId": n2 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    // No manifest until the first publish.
    let res = app.server.get(&format!("/api/v1/venues/{slug}/manifest")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = app
        .server
        .post(&format!("/api/v1/editor/{venue_id}/publish"))
        .authorization_bearer(&token)
        .json(&json!({ "note": "v1" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = app.server.get(&format!("/api/v1/venues/{slug}/manifest")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let doc: Value = res.json();
    assert_eq!(doc["floors"].as_array().unwrap().len(), 1);
    let nodes = doc["floors"][0]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);

    let first = nodes
        .iter()
        .find(|n| n["x"] == 100)
        .expect("node at x=100 present");
    let neighbor = &first["neighbors"][0];
    assert!((neighbor["heading"].as_f64().unwrap() - 135.0).abs() < 1e-4);
    assert!((neighbor["distance"].as_f64().unwrap() - 141.42).abs() < 0.01);
    assert_eq!(neighbor["type"], "walk");
    assert!(first["panorama"].as_str().unwrap().starts_with("https://cdn.test/"));
    assert_eq!(doc["startNodeId"], first["id"]);

    // Revision history shows the draft plus the published copy.
    let res = app
        .server
        .get(&format!("/api/v1/editor/{venue_id}/revisions"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let statuses: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["status"].as_str().unwrap())
        .collect();
    assert!(statuses.contains(&"draft"));
    assert!(statuses.contains(&"published"));
}

#[tokio::test]
async fn publish_failure_leaves_no_trace() {
    use atrium_core::revision::{Edge, EdgeKind, RevisionStatus};
    use atrium_core::{EdgeId, NodeId};
    use atrium_store::{GraphWriteStore, RevisionStore, VenueStore};
    use std::str::FromStr as _;

    let app = spawn_app().await;
    let (token, _, _) = register(&app, "A", "a@x.io", "Org").await;
    let (venue_id, slug) = create_venue(&app, &token, "Mall").await;
    let floor_id = create_floor(&app, &token, &venue_id, 1).await;
    let n1 = create_node(&app, &token, &floor_id, 10.0, 10.0).await;

    // Fault injection: an edge whose destination was never created, so
    // pass 2 of the deep-copy aborts.
    let from = NodeId::from_uuid(uuid::Uuid::from_str(&n1).unwrap());
    app.backend
        .insert_edge(&Edge {
            id: EdgeId::generate(),
            from_node: from,
            to_node: NodeId::generate(),
            heading: 0.0,
            distance: 0.0,
            kind: EdgeKind::Walk,
            is_active: true,
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let res = app
        .server
        .post(&format!("/api/v1/editor/{venue_id}/publish"))
        .authorization_bearer(&token)
        .json(&json!({ "note": "broken" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    // Live pointer unchanged, no published revision rows.
    let venue_uuid = atrium_core::VenueId::from_uuid(uuid::Uuid::from_str(&venue_id).unwrap());
    let venue = app.backend.by_id(venue_uuid).await.unwrap().unwrap();
    assert_eq!(venue.live_revision, None);
    let history = app.backend.history(venue_uuid).await.unwrap();
    assert!(history.iter().all(|r| r.status != RevisionStatus::Published));

    let res = app.server.get(&format!("/api/v1/venues/{slug}/manifest")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_invariant_over_http() {
    let app = spawn_app().await;
    let (token, user_id, org_id) = register(&app, "Solo", "solo@x.io", "Org").await;

    let res = app
        .server
        .get("/api/v1/roles")
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let viewer_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Viewer")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_owned();

    let res = app
        .server
        .delete(&format!("/api/v1/orgs/{org_id}/members/{user_id}"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(res.status_code(), StatusCode::CONFLICT);
    let body: Value = res.json();
    assert!(body["message"].as_str().unwrap().contains("OwnerRequired"));

    let res = app
        .server
        .patch(&format!("/api/v1/orgs/{org_id}/members"))
        .authorization_bearer(&token)
        .json(&json!({ "userId": user_id, "roleId": viewer_id }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn tenant_isolation() {
    let app = spawn_app().await;
    let (token_a, _, _org_a) = register(&app, "A", "a@x.io", "OrgA").await;
    let (_token_b, _, org_b) = register(&app, "B", "b@x.io", "OrgB").await;

    // Explicit foreign tenant header: refused.
    let res = app
        .server
        .get(&format!("/api/v1/orgs/{org_b}/members"))
        .authorization_bearer(&token_a)
        .add_header(
            HeaderName::from_static("x-tenant-id"),
            HeaderValue::from_str(&org_b).unwrap(),
        )
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    // Without the header the handler scopes to the claims' org, not the
    // URL parameter: caller A sees A's members even under B's path.
    let res = app
        .server
        .get(&format!("/api/v1/orgs/{org_b}/members"))
        .authorization_bearer(&token_a)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let members = body["data"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["email"], "a@x.io");
}

#[tokio::test]
async fn invalid_connections_are_rejected() {
    let app = spawn_app().await;
    let (token, _, _) = register(&app, "A", "a@x.io", "Org").await;
    let (venue_a, _) = create_venue(&app, &token, "A").await;
    let (venue_b, _) = create_venue(&app, &token, "B").await;
    let floor_a = create_floor(&app, &token, &venue_a, 1).await;
    let floor_b = create_floor(&app, &token, &venue_b, 1).await;
    let n1 = create_node(&app, &token, &floor_a, 10.0, 10.0).await;
    let n2 = create_node(&app, &token, &floor_b, 20.0, 20.0).await;

    // Self-loop.
    let res = app
        .server
        .post("/api/v1/editor/connections")
        .authorization_bearer(&token)
        .json(&json!({ "fromNodeId": n1, "toNodeId": n1 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    // Endpoints in different venues' drafts.
    let res = app
        .server
        .post("/api/v1/editor/connections")
        .authorization_bearer(&token)
        .json(&json!({ "fromNodeId": n1, "toNodeId": n2 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn permissions_gate_the_editor() {
    let app = spawn_app().await;
    let (owner_token, _, org_id) = register(&app, "Owner", "owner@x.io", "Org").await;
    let (venue_id, _) = create_venue(&app, &owner_token, "Mall").await;

    // Viewer joins via invitation.
    let res = app
        .server
        .get("/api/v1/roles")
        .authorization_bearer(&owner_token)
        .await;
    let body: Value = res.json();
    let viewer_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Viewer")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_owned();
    let res = app
        .server
        .post(&format!("/api/v1/orgs/{org_id}/invite"))
        .authorization_bearer(&owner_token)
        .json(&json!({ "email": "viewer@x.io", "roleId": viewer_id }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    let invite_token = body["data"]["token"].as_str().unwrap().to_owned();

    let res = app
        .server
        .post("/api/v1/auth/invite/accept")
        .json(&json!({
            "token": invite_token,
            "password": "pw12345678",
            "fullName": "Viewer",
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let viewer_token = body["data"]["accessToken"].as_str().unwrap().to_owned();

    // Viewers can read the editor projection but not mutate or publish.
    let res = app
        .server
        .post(&format!("/api/v1/editor/floors?venue_id={venue_id}"))
        .authorization_bearer(&viewer_token)
        .json(&json!({ "name": "G", "levelIndex": 0, "pixelsPerMeter": 1.0 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    let res = app
        .server
        .post(&format!("/api/v1/editor/{venue_id}/publish"))
        .authorization_bearer(&viewer_token)
        .json(&json!({ "note": "" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    // No token at all: unauthorized.
    let res = app.server.get("/api/v1/venues").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn audit_log_records_and_paginates() {
    let app = spawn_app().await;
    let (token, _, _) = register(&app, "A", "a@x.io", "Org").await;
    for i in 0..3 {
        create_venue(&app, &token, &format!("Venue {i}")).await;
    }

    // The audit worker writes asynchronously; wait for it to catch up.
    let mut entries = Vec::new();
    for _ in 0..50 {
        let res = app
            .server
            .get("/api/v1/audit-logs?limit=2")
            .authorization_bearer(&token)
            .await;
        assert_eq!(res.status_code(), StatusCode::OK);
        let body: Value = res.json();
        entries = body["data"]["entries"].as_array().unwrap().clone();
        if entries.len() == 2 && body["data"]["nextCursor"].is_string() {
            let cursor = body["data"]["nextCursor"].as_str().unwrap().to_owned();
            let res = app
                .server
                .get(&format!("/api/v1/audit-logs?limit=10&cursor={cursor}"))
                .authorization_bearer(&token)
                .await;
            let body: Value = res.json();
            let rest = body["data"]["entries"].as_array().unwrap();
            assert!(!rest.is_empty());
            assert!(rest.iter().all(|e| e["action"] == "venue.create"));
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(entries.len() >= 2, "audit entries never appeared");
}
