//! End-to-end CRUD flows over the HTTP surface.

mod common;

use axum::http::StatusCode;
use sard_storage::MemoryEntityStore;

use common::{
    assert_error_document, create_test_app, delete, get, patch_json, post_json, seed_rescue,
    ADMIN_TOKEN, DISPATCH_TOKEN,
};

#[tokio::test]
async fn create_fetch_update_flow() {
    let store = MemoryEntityStore::new_shared();

    // Create as a dispatcher.
    let (status, body) = post_json(
        create_test_app(&store),
        "/rescues",
        Some(DISPATCH_TOKEN),
        serde_json::json!({
            "data": {
                "type": "rescues",
                "attributes": {
                    "client": "CMDR Jameson",
                    "platform": "pc",
                    "status": "open"
                }
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["type"], "rescues");
    assert_eq!(body["data"]["attributes"]["client"], "CMDR Jameson");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Fetch it back.
    let (status, body) = get(
        create_test_app(&store),
        &format!("/rescues/{id}"),
        Some(DISPATCH_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["jsonapi"]["version"], "1.0");

    // Update the status.
    let (status, body) = patch_json(
        create_test_app(&store),
        &format!("/rescues/{id}"),
        Some(DISPATCH_TOKEN),
        serde_json::json!({
            "data": {
                "type": "rescues",
                "attributes": { "status": "closed" }
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["attributes"]["status"], "closed");
}

#[tokio::test]
async fn search_returns_pagination_meta() {
    let store = MemoryEntityStore::new_shared();
    seed_rescue(&store, "r1");
    seed_rescue(&store, "r2");
    seed_rescue(&store, "r3");

    let (status, body) = get(
        create_test_app(&store),
        "/rescues?limit=2",
        Some(DISPATCH_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["count"], 2);
    assert_eq!(body["meta"]["limit"], 2);
    assert_eq!(body["meta"]["offset"], 0);
}

#[tokio::test]
async fn search_filters_by_attribute() {
    let store = MemoryEntityStore::new_shared();
    seed_rescue(&store, "r-pc");
    let xbox = sard_domain::Entity::new("rescues", "r-xb")
        .with_attribute("client", serde_json::json!("CMDR Ryder"))
        .with_attribute("platform", serde_json::json!("xb"));
    store.seed(xbox);

    let (status, body) = get(
        create_test_app(&store),
        "/rescues?platform=xb",
        Some(DISPATCH_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "r-xb");
}

#[tokio::test]
async fn delete_requires_elevated_grant() {
    let store = MemoryEntityStore::new_shared();
    seed_rescue(&store, "r1");

    // A dispatcher without the sudo grant may not delete.
    let (status, body) = delete(create_test_app(&store), "/rescues/r1", Some(DISPATCH_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error_document(&body);

    // Admin may; the confirmation document carries bare linkage.
    let (status, body) = delete(create_test_app(&store), "/rescues/r1", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["type"], "rescues");
    assert_eq!(body["data"]["id"], "r1");
    assert!(body["data"].get("attributes").is_none());

    let (status, _) = get(create_test_app(&store), "/rescues/r1", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_missing_required_fields_is_unprocessable() {
    let store = MemoryEntityStore::new_shared();

    let (status, body) = post_json(
        create_test_app(&store),
        "/rescues",
        Some(DISPATCH_TOKEN),
        serde_json::json!({
            "data": { "type": "rescues", "attributes": { "platform": "pc" } }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_error_document(&body);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors
        .iter()
        .any(|e| e["source"]["pointer"] == "/data/attributes/client"));
}

#[tokio::test]
async fn create_with_wrong_type_is_unprocessable() {
    let store = MemoryEntityStore::new_shared();

    let (status, body) = post_json(
        create_test_app(&store),
        "/rescues",
        Some(DISPATCH_TOKEN),
        serde_json::json!({
            "data": { "type": "rats", "attributes": { "client": "x", "platform": "pc" } }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_error_document(&body);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors[0]["source"]["pointer"], "/data");
}

#[tokio::test]
async fn anonymous_update_is_unauthorized() {
    let store = MemoryEntityStore::new_shared();
    seed_rescue(&store, "r1");

    let (status, body) = patch_json(
        create_test_app(&store),
        "/rescues/r1",
        None,
        serde_json::json!({
            "data": { "type": "rescues", "attributes": { "status": "closed" } }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_document(&body);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let store = MemoryEntityStore::new_shared();
    let (status, body) = get(
        create_test_app(&store),
        "/rescues/missing",
        Some(DISPATCH_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_document(&body);
}

#[tokio::test]
async fn unknown_kind_is_not_found() {
    let store = MemoryEntityStore::new_shared();
    let (status, body) = get(create_test_app(&store), "/starports", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_document(&body);
}
