//! Shared test utilities for the SARD API test suites.

// Allow dead_code because helpers are used across different test files,
// but each test binary is analyzed independently.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use sard_api::auth::MemoryAuthenticator;
use sard_api::http::{create_router, AppState};
use sard_domain::{types, Actor, Entity, Linkage, ScopeSet};
use sard_storage::MemoryEntityStore;

/// Token holding every scope over every kind.
pub const ADMIN_TOKEN: &str = "token-admin";

/// Token for a dispatcher: group read/write on rescues and rats, no
/// sudo and no internal access.
pub const DISPATCH_TOKEN: &str = "token-dispatch";

/// Token for an ordinary user ("halsey") owning rat `rat-halsey`,
/// carrying only `.me` write scopes.
pub const SELF_TOKEN: &str = "token-halsey";

/// The rat id attached to the `SELF_TOKEN` actor.
pub const SELF_RAT: &str = "rat-halsey";

/// Token with read-only group access to rescues.
pub const READER_TOKEN: &str = "token-reader";

fn admin_actor() -> Actor {
    let mut scopes = ScopeSet::default();
    for kind in types::kinds() {
        for action in ["read", "write", "sudo", "internal"] {
            scopes.insert(format!("{kind}.{action}"));
        }
    }
    Actor::new("admin", scopes)
}

fn dispatch_actor() -> Actor {
    Actor::new(
        "dispatcher",
        ScopeSet::new(["rescues.read", "rescues.write", "rats.read", "rats.write"]),
    )
}

fn self_actor() -> Actor {
    Actor::new(
        "halsey",
        ScopeSet::new([
            "rescues.read",
            "rescues.write.me",
            "rats.read",
            "users.read.me",
            "users.write.me",
            "ships.read",
            "ships.write.me",
        ]),
    )
    .with_rats([SELF_RAT])
}

fn reader_actor() -> Actor {
    Actor::new("reader", ScopeSet::new(["rescues.read", "rats.read"]))
}

/// Create a test app over the given store, with the canned tokens
/// registered.
pub fn create_test_app(store: &Arc<MemoryEntityStore>) -> axum::Router {
    let authenticator = MemoryAuthenticator::new();
    authenticator.register(ADMIN_TOKEN, admin_actor());
    authenticator.register(DISPATCH_TOKEN, dispatch_actor());
    authenticator.register(SELF_TOKEN, self_actor());
    authenticator.register(READER_TOKEN, reader_actor());
    let state = AppState::new(Arc::clone(store), Arc::new(authenticator));
    create_router(state)
}

/// Seed a rescue with sensible defaults plus the given extras.
pub fn seed_rescue(store: &MemoryEntityStore, id: &str) -> Entity {
    let entity = Entity::new("rescues", id)
        .with_attribute("client", serde_json::json!("CMDR Jameson"))
        .with_attribute("platform", serde_json::json!("pc"))
        .with_attribute("status", serde_json::json!("open"));
    store.seed(entity.clone());
    entity
}

/// Seed a rescue assigned to the given rats.
pub fn seed_rescue_with_rats(store: &MemoryEntityStore, id: &str, rats: &[&str]) -> Entity {
    let entity = Entity::new("rescues", id)
        .with_attribute("client", serde_json::json!("CMDR Jameson"))
        .with_attribute("platform", serde_json::json!("pc"))
        .with_attribute("status", serde_json::json!("open"))
        .with_relationship(
            "rats",
            Linkage::Many(rats.iter().map(|r| r.to_string()).collect()),
        );
    store.seed(entity.clone());
    entity
}

pub fn seed_rat(store: &MemoryEntityStore, id: &str, name: &str) -> Entity {
    let entity = Entity::new("rats", id)
        .with_attribute("name", serde_json::json!(name))
        .with_attribute("platform", serde_json::json!("pc"));
    store.seed(entity.clone());
    entity
}

/// Send a request and return status plus parsed JSON body.
pub async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::json!({})
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::json!({ "raw_body": String::from_utf8_lossy(&bytes).to_string() })
        })
    };
    (status, json)
}

pub async fn get(
    app: axum::Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, token, None).await
}

pub async fn post_json(
    app: axum::Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, token, Some(body)).await
}

pub async fn patch_json(
    app: axum::Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PATCH", uri, token, Some(body)).await
}

pub async fn delete(
    app: axum::Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, token, None).await
}

pub async fn delete_json(
    app: axum::Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, token, Some(body)).await
}

/// Assert the JSON:API exclusivity invariant on an error response.
pub fn assert_error_document(json: &serde_json::Value) {
    assert!(
        json.get("errors").is_some(),
        "error response must carry errors: {json}"
    );
    assert!(
        json.get("data").is_none(),
        "error response must not carry data: {json}"
    );
}
