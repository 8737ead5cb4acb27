//! Route definitions and generic resource handlers.
//!
//! One set of handlers serves every registered kind: the first path
//! segment selects the descriptor from the registry and everything
//! else is delegated to [`GenericResource`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::error;

use sard_domain::{
    Document, EntityStore, GenericResource, LinkageData, QuerySpec, QueryTranslator,
    RelationshipDocument, RelationshipOp, WriteDocument,
};

use super::state::AppState;
use crate::auth::RequestAuth;
use crate::errors::{ApiError, ApiResult};

/// Default request body size limit (1MB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// JSON extractor that renders deserialization failures as JSON:API
/// error documents (400, or 413 for body limit violations).
pub struct JsonApiBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonApiBody<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonApiBody(value)),
            Err(rejection) => {
                let message = rejection.body_text();
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    Err(ApiError::payload_too_large(message))
                } else {
                    Err(ApiError::bad_request(message))
                }
            }
        }
    }
}

/// Creates the router with the default body size limit.
pub fn create_router<S: EntityStore>(state: AppState<S>) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

/// Creates the router with a custom body size limit.
pub fn create_router_with_body_limit<S: EntityStore>(
    state: AppState<S>,
    body_limit: usize,
) -> Router {
    let shared = Arc::new(state);
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check::<S>))
        .route("/:kind", get(search::<S>).post(create::<S>))
        .route(
            "/:kind/:id",
            get(find_by_id::<S>).patch(update::<S>).delete(delete::<S>),
        )
        .route(
            "/:kind/:id/relationships/:rel",
            get(relationship_view::<S>)
                .post(relationship_add::<S>)
                .patch(relationship_replace::<S>)
                .delete(relationship_remove::<S>),
        )
        .with_state(shared)
        .layer(RequestBodyLimitLayer::new(body_limit))
}

// ============================================================
// Probes
// ============================================================

/// Liveness probe; does not touch dependencies.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness probe: verifies the storage backend answers a trivial
/// query. Failure details are logged, not exposed.
async fn readiness_check<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    let probe = QuerySpec {
        limit: 1,
        ..QuerySpec::default()
    };
    match state.store.find_and_count("rescues", &probe).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "checks": { "storage": "ok" } })),
        ),
        Err(err) => {
            error!("readiness check failed: storage unavailable: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(
                    serde_json::json!({ "status": "not_ready", "checks": { "storage": "unavailable" } }),
                ),
            )
        }
    }
}

// ============================================================
// Generic resource handlers
// ============================================================

fn resource_for<S: EntityStore>(
    state: &AppState<S>,
    kind: &str,
) -> ApiResult<GenericResource<S>> {
    state
        .resource(kind)
        .ok_or_else(|| ApiError::not_found(format!("unknown resource type: {kind}")))
}

async fn search<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(kind): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    RequestAuth(actor): RequestAuth,
) -> ApiResult<impl IntoResponse> {
    let resource = resource_for(&state, &kind)?;
    let spec = QueryTranslator::new(state.bounds).translate(resource.descriptor(), &params);
    let (rows, total) = resource.search(&spec).await?;
    let page = QueryTranslator::page_meta(rows.len(), total, &spec);
    let doc = resource.render_many(&actor, &rows, page).await?;
    Ok(Json(doc))
}

async fn find_by_id<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
    RequestAuth(actor): RequestAuth,
) -> ApiResult<impl IntoResponse> {
    let resource = resource_for(&state, &kind)?;
    let entity = resource.find_by_id(&id).await?;
    let doc = resource.render_one(&actor, &entity).await?;
    Ok(Json(doc))
}

async fn create<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(kind): Path<String>,
    RequestAuth(actor): RequestAuth,
    JsonApiBody(body): JsonApiBody<WriteDocument>,
) -> ApiResult<impl IntoResponse> {
    let resource = resource_for(&state, &kind)?;
    let entity = resource.create(&actor, &body.data).await?;
    let doc = resource.render_one(&actor, &entity).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn update<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
    RequestAuth(actor): RequestAuth,
    JsonApiBody(body): JsonApiBody<WriteDocument>,
) -> ApiResult<impl IntoResponse> {
    let resource = resource_for(&state, &kind)?;
    let entity = resource.update(&actor, &id, &body.data).await?;
    let doc = resource.render_one(&actor, &entity).await?;
    Ok(Json(doc))
}

async fn delete<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
    RequestAuth(actor): RequestAuth,
) -> ApiResult<impl IntoResponse> {
    let resource = resource_for(&state, &kind)?;
    let ident = resource.delete(&actor, &id).await?;
    // Minimal confirmation: type and id, no attributes.
    Ok(Json(Document::of_linkage(LinkageData::One(Some(ident)))))
}

// ============================================================
// Relationship endpoints
// ============================================================

async fn relationship_view<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id, rel)): Path<(String, String, String)>,
    RequestAuth(actor): RequestAuth,
) -> ApiResult<impl IntoResponse> {
    let resource = resource_for(&state, &kind)?;
    let (descriptor, linkage) = resource.relationship_view(&actor, &id, &rel).await?;
    let data = LinkageData::from_linkage(descriptor.target, &linkage);
    Ok(Json(Document::of_linkage(data)))
}

async fn relationship_change<S: EntityStore>(
    state: &AppState<S>,
    actor: &sard_domain::Actor,
    kind: &str,
    id: &str,
    rel: &str,
    op: RelationshipOp,
    data: &LinkageData,
) -> ApiResult<Json<Document>> {
    let resource = resource_for(state, kind)?;
    let entity = resource
        .relationship_change(actor, id, rel, op, data)
        .await?;
    let doc = resource.render_one(actor, &entity).await?;
    Ok(Json(doc))
}

async fn relationship_add<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id, rel)): Path<(String, String, String)>,
    RequestAuth(actor): RequestAuth,
    JsonApiBody(body): JsonApiBody<RelationshipDocument>,
) -> ApiResult<impl IntoResponse> {
    relationship_change(
        &state,
        &actor,
        &kind,
        &id,
        &rel,
        RelationshipOp::Add,
        &body.data,
    )
    .await
}

async fn relationship_replace<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id, rel)): Path<(String, String, String)>,
    RequestAuth(actor): RequestAuth,
    JsonApiBody(body): JsonApiBody<RelationshipDocument>,
) -> ApiResult<impl IntoResponse> {
    relationship_change(
        &state,
        &actor,
        &kind,
        &id,
        &rel,
        RelationshipOp::Replace,
        &body.data,
    )
    .await
}

async fn relationship_remove<S: EntityStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id, rel)): Path<(String, String, String)>,
    RequestAuth(actor): RequestAuth,
    JsonApiBody(body): JsonApiBody<RelationshipDocument>,
) -> ApiResult<impl IntoResponse> {
    relationship_change(
        &state,
        &actor,
        &kind,
        &id,
        &rel,
        RelationshipOp::Remove,
        &body.data,
    )
    .await
}
