//! Bearer-token authentication.
//!
//! Authentication is a collaborator, not part of the engine: the
//! [`Authenticator`] trait resolves a bearer token to an [`Actor`]
//! with its granted scope set before any engine code runs. Requests
//! without an `Authorization` header proceed anonymously (empty scope
//! set); requests with an unknown token are rejected outright.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use dashmap::DashMap;

use sard_domain::{Actor, EntityStore};

use crate::errors::ApiError;
use crate::http::state::AppState;

/// Resolves a bearer token to an actor.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// `None` means the token is unknown or revoked.
    async fn resolve(&self, token: &str) -> Option<Actor>;
}

/// In-memory token table.
#[derive(Debug, Default)]
pub struct MemoryAuthenticator {
    tokens: DashMap<String, Actor>,
}

impl MemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, token: impl Into<String>, actor: Actor) {
        self.tokens.insert(token.into(), actor);
    }
}

#[async_trait]
impl Authenticator for MemoryAuthenticator {
    async fn resolve(&self, token: &str) -> Option<Actor> {
        self.tokens.get(token).map(|actor| actor.clone())
    }
}

/// Extractor producing the request's actor.
pub struct RequestAuth(pub Actor);

#[async_trait]
impl<S: EntityStore> FromRequestParts<Arc<AppState<S>>> for RequestAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(RequestAuth(Actor::anonymous()));
        };
        let header = header
            .to_str()
            .map_err(|_| ApiError::unauthorized("malformed authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("expected a bearer token"))?;
        match state.authenticator.resolve(token).await {
            Some(actor) => Ok(RequestAuth(actor)),
            None => Err(ApiError::unauthorized("unknown token")),
        }
    }
}
