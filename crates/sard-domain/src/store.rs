//! The storage collaborator interface.
//!
//! The engine treats every store call as atomic-or-failed and keeps no
//! cross-request state of its own; consistency under concurrent
//! writers is the store's concern. Implementations live outside this
//! crate (`sard-storage` ships the in-memory backend).

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::entity::{Entity, Linkage};
use crate::query::QuerySpec;

/// Storage-level errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("{kind} already exists: {id}")]
    Conflict { kind: String, id: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract entity storage.
///
/// Implementations must be thread-safe and honor set semantics for
/// `add_related`: adding an id that is already linked leaves the
/// linkage unchanged.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    /// Fetch one entity by primary key, `None` if absent.
    async fn find_one(&self, kind: &str, id: &str) -> StoreResult<Option<Entity>>;

    /// Filtered, sorted, paginated scan. Returns the page of rows and
    /// the total match count before pagination.
    async fn find_and_count(&self, kind: &str, spec: &QuerySpec)
        -> StoreResult<(Vec<Entity>, usize)>;

    /// Persist a new entity; `Conflict` if the id is taken.
    async fn create(&self, entity: Entity) -> StoreResult<Entity>;

    /// Merge the given attributes into an existing entity. A `null`
    /// value removes the attribute.
    async fn update(&self, kind: &str, id: &str, attrs: Map<String, Value>)
        -> StoreResult<Entity>;

    async fn destroy(&self, kind: &str, id: &str) -> StoreResult<()>;

    /// Add ids to a to-many relationship (set semantics).
    async fn add_related(&self, kind: &str, id: &str, rel: &str, ids: &[String])
        -> StoreResult<()>;

    /// Replace a relationship's linkage wholesale.
    async fn set_related(&self, kind: &str, id: &str, rel: &str, linkage: Linkage)
        -> StoreResult<()>;

    /// Remove ids from a to-many relationship.
    async fn remove_related(&self, kind: &str, id: &str, rel: &str, ids: &[String])
        -> StoreResult<()>;
}
