//! In-memory entity store.
//!
//! Uses `DashMap<kind, IndexMap<id, Entity>>` for thread-safe access
//! without an outer lock; the inner `IndexMap` keeps insertion order
//! so unsorted scans stay deterministic. Suitable for tests and small
//! deployments.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::instrument;

use sard_domain::query::SortDirection;
use sard_domain::{Entity, EntityStore, Linkage, QuerySpec, StoreError, StoreResult};

/// In-memory implementation of [`EntityStore`].
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    entities: DashMap<String, IndexMap<String, Entity>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed an entity directly, bypassing the engine's permission
    /// checks. For tests and fixtures.
    pub fn seed(&self, entity: Entity) {
        self.entities
            .entry(entity.kind.clone())
            .or_default()
            .insert(entity.id.clone(), entity);
    }

    fn with_entity<R>(
        &self,
        kind: &str,
        id: &str,
        f: impl FnOnce(&mut Entity) -> R,
    ) -> StoreResult<R> {
        let mut bucket = self
            .entities
            .get_mut(kind)
            .ok_or_else(|| not_found(kind, id))?;
        let entity = bucket.get_mut(id).ok_or_else(|| not_found(kind, id))?;
        let result = f(entity);
        entity.updated_at = Utc::now();
        Ok(result)
    }
}

fn not_found(kind: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

fn matches_filters(entity: &Entity, spec: &QuerySpec) -> bool {
    spec.filters
        .iter()
        .all(|(field, value)| entity.attributes.get(field) == Some(value))
}

/// Attribute comparison for sorting. JSON values have no total order;
/// numbers compare numerically, everything else by string form.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    #[instrument(skip(self))]
    async fn find_one(&self, kind: &str, id: &str) -> StoreResult<Option<Entity>> {
        Ok(self
            .entities
            .get(kind)
            .and_then(|bucket| bucket.get(id).cloned()))
    }

    #[instrument(skip(self, spec))]
    async fn find_and_count(
        &self,
        kind: &str,
        spec: &QuerySpec,
    ) -> StoreResult<(Vec<Entity>, usize)> {
        let mut matched: Vec<Entity> = match self.entities.get(kind) {
            Some(bucket) => bucket
                .values()
                .filter(|e| matches_filters(e, spec))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        if let Some((field, direction)) = &spec.sort {
            matched.sort_by(|a, b| {
                let ord = compare_values(a.attributes.get(field), b.attributes.get(field));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        let total = matched.len();
        let page = matched
            .into_iter()
            .skip(spec.offset)
            .take(spec.limit)
            .collect();
        Ok((page, total))
    }

    #[instrument(skip(self, entity), fields(kind = %entity.kind, id = %entity.id))]
    async fn create(&self, entity: Entity) -> StoreResult<Entity> {
        let mut bucket = self.entities.entry(entity.kind.clone()).or_default();
        if bucket.contains_key(&entity.id) {
            return Err(StoreError::Conflict {
                kind: entity.kind.clone(),
                id: entity.id.clone(),
            });
        }
        bucket.insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

    #[instrument(skip(self, attrs))]
    async fn update(&self, kind: &str, id: &str, attrs: Map<String, Value>) -> StoreResult<Entity> {
        self.with_entity(kind, id, |entity| {
            for (key, value) in attrs {
                // Merge semantics: null removes the attribute.
                if value.is_null() {
                    entity.attributes.remove(&key);
                } else {
                    entity.attributes.insert(key, value);
                }
            }
            entity.clone()
        })
    }

    #[instrument(skip(self))]
    async fn destroy(&self, kind: &str, id: &str) -> StoreResult<()> {
        let mut bucket = self
            .entities
            .get_mut(kind)
            .ok_or_else(|| not_found(kind, id))?;
        bucket
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(kind, id))
    }

    #[instrument(skip(self, ids))]
    async fn add_related(
        &self,
        kind: &str,
        id: &str,
        rel: &str,
        ids: &[String],
    ) -> StoreResult<()> {
        self.with_entity(kind, id, |entity| {
            let linkage = entity
                .relationships
                .entry(rel.to_string())
                .or_insert_with(|| Linkage::Many(Vec::new()));
            match linkage {
                Linkage::Many(existing) => {
                    // Set semantics: adding a linked id is a no-op.
                    for new_id in ids {
                        if !existing.contains(new_id) {
                            existing.push(new_id.clone());
                        }
                    }
                    Ok(())
                }
                Linkage::One(_) => Err(StoreError::InvalidInput {
                    message: format!("relationship '{rel}' is to-one; use set_related"),
                }),
            }
        })?
    }

    #[instrument(skip(self, linkage))]
    async fn set_related(
        &self,
        kind: &str,
        id: &str,
        rel: &str,
        linkage: Linkage,
    ) -> StoreResult<()> {
        self.with_entity(kind, id, |entity| {
            let linkage = match linkage {
                Linkage::Many(ids) => {
                    let mut deduped = Vec::with_capacity(ids.len());
                    for id in ids {
                        if !deduped.contains(&id) {
                            deduped.push(id);
                        }
                    }
                    Linkage::Many(deduped)
                }
                one => one,
            };
            entity.relationships.insert(rel.to_string(), linkage);
        })
    }

    #[instrument(skip(self, ids))]
    async fn remove_related(
        &self,
        kind: &str,
        id: &str,
        rel: &str,
        ids: &[String],
    ) -> StoreResult<()> {
        self.with_entity(kind, id, |entity| {
            if let Some(Linkage::Many(existing)) = entity.relationships.get_mut(rel) {
                existing.retain(|linked| !ids.contains(linked));
            }
        })
    }
}
