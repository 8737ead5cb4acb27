//! The generic CRUD + relationship-change state machine.
//!
//! Every concrete resource kind is served by the same
//! [`GenericResource`]: the descriptor supplies the policy map, self
//! predicate, and relationship rules; the store supplies persistence.
//! A single request walks `fetched → permission-checked → (mutated)*
//! → re-fetched → rendered` and holds no state across requests.
//!
//! Mutations are best-effort across steps: when relationship
//! application fails after the primary write succeeded, the resource
//! is left primarily updated. The store may upgrade this to a
//! transaction without changing observable success-path behavior.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Map;
use tracing::debug;

use crate::document::{
    Document, LinkageData, RelationshipObject, ResourceIdentifier, WritePayload,
};
use crate::entity::{Entity, Linkage};
use crate::error::{DomainError, DomainResult};
use crate::events::{ChangeKind, ResourceEvent, ResourceListener};
use crate::permission::{Direction, PermissionContext};
use crate::policy::{Cardinality, RelationshipDescriptor, ResourceDescriptor};
use crate::query::{PageMeta, QuerySpec};
use crate::scope::Actor;
use crate::store::EntityStore;
use crate::types;
use crate::view::{EntityView, IncludedAccumulator};

/// Which relationship-change operation a request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipOp {
    Add,
    Replace,
    Remove,
}

/// One resource kind bound to a storage handle.
pub struct GenericResource<S: EntityStore> {
    descriptor: &'static ResourceDescriptor,
    store: Arc<S>,
    listener: Option<Arc<dyn ResourceListener>>,
}

impl<S: EntityStore> GenericResource<S> {
    pub fn new(descriptor: &'static ResourceDescriptor, store: Arc<S>) -> Self {
        Self {
            descriptor,
            store,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn ResourceListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        self.descriptor
    }

    // --------------------------------------------------------
    // Reads
    // --------------------------------------------------------

    /// Fetch by primary key. Read filtering happens at render time,
    /// not here.
    pub async fn find_by_id(&self, id: &str) -> DomainResult<Entity> {
        self.store
            .find_one(self.descriptor.kind, id)
            .await?
            .ok_or_else(|| DomainError::not_found(self.descriptor.kind, id))
    }

    pub async fn search(&self, spec: &QuerySpec) -> DomainResult<(Vec<Entity>, usize)> {
        Ok(self.store.find_and_count(self.descriptor.kind, spec).await?)
    }

    /// Raw linkage of one relationship, gated by the entity-level
    /// read tier.
    pub async fn relationship_view(
        &self,
        actor: &Actor,
        id: &str,
        rel_name: &str,
    ) -> DomainResult<(&'static RelationshipDescriptor, Linkage)> {
        let entity = self.find_by_id(id).await?;
        let ctx = PermissionContext::for_entity(self.descriptor, actor, Some(&entity));
        if !ctx.allows(self.descriptor.read_tier, Direction::Read) {
            return Err(DomainError::forbidden(format!(
                "not permitted to read {}",
                self.descriptor.kind
            )));
        }
        let rel = self.relationship(rel_name)?;
        let linkage = entity
            .relationships
            .get(rel_name)
            .cloned()
            .unwrap_or_else(|| match rel.cardinality {
                Cardinality::One => Linkage::One(None),
                Cardinality::Many => Linkage::Many(Vec::new()),
            });
        Ok((rel, linkage))
    }

    // --------------------------------------------------------
    // Mutations
    // --------------------------------------------------------

    /// Create a new entity from a write payload.
    ///
    /// The write policy is evaluated against an entity-less context:
    /// `Me`-tier fields are unresolvable before the entity exists and
    /// always deny at creation.
    pub async fn create(&self, actor: &Actor, payload: &WritePayload) -> DomainResult<Entity> {
        self.check_payload_kind(payload)?;
        let attrs = payload.attributes.as_ref().ok_or_else(|| {
            DomainError::unprocessable("/data", "create payload requires an attributes object")
        })?;

        let ctx = PermissionContext::for_entity(self.descriptor, actor, None);
        self.check_write_keys(&ctx, attrs)?;
        self.run_validators(attrs, true)?;

        let mut entity = Entity::new(self.descriptor.kind, ulid::Ulid::new().to_string());
        entity.owner = actor.id.clone();
        entity.attributes = attrs.clone();
        let entity = self.store.create(entity).await?;

        // Relationship payloads apply after the primary write, as
        // `add` for to-many and `set` for to-one; per-target gates
        // still run.
        if let Some(rels) = &payload.relationships {
            self.apply_relationship_payloads(actor, &entity, rels, RelationshipOp::Add)
                .await?;
        }

        let canonical = self.find_by_id(&entity.id).await?;
        self.emit(ResourceEvent {
            kind: self.descriptor.kind,
            id: canonical.id.clone(),
            change: ChangeKind::Created,
            changed: attrs.keys().cloned().collect(),
            before: None,
            after: Some(canonical.clone()),
        });
        Ok(canonical)
    }

    /// Update an existing entity. The entity-level write gate and the
    /// per-field gates must both pass.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        payload: &WritePayload,
    ) -> DomainResult<Entity> {
        self.require_identity(actor)?;
        self.check_payload_kind(payload)?;
        let existing = self.find_by_id(id).await?;
        let ctx = PermissionContext::for_entity(self.descriptor, actor, Some(&existing));
        self.check_entity_write(&ctx)?;

        let empty = Map::new();
        let attrs = payload.attributes.as_ref().unwrap_or(&empty);
        self.check_write_keys(&ctx, attrs)?;
        self.run_validators(attrs, false)?;

        if !attrs.is_empty() {
            self.store
                .update(self.descriptor.kind, id, attrs.clone())
                .await?;
        }
        if let Some(rels) = &payload.relationships {
            self.apply_relationship_payloads(actor, &existing, rels, RelationshipOp::Replace)
                .await?;
        }

        let canonical = self.find_by_id(id).await?;
        let mut changed: Vec<String> = attrs.keys().cloned().collect();
        if let Some(rels) = &payload.relationships {
            changed.extend(rels.keys().cloned());
        }
        self.emit(ResourceEvent {
            kind: self.descriptor.kind,
            id: canonical.id.clone(),
            change: ChangeKind::Updated,
            changed,
            before: Some(existing),
            after: Some(canonical.clone()),
        });
        Ok(canonical)
    }

    /// Delete an entity. The kind's delete override applies when
    /// present; otherwise the entity-level write gate decides.
    pub async fn delete(&self, actor: &Actor, id: &str) -> DomainResult<ResourceIdentifier> {
        self.require_identity(actor)?;
        let existing = self.find_by_id(id).await?;
        let ctx = PermissionContext::for_entity(self.descriptor, actor, Some(&existing));
        let allowed = match self.descriptor.delete_gate {
            Some(gate) => gate(&ctx, &existing),
            None => ctx.allows(self.descriptor.write_tier, Direction::Write),
        };
        if !allowed {
            return Err(DomainError::forbidden(format!(
                "not permitted to delete {}",
                self.descriptor.kind
            )));
        }
        self.store.destroy(self.descriptor.kind, id).await?;
        self.emit(ResourceEvent {
            kind: self.descriptor.kind,
            id: id.to_string(),
            change: ChangeKind::Deleted,
            changed: Vec::new(),
            before: Some(existing),
            after: None,
        });
        Ok(ResourceIdentifier::new(self.descriptor.kind, id))
    }

    /// Change one relationship. Shape and target-type mismatches are
    /// rejected before any mutation is issued.
    pub async fn relationship_change(
        &self,
        actor: &Actor,
        id: &str,
        rel_name: &str,
        op: RelationshipOp,
        data: &LinkageData,
    ) -> DomainResult<Entity> {
        self.require_identity(actor)?;
        let existing = self.find_by_id(id).await?;
        let ctx = PermissionContext::for_entity(self.descriptor, actor, Some(&existing));
        self.check_entity_write(&ctx)?;

        self.apply_relationship_change(actor, &existing, rel_name, op, data)
            .await?;

        let canonical = self.find_by_id(id).await?;
        self.emit(ResourceEvent {
            kind: self.descriptor.kind,
            id: canonical.id.clone(),
            change: ChangeKind::RelationshipChanged,
            changed: vec![rel_name.to_string()],
            before: Some(existing),
            after: Some(canonical.clone()),
        });
        Ok(canonical)
    }

    // --------------------------------------------------------
    // Rendering
    // --------------------------------------------------------

    /// Render one entity plus its expanded `included` set.
    pub async fn render_one(&self, actor: &Actor, entity: &Entity) -> DomainResult<Document> {
        let ctx = PermissionContext::for_entity(self.descriptor, actor, Some(entity));
        let primary = EntityView::new(entity, self.descriptor, &ctx).resource_object();
        let mut acc = IncludedAccumulator::default();
        self.expand_included(actor, std::slice::from_ref(entity), &mut acc)
            .await?;
        Ok(Document::of_one(primary).with_included(acc.into_vec()))
    }

    /// Render an ordered page of entities with pagination meta and a
    /// shared, deduplicated `included` set.
    pub async fn render_many(
        &self,
        actor: &Actor,
        entities: &[Entity],
        page: PageMeta,
    ) -> DomainResult<Document> {
        let resources = entities
            .iter()
            .map(|entity| {
                let ctx = PermissionContext::for_entity(self.descriptor, actor, Some(entity));
                EntityView::new(entity, self.descriptor, &ctx).resource_object()
            })
            .collect();
        let mut acc = IncludedAccumulator::default();
        self.expand_included(actor, entities, &mut acc).await?;
        Ok(Document::of_many(resources)
            .with_page_meta(page)
            .with_included(acc.into_vec()))
    }

    /// Expand one level of declared relationships into the
    /// accumulator. Each related entity is rendered under its own
    /// freshly computed context; fetches for one entity fan out and
    /// join, presentation order is first-encounter order.
    async fn expand_included(
        &self,
        actor: &Actor,
        entities: &[Entity],
        acc: &mut IncludedAccumulator,
    ) -> DomainResult<()> {
        for entity in entities {
            let mut wanted: Vec<(&'static str, String)> = Vec::new();
            for (name, rel) in &self.descriptor.relationships {
                if let Some(linkage) = entity.relationships.get(*name) {
                    for id in linkage.ids() {
                        if !acc.contains(rel.target, id)
                            && !wanted.iter().any(|(k, i)| *k == rel.target && i == id)
                        {
                            wanted.push((rel.target, id.to_string()));
                        }
                    }
                }
            }

            let fetches = wanted
                .iter()
                .map(|(target, id)| self.store.find_one(target, id));
            let fetched = try_join_all(fetches).await?;

            for ((target, id), related) in wanted.into_iter().zip(fetched) {
                let Some(related) = related else {
                    // Dangling reference; linkage stays visible but
                    // there is nothing to include.
                    debug!(kind = target, id = %id, "related resource missing, skipping");
                    continue;
                };
                let Some(descriptor) = types::descriptor(target) else {
                    continue;
                };
                let ctx = PermissionContext::for_entity(descriptor, actor, Some(&related));
                acc.push(EntityView::new(&related, descriptor, &ctx).resource_object());
            }
        }
        Ok(())
    }

    // --------------------------------------------------------
    // Internals
    // --------------------------------------------------------

    fn relationship(&self, name: &str) -> DomainResult<&'static RelationshipDescriptor> {
        self.descriptor
            .relationships
            .get(name)
            .ok_or_else(|| DomainError::not_found("relationship", name))
    }

    fn require_identity(&self, actor: &Actor) -> DomainResult<()> {
        if actor.is_anonymous() {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    fn check_payload_kind(&self, payload: &WritePayload) -> DomainResult<()> {
        if payload.kind != self.descriptor.kind {
            return Err(DomainError::unprocessable(
                "/data",
                format!(
                    "resource type must be '{}', got '{}'",
                    self.descriptor.kind, payload.kind
                ),
            ));
        }
        Ok(())
    }

    fn check_entity_write(&self, ctx: &PermissionContext) -> DomainResult<()> {
        if !ctx.allows(self.descriptor.write_tier, Direction::Write) {
            return Err(DomainError::forbidden(format!(
                "not permitted to modify {}",
                self.descriptor.kind
            )));
        }
        Ok(())
    }

    /// Writes are allow-listed: a key with no policy entry is as
    /// forbidden as one whose tier check fails.
    fn check_write_keys(
        &self,
        ctx: &PermissionContext,
        attrs: &Map<String, serde_json::Value>,
    ) -> DomainResult<()> {
        for key in attrs.keys() {
            match self.descriptor.fields.get(key.as_str()) {
                None => {
                    return Err(DomainError::forbidden(format!(
                        "field '{}' is not writable on {}",
                        key, self.descriptor.kind
                    )))
                }
                Some(policy) if !ctx.allows(policy.write, Direction::Write) => {
                    return Err(DomainError::forbidden(format!(
                        "not permitted to write field '{}' on {}",
                        key, self.descriptor.kind
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn run_validators(
        &self,
        attrs: &Map<String, serde_json::Value>,
        creating: bool,
    ) -> DomainResult<()> {
        let mut issues = Vec::new();
        for validator in &self.descriptor.validators {
            validator.validate(attrs, creating, &mut issues);
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(DomainError::unprocessable_all(issues))
        }
    }

    async fn apply_relationship_payloads(
        &self,
        actor: &Actor,
        entity: &Entity,
        rels: &indexmap::IndexMap<String, RelationshipObject>,
        op: RelationshipOp,
    ) -> DomainResult<()> {
        for (name, rel_obj) in rels {
            // A to-one payload always sets the reference, regardless
            // of the operation requested for to-many members.
            let op = match self.relationship(name)?.cardinality {
                Cardinality::One => RelationshipOp::Replace,
                Cardinality::Many => op,
            };
            self.apply_relationship_change(actor, entity, name, op, &rel_obj.data)
                .await?;
        }
        Ok(())
    }

    async fn apply_relationship_change(
        &self,
        actor: &Actor,
        entity: &Entity,
        rel_name: &str,
        op: RelationshipOp,
        data: &LinkageData,
    ) -> DomainResult<()> {
        let rel = self.relationship(rel_name)?;
        let ctx = PermissionContext::for_entity(self.descriptor, actor, Some(entity));

        match (rel.cardinality, data) {
            (Cardinality::Many, LinkageData::Many(idents)) => {
                let mut ids = Vec::with_capacity(idents.len());
                for ident in idents {
                    if ident.kind != rel.target {
                        return Err(DomainError::unprocessable(
                            "/data",
                            format!(
                                "relationship '{}' expects type '{}', got '{}'",
                                rel_name, rel.target, ident.kind
                            ),
                        ));
                    }
                    ids.push(ident.id.clone());
                }
                // Per-target gate, all evaluated before any mutation.
                for target_id in &ids {
                    if !(rel.gate)(&ctx, actor, entity, target_id) {
                        return Err(DomainError::forbidden(format!(
                            "not permitted to change relationship '{rel_name}' for '{target_id}'"
                        )));
                    }
                }
                match op {
                    RelationshipOp::Add => {
                        self.store
                            .add_related(self.descriptor.kind, &entity.id, rel_name, &ids)
                            .await?
                    }
                    RelationshipOp::Replace => {
                        self.store
                            .set_related(
                                self.descriptor.kind,
                                &entity.id,
                                rel_name,
                                Linkage::Many(ids),
                            )
                            .await?
                    }
                    RelationshipOp::Remove => {
                        self.store
                            .remove_related(self.descriptor.kind, &entity.id, rel_name, &ids)
                            .await?
                    }
                }
            }
            (Cardinality::One, LinkageData::One(ident)) => {
                if op != RelationshipOp::Replace {
                    return Err(DomainError::unprocessable(
                        "/data",
                        format!("to-one relationship '{rel_name}' only supports replacement"),
                    ));
                }
                if let Some(ident) = ident {
                    if ident.kind != rel.target {
                        return Err(DomainError::unprocessable(
                            "/data",
                            format!(
                                "relationship '{}' expects type '{}', got '{}'",
                                rel_name, rel.target, ident.kind
                            ),
                        ));
                    }
                    if !(rel.gate)(&ctx, actor, entity, &ident.id) {
                        return Err(DomainError::forbidden(format!(
                            "not permitted to change relationship '{rel_name}'"
                        )));
                    }
                }
                self.store
                    .set_related(
                        self.descriptor.kind,
                        &entity.id,
                        rel_name,
                        Linkage::One(ident.as_ref().map(|i| i.id.clone())),
                    )
                    .await?;
            }
            _ => {
                return Err(DomainError::unprocessable(
                    "/data",
                    format!(
                        "relationship '{}' payload shape does not match its cardinality",
                        rel_name
                    ),
                ));
            }
        }
        Ok(())
    }

    fn emit(&self, event: ResourceEvent) {
        if let Some(listener) = &self.listener {
            listener.resource_changed(&event);
        }
    }
}
