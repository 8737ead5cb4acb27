//! Permission-filtered entity views.
//!
//! An [`EntityView`] converts one entity plus a permission context
//! into the filtered attribute map and relationship linkage of a
//! JSON:API resource object. Attribute visibility follows the read
//! policy. Relationship linkage is always visible; the referenced
//! resource's attributes are filtered under its own context when it
//! is expanded into `included`.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::document::{LinkageData, RelationshipObject, ResourceIdentifier, ResourceObject};
use crate::entity::{Entity, Linkage};
use crate::permission::{Direction, PermissionContext};
use crate::policy::{Cardinality, ResourceDescriptor};

/// Transient (entity, context, descriptor) wrapper. Never mutates the
/// entity.
pub struct EntityView<'a> {
    entity: &'a Entity,
    descriptor: &'a ResourceDescriptor,
    ctx: &'a PermissionContext,
}

impl<'a> EntityView<'a> {
    pub fn new(
        entity: &'a Entity,
        descriptor: &'a ResourceDescriptor,
        ctx: &'a PermissionContext,
    ) -> Self {
        Self {
            entity,
            descriptor,
            ctx,
        }
    }

    /// Attributes passing the read policy, in declaration order.
    /// Fields the context may not read are omitted, never an error.
    pub fn attributes(&self) -> Map<String, Value> {
        self.descriptor
            .fields
            .iter()
            .filter(|(_, policy)| self.ctx.allows(policy.read, Direction::Read))
            .filter_map(|(name, _)| {
                self.entity
                    .attributes
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect()
    }

    /// Linkage for every declared relationship. Undeclared linkage on
    /// the entity is not exposed; declared relationships with no
    /// stored linkage render as empty.
    pub fn relationships(&self) -> IndexMap<String, RelationshipObject> {
        self.descriptor
            .relationships
            .iter()
            .map(|(name, rel)| {
                let data = match self.entity.relationships.get(*name) {
                    Some(Linkage::One(opt)) => LinkageData::One(
                        opt.as_ref()
                            .map(|id| ResourceIdentifier::new(rel.target, id)),
                    ),
                    Some(Linkage::Many(ids)) => LinkageData::Many(
                        ids.iter()
                            .map(|id| ResourceIdentifier::new(rel.target, id))
                            .collect(),
                    ),
                    None => match rel.cardinality {
                        Cardinality::One => LinkageData::One(None),
                        Cardinality::Many => LinkageData::Many(Vec::new()),
                    },
                };
                (name.to_string(), RelationshipObject { data })
            })
            .collect()
    }

    pub fn resource_object(&self) -> ResourceObject {
        ResourceObject {
            kind: self.entity.kind.clone(),
            id: self.entity.id.clone(),
            attributes: self.attributes(),
            relationships: self.relationships(),
        }
    }
}

/// Explicit dedup accumulator for `included`, keyed `(type, id)`,
/// preserving first-encounter order.
#[derive(Debug, Default)]
pub struct IncludedAccumulator {
    seen: HashSet<(String, String)>,
    out: Vec<ResourceObject>,
}

impl IncludedAccumulator {
    pub fn contains(&self, kind: &str, id: &str) -> bool {
        self.seen.contains(&(kind.to_string(), id.to_string()))
    }

    /// Insert unless the `(type, id)` pair is already present.
    pub fn push(&mut self, resource: ResourceObject) {
        if self
            .seen
            .insert((resource.kind.clone(), resource.id.clone()))
        {
            self.out.push(resource);
        }
    }

    pub fn into_vec(self) -> Vec<ResourceObject> {
        self.out
    }
}
