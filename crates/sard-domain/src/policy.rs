//! Declarative per-kind resource descriptors.
//!
//! A [`ResourceDescriptor`] is process-wide, read-only configuration:
//! the JSON:API type string, a field → tier policy map, the declared
//! relationships with their change rules, the kind's self predicate,
//! and its attribute validators. The generic engine takes this table
//! plus its callback predicates as plain data; there is no per-kind
//! subclassing anywhere.

use indexmap::IndexMap;

use crate::entity::Entity;
use crate::permission::{AccessTier, PermissionContext};
use crate::scope::Actor;
use crate::validate::AttributeValidator;

/// Minimum tiers to read and write one field. Writes are
/// allow-listed: a field with no policy entry cannot be written at
/// all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub read: AccessTier,
    pub write: AccessTier,
}

impl FieldPolicy {
    pub const fn new(read: AccessTier, write: AccessTier) -> Self {
        Self { read, write }
    }
}

/// Relationship cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// Kind-specific self predicate: does this requester count as "self"
/// for this entity (beyond plain ownership)?
pub type SelfTest = fn(&Actor, &Entity) -> bool;

/// Per-target relationship-change gate. Evaluated once per target id
/// before any mutation; a false result is `Forbidden`.
pub type RelationshipGate = fn(&PermissionContext, &Actor, &Entity, &str) -> bool;

/// Optional override for the delete permission; when absent the
/// entity-level write gate applies.
pub type DeleteGate = fn(&PermissionContext, &Entity) -> bool;

/// Rules for one declared relationship.
pub struct RelationshipDescriptor {
    /// JSON:API type of the related resource.
    pub target: &'static str,
    pub cardinality: Cardinality,
    pub gate: RelationshipGate,
}

/// Immutable per-kind configuration, defined once and shared across
/// all requests.
pub struct ResourceDescriptor {
    /// The JSON:API `type` string.
    pub kind: &'static str,
    /// Field policy map, in declaration (serialization) order.
    pub fields: IndexMap<&'static str, FieldPolicy>,
    pub relationships: IndexMap<&'static str, RelationshipDescriptor>,
    pub self_test: Option<SelfTest>,
    /// Entity-level read gate (relationship views).
    pub read_tier: AccessTier,
    /// Entity-level write gate, checked before any field-level write
    /// check on update/relationship-change.
    pub write_tier: AccessTier,
    pub delete_gate: Option<DeleteGate>,
    pub validators: Vec<Box<dyn AttributeValidator>>,
}

impl ResourceDescriptor {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            fields: IndexMap::new(),
            relationships: IndexMap::new(),
            self_test: None,
            read_tier: AccessTier::All,
            write_tier: AccessTier::Group,
            delete_gate: None,
            validators: Vec::new(),
        }
    }

    pub fn field(mut self, name: &'static str, read: AccessTier, write: AccessTier) -> Self {
        self.fields.insert(name, FieldPolicy::new(read, write));
        self
    }

    pub fn relationship(
        mut self,
        name: &'static str,
        target: &'static str,
        cardinality: Cardinality,
        gate: RelationshipGate,
    ) -> Self {
        self.relationships.insert(
            name,
            RelationshipDescriptor {
                target,
                cardinality,
                gate,
            },
        );
        self
    }

    pub fn self_test(mut self, test: SelfTest) -> Self {
        self.self_test = Some(test);
        self
    }

    pub fn read_tier(mut self, tier: AccessTier) -> Self {
        self.read_tier = tier;
        self
    }

    pub fn write_tier(mut self, tier: AccessTier) -> Self {
        self.write_tier = tier;
        self
    }

    pub fn delete_gate(mut self, gate: DeleteGate) -> Self {
        self.delete_gate = Some(gate);
        self
    }

    pub fn validator(mut self, validator: Box<dyn AttributeValidator>) -> Self {
        self.validators.push(validator);
        self
    }
}
