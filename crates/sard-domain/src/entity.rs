//! The stored entity representation shared by engine and store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Relationship linkage as stored on an entity: a nullable single id
/// or a set of ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linkage {
    One(Option<String>),
    Many(Vec<String>),
}

impl Linkage {
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Linkage::One(None) => Vec::new(),
            Linkage::One(Some(id)) => vec![id.as_str()],
            Linkage::Many(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        match self {
            Linkage::One(opt) => opt.as_deref() == Some(id),
            Linkage::Many(ids) => ids.iter().any(|x| x == id),
        }
    }
}

/// One domain entity as held by the storage collaborator.
///
/// Attributes are an open JSON object; which of them exist and who may
/// see or change them is decided by the per-kind
/// [`ResourceDescriptor`](crate::policy::ResourceDescriptor), not by
/// this struct. The engine only ever reads snapshots of entities; all
/// mutation goes through the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub kind: String,
    pub attributes: Map<String, Value>,
    pub relationships: BTreeMap<String, Linkage>,
    /// Owning user id, when the kind has an owner (drives `self`
    /// access).
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes: Map::new(),
            relationships: BTreeMap::new(),
            owner: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_relationship(mut self, name: impl Into<String>, linkage: Linkage) -> Self {
        self.relationships.insert(name.into(), linkage);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}
