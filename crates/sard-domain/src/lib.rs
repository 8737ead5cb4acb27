//! sard-domain: the permission-scoped serialization and generic
//! resource-mutation engine.
//!
//! This crate is the core of the dispatch API. It decides, per request
//! and per field, whether an attribute or relationship may be read or
//! written, assembles JSON:API documents (data/included/meta/errors),
//! and performs generic create/update/delete/relationship-change
//! operations against arbitrary entity kinds while enforcing those
//! same policies.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                   sard-domain                    │
//! ├──────────────────────────────────────────────────┤
//! │  permission/ - access tiers, per-entity contexts │
//! │  policy/     - per-kind resource descriptors     │
//! │  view/       - filtered attribute/linkage maps   │
//! │  document/   - JSON:API envelope assembly        │
//! │  resource/   - generic CRUD + relationship ops   │
//! │  query/      - query param -> filter translation │
//! │  store/      - EntityStore collaborator trait    │
//! │  events/     - resource-changed notifications    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Concrete resource kinds (rescues, rats, users, ships, groups) are
//! thin instantiations of this engine: each supplies only its policy
//! map, relationship-change descriptors, and validators in
//! [`types`].

pub mod document;
pub mod entity;
pub mod error;
pub mod events;
pub mod permission;
pub mod policy;
pub mod query;
pub mod resource;
pub mod scope;
pub mod store;
pub mod types;
pub mod validate;
pub mod view;

pub use document::{
    Document, ErrorObject, ErrorSource, LinkageData, PrimaryData, RelationshipDocument,
    RelationshipObject, ResourceIdentifier, ResourceObject, WriteDocument, WritePayload,
};
pub use entity::{Entity, Linkage};
pub use error::{DomainError, DomainResult, Issue};
pub use events::{ChangeKind, LogListener, ResourceEvent, ResourceListener};
pub use permission::{AccessTier, Direction, PermissionContext};
pub use policy::{Cardinality, FieldPolicy, RelationshipDescriptor, ResourceDescriptor};
pub use query::{PageBounds, PageMeta, QuerySpec, QueryTranslator, SortDirection};
pub use resource::{GenericResource, RelationshipOp};
pub use scope::{Actor, ScopeSet};
pub use store::{EntityStore, StoreError, StoreResult};
