//! sard-storage: storage backends implementing the domain's
//! [`EntityStore`](sard_domain::EntityStore) trait.
//!
//! Ships the in-memory backend. Database-backed stores plug in behind
//! the same trait without touching the engine.

pub mod memory;

pub use memory::MemoryEntityStore;
