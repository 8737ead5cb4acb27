//! Resource-change notifications.
//!
//! After a successful mutation the engine emits a typed event to an
//! external subscriber (chat announcements, audit trails). The engine
//! never blocks on or inspects the subscriber's outcome; a listener
//! that panics or drops events cannot fail the request that produced
//! them.

use std::sync::Mutex;

use tracing::info;

use crate::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    RelationshipChanged,
}

/// Old/new snapshot of one mutation.
#[derive(Debug, Clone)]
pub struct ResourceEvent {
    pub kind: &'static str,
    pub id: String,
    pub change: ChangeKind,
    /// Attribute and relationship names touched by the mutation.
    pub changed: Vec<String>,
    pub before: Option<Entity>,
    pub after: Option<Entity>,
}

/// Outbound side-channel subscriber interface.
pub trait ResourceListener: Send + Sync {
    fn resource_changed(&self, event: &ResourceEvent);
}

/// Listener that logs every change; the shipped stand-in for chat
/// announcements.
#[derive(Debug, Default)]
pub struct LogListener;

impl ResourceListener for LogListener {
    fn resource_changed(&self, event: &ResourceEvent) {
        info!(
            kind = event.kind,
            id = %event.id,
            change = ?event.change,
            changed = ?event.changed,
            "resource changed"
        );
    }
}

/// Captures events for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ResourceEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ResourceEvent> {
        self.events.lock().expect("listener lock poisoned").clone()
    }
}

impl ResourceListener for RecordingListener {
    fn resource_changed(&self, event: &ResourceEvent) {
        self.events
            .lock()
            .expect("listener lock poisoned")
            .push(event.clone());
    }
}
