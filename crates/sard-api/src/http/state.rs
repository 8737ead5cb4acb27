//! Application state shared across HTTP handlers.

use std::sync::Arc;

use sard_domain::{EntityStore, GenericResource, LogListener, PageBounds, ResourceListener};

use crate::auth::Authenticator;

/// Dependencies for the HTTP handlers: the storage backend, the
/// authentication collaborator, the change listener, and the
/// deployment's pagination policy.
pub struct AppState<S: EntityStore> {
    pub store: Arc<S>,
    pub authenticator: Arc<dyn Authenticator>,
    pub listener: Arc<dyn ResourceListener>,
    pub bounds: PageBounds,
}

impl<S: EntityStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            authenticator: Arc::clone(&self.authenticator),
            listener: Arc::clone(&self.listener),
            bounds: self.bounds,
        }
    }
}

impl<S: EntityStore> AppState<S> {
    pub fn new(store: Arc<S>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            store,
            authenticator,
            listener: Arc::new(LogListener),
            bounds: PageBounds::default(),
        }
    }

    pub fn with_bounds(mut self, bounds: PageBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn ResourceListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Bind a registered kind to the engine, or `None` for unknown
    /// kinds.
    pub fn resource(&self, kind: &str) -> Option<GenericResource<S>> {
        sard_domain::types::descriptor(kind).map(|descriptor| {
            GenericResource::new(descriptor, Arc::clone(&self.store))
                .with_listener(Arc::clone(&self.listener))
        })
    }
}
