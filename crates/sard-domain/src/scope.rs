//! Granted scopes and request identity.
//!
//! Authentication is an external collaborator: by the time the engine
//! runs, the request already carries a resolved [`Actor`] with its
//! granted scope set. Scope strings follow the `<kind>.<grant>`
//! grammar, e.g. `rescues.write`, `rats.read.me`, `users.internal`.

use std::collections::HashSet;

/// An unordered set of granted scope strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(HashSet<String>);

impl ScopeSet {
    pub fn new<I, T>(scopes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    pub fn has(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, scope: impl Into<String>) {
        self.0.insert(scope.into());
    }
}

impl<T: Into<String>> FromIterator<T> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// The authenticated requester attached to a request.
///
/// `id` is the requester's user id (None for anonymous requests).
/// `rat_ids` lists the rats belonging to that user; the
/// authentication collaborator resolves them so that entity self
/// predicates (e.g. "requester is an assigned rat") stay pure
/// functions with no storage access.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    pub id: Option<String>,
    pub rat_ids: Vec<String>,
    pub scopes: ScopeSet,
}

impl Actor {
    pub fn new(id: impl Into<String>, scopes: ScopeSet) -> Self {
        Self {
            id: Some(id.into()),
            rat_ids: Vec::new(),
            scopes,
        }
    }

    /// A request with no credentials: no identity, no scopes.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_rats<I, T>(mut self, rats: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.rat_ids = rats.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }
}
