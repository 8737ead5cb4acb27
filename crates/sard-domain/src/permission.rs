//! Access tiers and per-entity permission contexts.
//!
//! A [`PermissionContext`] is computed fresh for every (request,
//! entity) pair: the `self` facets depend on the specific entity, so
//! contexts are never cached or shared across entities. Each
//! [`AccessTier`] maps to an independent boolean predicate over the
//! facets, not a numeric threshold: `sudo` and `group` overlap in
//! ways a total order cannot express.

use crate::entity::Entity;
use crate::policy::ResourceDescriptor;
use crate::scope::Actor;

/// Whether a policy check is for reading or writing a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Minimum access level required to read or write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    /// No restriction.
    All,
    /// The requester owns the entity (or satisfies the kind's self
    /// predicate) and holds the `.me` scope for the direction.
    Me,
    /// The requester holds the kind's group scope, or qualifies as
    /// self.
    Group,
    /// The requester holds the group scope proper; self access does
    /// not satisfy this tier. Used for fields only privileged group
    /// members may touch.
    Sudo,
    /// The requester holds the kind's internal scope.
    Internal,
}

/// Boolean facets derived from a request's scopes and one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionContext {
    pub self_read: bool,
    pub self_write: bool,
    pub group_read: bool,
    pub group_write: bool,
    pub internal: bool,
    /// Elevated group grant (`<kind>.sudo`). Not consulted by the
    /// tier table; relationship gates and delete overrides use it.
    pub sudo: bool,
}

impl PermissionContext {
    /// Derive facets for one entity. Pass `None` for operations where
    /// no entity exists yet (create): the self facets are then
    /// unresolvable and stay false, so `Me`-tier writes deny at
    /// creation.
    pub fn for_entity(
        descriptor: &ResourceDescriptor,
        actor: &Actor,
        entity: Option<&Entity>,
    ) -> Self {
        let kind = descriptor.kind;
        let scopes = &actor.scopes;
        let matches_self = entity.is_some_and(|e| Self::matches_self(descriptor, actor, e));
        Self {
            self_read: matches_self && scopes.has(&format!("{kind}.read.me")),
            self_write: matches_self && scopes.has(&format!("{kind}.write.me")),
            group_read: scopes.has(&format!("{kind}.read")),
            group_write: scopes.has(&format!("{kind}.write")),
            internal: scopes.has(&format!("{kind}.internal")),
            sudo: scopes.has(&format!("{kind}.sudo")),
        }
    }

    /// Owner match, or the kind's own self predicate (assigned rat,
    /// grace window, ...).
    fn matches_self(descriptor: &ResourceDescriptor, actor: &Actor, entity: &Entity) -> bool {
        let owns = match (&actor.id, &entity.owner) {
            (Some(a), Some(o)) => a == o,
            _ => false,
        };
        owns || descriptor.self_test.is_some_and(|test| test(actor, entity))
    }

    /// The policy table. Read filtering silently narrows output on a
    /// false result; write checks surface `Forbidden`.
    pub fn allows(&self, tier: AccessTier, direction: Direction) -> bool {
        match (tier, direction) {
            (AccessTier::All, _) => true,
            (AccessTier::Me, Direction::Read) => self.self_read,
            (AccessTier::Me, Direction::Write) => self.self_write,
            (AccessTier::Group, Direction::Read) => self.group_read || self.self_read,
            (AccessTier::Group, Direction::Write) => self.group_write || self.self_write,
            (AccessTier::Sudo, Direction::Read) => self.group_read,
            (AccessTier::Sudo, Direction::Write) => self.group_write,
            (AccessTier::Internal, _) => self.internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ResourceDescriptor;
    use crate::scope::ScopeSet;

    fn plain_descriptor() -> ResourceDescriptor {
        ResourceDescriptor::new("widgets")
    }

    fn actor(scopes: &[&str]) -> Actor {
        Actor::new("user-1", ScopeSet::new(scopes.iter().copied()))
    }

    #[test]
    fn group_scope_sets_group_facets() {
        let d = plain_descriptor();
        let a = actor(&["widgets.read", "widgets.write"]);
        let ctx = PermissionContext::for_entity(&d, &a, None);
        assert!(ctx.group_read);
        assert!(ctx.group_write);
        assert!(!ctx.internal);
        assert!(!ctx.sudo);
    }

    #[test]
    fn self_requires_ownership_and_me_scope() {
        let d = plain_descriptor();
        let entity = Entity::new("widgets", "w1").with_owner("user-1");

        // Owner without the .me scope: no self facet.
        let ctx = PermissionContext::for_entity(&d, &actor(&[]), Some(&entity));
        assert!(!ctx.self_read);

        // Owner with the .me scopes: self facets set.
        let a = actor(&["widgets.read.me", "widgets.write.me"]);
        let ctx = PermissionContext::for_entity(&d, &a, Some(&entity));
        assert!(ctx.self_read);
        assert!(ctx.self_write);

        // Non-owner with the .me scopes: still no self facet.
        let stranger = Actor::new("user-2", ScopeSet::new(["widgets.write.me"]));
        let ctx = PermissionContext::for_entity(&d, &stranger, Some(&entity));
        assert!(!ctx.self_write);
    }

    #[test]
    fn create_context_never_resolves_self() {
        let d = plain_descriptor();
        let a = actor(&["widgets.read.me", "widgets.write.me"]);
        let ctx = PermissionContext::for_entity(&d, &a, None);
        assert!(!ctx.self_read);
        assert!(!ctx.self_write);
    }

    #[test]
    fn tier_table() {
        let ctx = PermissionContext {
            self_read: true,
            self_write: true,
            ..Default::default()
        };
        // Self satisfies Me and Group, but never Sudo or Internal.
        assert!(ctx.allows(AccessTier::All, Direction::Read));
        assert!(ctx.allows(AccessTier::Me, Direction::Write));
        assert!(ctx.allows(AccessTier::Group, Direction::Write));
        assert!(!ctx.allows(AccessTier::Sudo, Direction::Write));
        assert!(!ctx.allows(AccessTier::Internal, Direction::Read));

        let ctx = PermissionContext {
            group_read: true,
            group_write: true,
            ..Default::default()
        };
        assert!(ctx.allows(AccessTier::Group, Direction::Read));
        assert!(ctx.allows(AccessTier::Sudo, Direction::Read));
        assert!(ctx.allows(AccessTier::Sudo, Direction::Write));
        assert!(!ctx.allows(AccessTier::Me, Direction::Read));
        assert!(!ctx.allows(AccessTier::Internal, Direction::Write));

        let ctx = PermissionContext {
            internal: true,
            ..Default::default()
        };
        assert!(ctx.allows(AccessTier::Internal, Direction::Read));
        assert!(!ctx.allows(AccessTier::Group, Direction::Read));
    }
}
