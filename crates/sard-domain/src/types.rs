//! The resource registry: one declarative descriptor per exposed
//! kind.
//!
//! Everything kind-specific lives here: policy maps, self
//! predicates, relationship gates, validators. The rest of the crate
//! treats these tables as opaque configuration.

use std::sync::LazyLock;

use chrono::{Duration, Utc};

use crate::entity::Entity;
use crate::permission::AccessTier::{All, Group, Internal, Me, Sudo};
use crate::permission::PermissionContext;
use crate::policy::{Cardinality, ResourceDescriptor};
use crate::scope::Actor;
use crate::validate::{EmailFormat, NonEmptyString, OneOf, Required};

/// How long after creation a rescue stays self-writable for any
/// holder of `rescues.write.me`, assigned or not. Deliberately
/// permissive: first responders need to annotate a case before
/// assignment happens.
pub const RESCUE_SELF_GRACE_SECS: i64 = 1800;

pub const PLATFORMS: &[&str] = &["pc", "xb", "ps"];
pub const RESCUE_STATUSES: &[&str] = &["open", "inactive", "closed"];

static REGISTRY: LazyLock<Vec<ResourceDescriptor>> =
    LazyLock::new(|| vec![rescues(), rats(), users(), ships(), groups()]);

/// Look up a kind's descriptor by its JSON:API type string.
pub fn descriptor(kind: &str) -> Option<&'static ResourceDescriptor> {
    REGISTRY.iter().find(|d| d.kind == kind)
}

/// Every registered kind, in registration order.
pub fn kinds() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|d| d.kind)
}

/// A rescue is "self" to its assigned rats, and to anyone holding the
/// `.me` scope while the case is inside the creation grace window.
fn rescue_self(actor: &Actor, entity: &Entity) -> bool {
    let assigned = entity
        .relationships
        .get("rats")
        .is_some_and(|linkage| actor.rat_ids.iter().any(|rat| linkage.contains(rat)));
    let age = Utc::now().signed_duration_since(entity.created_at);
    assigned || age <= Duration::seconds(RESCUE_SELF_GRACE_SECS)
}

fn rescues() -> ResourceDescriptor {
    ResourceDescriptor::new("rescues")
        .field("client", All, Group)
        .field("system", All, Group)
        .field("platform", All, Group)
        .field("status", All, Group)
        .field("notes", All, Group)
        .field("quotes", All, Group)
        .field("code_red", All, Group)
        .field("unidentified_rats", All, Group)
        // Only proper group writers may record the outcome.
        .field("outcome", All, Sudo)
        .field("data", Group, Group)
        .field("internal_notes", Internal, Internal)
        .relationship("rats", "rats", Cardinality::Many, |ctx, actor, _, target| {
            // Self writers may only assign their own rats.
            ctx.group_write
                || ctx.sudo
                || (ctx.self_write && actor.rat_ids.iter().any(|rat| rat == target))
        })
        .relationship("first_limpet", "rats", Cardinality::One, |ctx, _, _, _| {
            ctx.group_write
        })
        .self_test(rescue_self)
        .delete_gate(|ctx, _| ctx.sudo)
        .validator(Box::new(Required(&["client", "platform"])))
        .validator(Box::new(NonEmptyString("client")))
        .validator(Box::new(OneOf {
            field: "platform",
            allowed: PLATFORMS,
        }))
        .validator(Box::new(OneOf {
            field: "status",
            allowed: RESCUE_STATUSES,
        }))
}

fn rats() -> ResourceDescriptor {
    ResourceDescriptor::new("rats")
        .field("name", All, Group)
        .field("platform", All, Group)
        // Join date is fixed by privileged writers only.
        .field("joined", All, Sudo)
        .field("data", Group, Group)
        .relationship("user", "users", Cardinality::One, |ctx, _, _, _| {
            ctx.group_write || ctx.sudo
        })
        .validator(Box::new(Required(&["name", "platform"])))
        .validator(Box::new(NonEmptyString("name")))
        .validator(Box::new(OneOf {
            field: "platform",
            allowed: PLATFORMS,
        }))
}

fn users() -> ResourceDescriptor {
    ResourceDescriptor::new("users")
        .field("email", Group, Group)
        .field("display_name", All, Group)
        .field("status", All, Sudo)
        .field("suspended", Group, Sudo)
        .field("admin_notes", Internal, Internal)
        .relationship("rats", "rats", Cardinality::Many, |ctx, _, _, _| {
            ctx.group_write || ctx.self_write
        })
        .relationship("groups", "groups", Cardinality::Many, |ctx, _, _, _| {
            ctx.sudo
        })
        .validator(Box::new(Required(&["email"])))
        .validator(Box::new(EmailFormat("email")))
}

fn ships() -> ResourceDescriptor {
    ResourceDescriptor::new("ships")
        .field("name", All, Group)
        .field("ship_type", All, Group)
        .relationship("rat", "rats", Cardinality::One, |ctx, _, _, _| {
            ctx.group_write || ctx.self_write
        })
        .validator(Box::new(Required(&["name"])))
        .validator(Box::new(NonEmptyString("name")))
}

fn groups() -> ResourceDescriptor {
    ResourceDescriptor::new("groups")
        .field("name", All, Sudo)
        .field("priority", All, Sudo)
        .field("permissions", Group, Sudo)
        .write_tier(Sudo)
        .validator(Box::new(Required(&["name"])))
        .validator(Box::new(NonEmptyString("name")))
}
