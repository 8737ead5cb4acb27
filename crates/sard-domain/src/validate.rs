//! Field-level attribute validators.
//!
//! Validators run on raw attribute values before the policy/persist
//! step. Each validator pushes field-scoped issues instead of
//! returning on the first failure, so a request missing three
//! required fields reports all three in one response.

use serde_json::{Map, Value};

use crate::error::Issue;

fn attribute_pointer(field: &str) -> String {
    format!("/data/attributes/{field}")
}

/// Inspects an incoming attribute payload and accumulates issues.
pub trait AttributeValidator: Send + Sync {
    /// `creating` distinguishes create payloads (where required
    /// fields must be present) from partial updates.
    fn validate(&self, attrs: &Map<String, Value>, creating: bool, issues: &mut Vec<Issue>);
}

/// Requires a set of fields to be present and non-null on create.
pub struct Required(pub &'static [&'static str]);

impl AttributeValidator for Required {
    fn validate(&self, attrs: &Map<String, Value>, creating: bool, issues: &mut Vec<Issue>) {
        if !creating {
            return;
        }
        for field in self.0 {
            if !attrs.get(*field).is_some_and(|v| !v.is_null()) {
                issues.push(Issue::new(attribute_pointer(field), "is required"));
            }
        }
    }
}

/// Requires a field, when present, to be a non-empty string.
pub struct NonEmptyString(pub &'static str);

impl AttributeValidator for NonEmptyString {
    fn validate(&self, attrs: &Map<String, Value>, _creating: bool, issues: &mut Vec<Issue>) {
        if let Some(value) = attrs.get(self.0) {
            if value.is_null() {
                return;
            }
            match value.as_str() {
                Some(s) if !s.trim().is_empty() => {}
                _ => issues.push(Issue::new(
                    attribute_pointer(self.0),
                    "must be a non-empty string",
                )),
            }
        }
    }
}

/// Requires a field, when present, to be one of a fixed set of string
/// values.
pub struct OneOf {
    pub field: &'static str,
    pub allowed: &'static [&'static str],
}

impl AttributeValidator for OneOf {
    fn validate(&self, attrs: &Map<String, Value>, _creating: bool, issues: &mut Vec<Issue>) {
        if let Some(value) = attrs.get(self.field) {
            if value.is_null() {
                return;
            }
            let ok = value.as_str().is_some_and(|s| self.allowed.contains(&s));
            if !ok {
                issues.push(Issue::new(
                    attribute_pointer(self.field),
                    format!("must be one of: {}", self.allowed.join(", ")),
                ));
            }
        }
    }
}

/// Minimal email shape check (local@domain).
pub struct EmailFormat(pub &'static str);

impl AttributeValidator for EmailFormat {
    fn validate(&self, attrs: &Map<String, Value>, _creating: bool, issues: &mut Vec<Issue>) {
        if let Some(value) = attrs.get(self.0) {
            if value.is_null() {
                return;
            }
            let ok = value
                .as_str()
                .is_some_and(|s| s.split('@').filter(|part| !part.is_empty()).count() == 2);
            if !ok {
                issues.push(Issue::new(
                    attribute_pointer(self.0),
                    "must be a valid email address",
                ));
            }
        }
    }
}
