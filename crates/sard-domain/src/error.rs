//! Domain error taxonomy.
//!
//! Every failure the engine can surface falls into one of five
//! request-level classes (bad request, unauthorized, forbidden, not
//! found, unprocessable entity) plus a storage-sourced variant. The
//! API layer maps each class to an HTTP status and a JSON:API error
//! document; nothing escapes as an unstructured failure.

use thiserror::Error;

use crate::store::StoreError;

/// A single field-scoped problem inside an unprocessable payload.
///
/// `pointer` is a JSON pointer into the request document, e.g.
/// `/data/attributes/platform`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub pointer: String,
    pub detail: String,
}

impl Issue {
    pub fn new(pointer: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            detail: detail.into(),
        }
    }
}

/// Domain-level errors for resource operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required request parameter is missing or malformed.
    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// No identity present where one is required.
    #[error("authentication required")]
    Unauthorized,

    /// Identity present but the permission model denies the operation.
    #[error("forbidden: {detail}")]
    Forbidden { detail: String },

    /// No entity of the given kind at the given id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Payload shape/type mismatch, invalid relationship target, or
    /// failed field validator. Carries one issue per problem so that
    /// required-field validation can report everything at once.
    #[error("unprocessable entity: {}", summarize(.issues))]
    UnprocessableEntity { issues: Vec<Issue> },

    /// The storage collaborator failed.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        DomainError::BadRequest {
            message: message.into(),
        }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        DomainError::Forbidden {
            detail: detail.into(),
        }
    }

    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        DomainError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Single-issue unprocessable payload.
    pub fn unprocessable(pointer: impl Into<String>, detail: impl Into<String>) -> Self {
        DomainError::UnprocessableEntity {
            issues: vec![Issue::new(pointer, detail)],
        }
    }

    /// Multi-issue unprocessable payload (accumulated validator failures).
    pub fn unprocessable_all(issues: Vec<Issue>) -> Self {
        DomainError::UnprocessableEntity { issues }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            // A missing row surfaces as an ordinary 404, not a 5xx.
            StoreError::NotFound { kind, id } => DomainError::NotFound { kind, id },
            other => DomainError::Store(other),
        }
    }
}

fn summarize(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.pointer, i.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
