//! Domain-error to HTTP response mapping.
//!
//! Every failure leaves this layer as a JSON:API error document with
//! the matching status code. Storage internals are logged, never
//! exposed to clients.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::error;

use sard_domain::{Document, DomainError, ErrorObject, ErrorSource, StoreError};

/// Error codes carried in the `code` member of error objects.
pub mod error_codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const UNPROCESSABLE_ENTITY: &str = "unprocessable_entity";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const SERVICE_UNAVAILABLE: &str = "service_unavailable";
}

/// An HTTP status plus the error objects to render under `errors`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub errors: Vec<ErrorObject>,
}

impl ApiError {
    fn single(
        status: StatusCode,
        code: &str,
        title: &str,
        detail: Option<String>,
        source: Option<ErrorSource>,
    ) -> Self {
        Self {
            status,
            errors: vec![ErrorObject {
                status: status.as_u16().to_string(),
                code: Some(code.to_string()),
                title: title.to_string(),
                detail,
                source,
            }],
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::single(
            StatusCode::BAD_REQUEST,
            error_codes::BAD_REQUEST,
            "Bad Request",
            Some(detail.into()),
            None,
        )
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::single(
            StatusCode::UNAUTHORIZED,
            error_codes::UNAUTHORIZED,
            "Unauthorized",
            Some(detail.into()),
            None,
        )
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::single(
            StatusCode::FORBIDDEN,
            error_codes::FORBIDDEN,
            "Forbidden",
            Some(detail.into()),
            None,
        )
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::single(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            "Not Found",
            Some(detail.into()),
            None,
        )
    }

    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::single(
            StatusCode::PAYLOAD_TOO_LARGE,
            error_codes::PAYLOAD_TOO_LARGE,
            "Payload Too Large",
            Some(detail.into()),
            None,
        )
    }

    pub fn internal_error() -> Self {
        Self::single(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "Internal Server Error",
            None,
            None,
        )
    }

    pub fn service_unavailable() -> Self {
        Self::single(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            "Service Unavailable",
            None,
            None,
        )
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::BadRequest { message } => ApiError::bad_request(message),
            DomainError::Unauthorized => ApiError::unauthorized("authentication required"),
            DomainError::Forbidden { detail } => ApiError::forbidden(detail),
            DomainError::NotFound { kind, id } => {
                ApiError::not_found(format!("{kind} not found: {id}"))
            }
            DomainError::UnprocessableEntity { issues } => {
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                let errors = issues
                    .into_iter()
                    .map(|issue| ErrorObject {
                        status: status.as_u16().to_string(),
                        code: Some(error_codes::UNPROCESSABLE_ENTITY.to_string()),
                        title: "Unprocessable Entity".to_string(),
                        detail: Some(issue.detail),
                        source: Some(ErrorSource::pointer(issue.pointer)),
                    })
                    .collect();
                ApiError { status, errors }
            }
            DomainError::Store(store_err) => {
                // Log the real cause; clients get a generic message.
                error!("storage error: {store_err}");
                match store_err {
                    StoreError::Unavailable { .. } => ApiError::service_unavailable(),
                    _ => ApiError::internal_error(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(Document::of_errors(self.errors))).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sard_domain::Issue;

    #[test]
    fn unprocessable_renders_one_error_per_issue() {
        let err: ApiError = DomainError::unprocessable_all(vec![
            Issue::new("/data/attributes/client", "is required"),
            Issue::new("/data/attributes/platform", "is required"),
        ])
        .into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.errors.len(), 2);
        assert_eq!(
            err.errors[0].source.as_ref().unwrap().pointer.as_deref(),
            Some("/data/attributes/client")
        );
    }

    #[test]
    fn store_errors_are_not_leaked() {
        let err: ApiError = DomainError::Store(StoreError::InvalidInput {
            message: "secret backend detail".to_string(),
        })
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.errors[0].detail.is_none());
    }

    #[test]
    fn unavailable_maps_to_503() {
        let err: ApiError = DomainError::Store(StoreError::Unavailable {
            message: "down".to_string(),
        })
        .into();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn taxonomy_statuses() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                DomainError::bad_request("x").into(),
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::Unauthorized.into(), StatusCode::UNAUTHORIZED),
            (DomainError::forbidden("x").into(), StatusCode::FORBIDDEN),
            (
                DomainError::not_found("rescues", "r1").into(),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status, status);
        }
    }
}
