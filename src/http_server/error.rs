//! HTTP error mapping
//!
//! Domain errors convert into [`ApiError`], which renders the JSON error body.
//! Internal failures are logged in full and answered with a generic message;
//! in development the [`expose_internal_detail`] middleware adds the detail
//! back into the body.

use std::any::Any;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::gadgets::GadgetError;
use crate::validation::FieldError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Error categories of the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by every handler
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Vec<FieldError>,
    /// Cause of an internal error, never sent outside development
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
            detail: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(ErrorKind::Internal, INTERNAL_MESSAGE)
        }
    }

    fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = details;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Internal error cause carried on the response for [`expose_internal_detail`]
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Some(detail) = &self.detail {
            error!(detail = %detail, "request failed with internal error");
        }

        let body = ErrorBody {
            success: false,
            error: self.message,
            code: status.as_u16(),
            details: self.details,
            detail: None,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(detail) = self.detail {
            response.extensions_mut().insert(InternalDetail(detail));
        }
        response
    }
}

/// Development-only middleware: put internal error causes into the body
pub async fn expose_internal_detail(response: Response) -> Response {
    let Some(InternalDetail(detail)) = response.extensions().get::<InternalDetail>().cloned()
    else {
        return response;
    };

    let status = response.status();
    let body = ErrorBody {
        success: false,
        error: INTERNAL_MESSAGE.to_string(),
        code: status.as_u16(),
        details: Vec::new(),
        detail: Some(detail),
    };
    (status, Json(body)).into_response()
}

/// Single top-level fallback for panics inside handlers
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::internal(format!("handler panicked: {detail}")).into_response()
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "error": "Not Found",
            "code": 404,
            "path": uri.path(),
        })),
    )
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(details) => {
                ApiError::validation("Validation failed").with_details(details)
            }
            AuthError::EmailAlreadyExists => ApiError::new(ErrorKind::Conflict, err.to_string()),
            AuthError::UnknownEmail | AuthError::WrongPassword => {
                ApiError::validation(err.to_string())
            }
            e if e.status_code() == 401 => {
                warn!(reason = %e, "authentication rejected");
                ApiError::new(ErrorKind::Unauthenticated, e.to_string())
            }
            e => ApiError::internal(e.to_string()),
        }
    }
}

impl From<GadgetError> for ApiError {
    fn from(err: GadgetError) -> Self {
        match err {
            GadgetError::Validation(details) => {
                ApiError::validation("Validation failed").with_details(details)
            }
            GadgetError::NotFound(_) => ApiError::new(ErrorKind::NotFound, err.to_string()),
            GadgetError::InvalidStatus(_)
            | GadgetError::InvalidTransition { .. }
            | GadgetError::AlreadyDecommissioned
            | GadgetError::AlreadyDestroyed
            | GadgetError::NameTaken(_) => ApiError::new(ErrorKind::Conflict, err.to_string()),
            GadgetError::CodenameExhausted { .. }
            | GadgetError::InvalidWordLists(_)
            | GadgetError::Storage(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::validation("Invalid gadget id")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(format!("Invalid query: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes_map_correctly() {
        let not_found: ApiError = GadgetError::NotFound(Uuid::nil()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict: ApiError = AuthError::EmailAlreadyExists.into();
        assert_eq!(conflict.kind, ErrorKind::Conflict);
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let unauthenticated: ApiError = AuthError::TokenExpired.into();
        assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

        let internal: ApiError = GadgetError::Storage("disk full".into()).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_detail_kept_out_of_message() {
        let err: ApiError = GadgetError::Storage("disk full".into()).into();
        assert_eq!(err.message, INTERNAL_MESSAGE);
        assert_eq!(err.detail.as_deref(), Some("Storage error: disk full"));

        let response = err.into_response();
        assert!(response.extensions().get::<InternalDetail>().is_some());
    }

    #[test]
    fn test_validation_details_survive_conversion() {
        let err: ApiError =
            AuthError::Validation(vec![FieldError::new("email", "bad email")]).into();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.details.len(), 1);
        assert_eq!(err.details[0].field, "email");
    }

    #[test]
    fn test_panic_handler_returns_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
