use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// FieldErrors
///
/// Field-level validation messages keyed by field (or query parameter) name.
/// Serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

/// ApiError
///
/// Every failure a request can end in. Handlers return `Result<_, ApiError>`
/// and the `IntoResponse` impl below picks the status code and body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("permission denied: {0}")]
    AuthorizationDenied(String),

    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::NotFound("Not found.".to_string())
    }

    /// Shortcut for a validation error carrying a single message.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }

    /// The referenced blogpost does not exist (or vanished mid-request).
    pub fn missing_blogpost() -> Self {
        ApiError::field("blogpost", "Invalid hyperlink - Object does not exist.")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
            ApiError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // 23505: unique_violation
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::Conflict("A record with these values already exists.".into());
            }
        }
        ApiError::Database(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::field(NON_FIELD_ERRORS, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::field(NON_FIELD_ERRORS, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Validation(errors) => serde_json::to_value(errors)
                .unwrap_or_else(|_| serde_json::json!({ NON_FIELD_ERRORS: ["Invalid input."] })),
            ApiError::AuthenticationRequired(msg)
            | ApiError::AuthorizationDenied(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => serde_json::json!({ "detail": msg }),
            ApiError::Database(_) | ApiError::Internal(_) => {
                // Never leak driver or internal details to the client.
                tracing::error!(error = %self, "request failed with an internal error");
                serde_json::json!({ "detail": "Internal server error." })
            }
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"api\""),
            );
        }
        response
    }
}
