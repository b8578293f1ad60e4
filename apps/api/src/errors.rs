use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::serializers::{FieldErrors, NON_FIELD_ERRORS};
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {}", .0.summary())]
    Validation(FieldErrors),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Integrity(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidReference { field, id } => AppError::Validation(
                FieldErrors::single(field, format!("Invalid pk \"{id}\" - object does not exist.")),
            ),
            err @ StoreError::Protected { .. } => AppError::Integrity(err.to_string()),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(FieldErrors::single(
            NON_FIELD_ERRORS,
            rejection.body_text(),
        ))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(FieldErrors::single(
            NON_FIELD_ERRORS,
            rejection.body_text(),
        ))
    }
}

impl From<PathRejection> for AppError {
    // An id that is not an integer cannot match any record.
    fn from(_: PathRejection) -> Self {
        AppError::NotFound("No record matches the given query".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, fields) = match self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg, None),
            AppError::Validation(errors) => ("VALIDATION_ERROR", errors.summary(), Some(errors)),
            AppError::Integrity(msg) => ("INTEGRITY_ERROR", msg, None),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(fields) = fields {
            error["fields"] = json!(fields);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reference_becomes_field_error() {
        let err: AppError = StoreError::InvalidReference { field: "company", id: 7 }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        match err {
            AppError::Validation(fields) => assert_eq!(
                fields.get("company").unwrap(),
                ["Invalid pk \"7\" - object does not exist."]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_protected_becomes_conflict() {
        let err: AppError = StoreError::Protected {
            entity: "company",
            id: 3,
            referenced_by: "previous jobs",
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(
            err.to_string(),
            "Integrity error: company 3 is still referenced by previous jobs"
        );
    }

    #[test]
    fn test_database_errors_map_to_500() {
        let err: AppError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
