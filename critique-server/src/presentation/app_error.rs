use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("unauthorized")]
    Unauthorized,
}

pub(crate) type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Domain(err) => domain_response(err),
            AppError::Validation(errors) => {
                let body = serde_json::to_value(&errors)
                    .unwrap_or_else(|_| json!({ "detail": "validation error" }));
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": "authentication required" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Uniqueness conflicts surface as 400 field errors, not 409; the invalid
/// confirmation code keys its own field the same way the other validation
/// failures do.
fn domain_response(err: DomainError) -> (StatusCode, Value) {
    match err {
        DomainError::Validation { field, message } => {
            (StatusCode::BAD_REQUEST, field_body(field, message))
        }
        DomainError::AlreadyExists(what) => {
            (StatusCode::BAD_REQUEST, field_body(&what, "already exists"))
        }
        DomainError::InvalidConfirmationCode => (
            StatusCode::BAD_REQUEST,
            field_body("confirmation_code", "invalid confirmation code"),
        ),
        DomainError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            json!({ "detail": format!("not found: {what}") }),
        ),
        DomainError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "authentication required" }),
        ),
        DomainError::Forbidden => (
            StatusCode::FORBIDDEN,
            json!({ "detail": "you do not have permission to perform this action" }),
        ),
        DomainError::Unexpected(msg) => {
            error!("unexpected error: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "detail": "internal error" }),
            )
        }
    }
}

fn field_body(field: &str, message: &str) -> Value {
    let mut map = Map::new();
    map.insert(field.to_string(), Value::String(message.to_string()));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::AppError;
    use crate::domain::error::DomainError;

    fn status_of(err: DomainError) -> StatusCode {
        AppError::Domain(err).into_response().status()
    }

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        assert_eq!(
            status_of(DomainError::Validation {
                field: "year",
                message: "bad"
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::NotFound("title id: 3".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::InvalidConfirmationCode),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(DomainError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(DomainError::Unauthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(DomainError::Unexpected("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicates_surface_as_bad_request_not_conflict() {
        assert_eq!(
            status_of(DomainError::AlreadyExists("review".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
