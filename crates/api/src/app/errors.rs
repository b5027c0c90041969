use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use tabs_core::{DomainError, Entity};
use tabs_infra::StoreError;

/// Every failure a handler can report.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{entity} {id} doesn't exist")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    InvalidId(String),

    #[error("{0}")]
    InvalidBody(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Store(String),
}

impl ApiError {
    pub fn not_found<E: Entity>(id: E::Id) -> Self {
        Self::NotFound {
            entity: E::KIND,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidId(msg) => Self::InvalidId(msg),
            other @ DomainError::InvariantViolation(_) => Self::Store(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound { .. } => {
                let msg = self.to_string();
                json_error(StatusCode::NOT_FOUND, "not_found", msg)
            }
            Self::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
            Self::InvalidBody(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_body", msg),
            Self::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            Self::Store(msg) => {
                tracing::error!(error = %msg, "store failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "storage failure")
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
