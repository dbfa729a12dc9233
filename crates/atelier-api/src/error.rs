use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use atelier_db::{Database, DbError};
use atelier_types::api::ErrorResponse;
use atelier_types::validation::ValidationError;

use crate::auth::AppState;

/// Every handler error. Rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Configuration(&'static str),

    #[error("{0}")]
    Storage(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Configuration(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationError::Body(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(ValidationError::Body(rejection.body_text()))
    }
}

/// Runs a blocking database call off the async runtime.
///
/// Unique-constraint failures become `Conflict`; anything else is logged and
/// reported as `Storage(failure)`.
pub async fn run_db<F, T>(state: &AppState, failure: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> atelier_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Storage(failure)
        })?
        .map_err(|e| match e {
            // admin_users is the only table with unique columns
            DbError::Conflict(detail) => {
                warn!("Rejected duplicate admin user: {}", detail);
                ApiError::Conflict("Username or email already exists")
            }
            other => {
                error!("{}: {}", failure, other);
                ApiError::Storage(failure)
            }
        })
}
