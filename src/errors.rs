use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::models::ValidationError;

pub const LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("service unavailable")]
    Unavailable(#[source] anyhow::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid credentials")]
    InvalidCredentials,
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Unavailable(err)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Unavailable(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable(e) => {
                tracing::error!(error = ?e, "persistence failure");
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => {
                return (StatusCode::SEE_OTHER, [(header::LOCATION, LOGIN_PATH)]).into_response();
            }
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        };

        let body = match &self {
            AppError::Validation(e) => {
                serde_json::json!({ "error": self.to_string(), "field": e.field() })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
