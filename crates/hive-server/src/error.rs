use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use hive_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Stable machine-readable kind, sent as the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::NotFound(_) => "NotFound",
            ServerError::Validation(_) => "ValidationError",
            ServerError::Conflict(_) => "ConflictOnWrite",
            ServerError::StoreUnavailable(_) => "StoreUnavailable",
            ServerError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ServerError::NotFound(err.to_string()),
            StoreError::Conflict { .. } => ServerError::Conflict(err.to_string()),
            _ if err.is_corrupt_row() => ServerError::Internal(err.to_string()),
            _ => ServerError::StoreUnavailable(err.to_string()),
        }
    }
}

/// Unreadable request bodies (bad JSON, wrong field types, wrong content
/// type) are client errors like any other missing field.
impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::NotFound(_) | ServerError::Validation(_) => self.to_string(),
            ServerError::Conflict(_) => "Concurrent update, retry the request".to_string(),
            ServerError::StoreUnavailable(detail) => {
                tracing::error!(error = %detail, "store unavailable");
                "Store unavailable, retry later".to_string()
            }
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "Internal server error".to_string()
            }
        };

        let body = serde_json::json!({
            "error": self.kind(),
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
