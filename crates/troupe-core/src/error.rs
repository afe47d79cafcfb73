//! Core error type for the troupe platform.
//!
//! `ServerError` is used throughout the core domain (stores, state, HTTP
//! glue). When the `axum` feature is enabled, it also implements
//! `IntoResponse` so it can be used directly as an axum handler error type.
//!
//! The workflow engine has its own taxonomy (`workflow::WorkflowError`);
//! the `From` impl below bridges it onto HTTP semantics at the boundary.

use crate::workflow::WorkflowError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<WorkflowError> for ServerError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Configuration(msg) => ServerError::BadRequest(msg),
            WorkflowError::Design(msg)
            | WorkflowError::Routing(msg)
            | WorkflowError::Generation(msg) => ServerError::Upstream(msg),
            WorkflowError::Persistence(msg) => ServerError::Database(msg),
            WorkflowError::TurnLimit(max) => {
                ServerError::Upstream(format!("turn limit exceeded ({} turns)", max))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// axum integration (opt-in via feature flag)
// ---------------------------------------------------------------------------

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match &self {
            ServerError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ServerError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
