//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use store::StoreError;
use workflow::WorkflowError;

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as `{"success": false, "error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Order placement error.
    Workflow(WorkflowError),
    /// Storage failure while serving a read; `context` is what the client sees.
    Store {
        context: &'static str,
        source: StoreError,
    },
}

impl ApiError {
    /// Returns a mapper that wraps a storage error with a client-facing message.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| ApiError::Store { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Workflow(err) => workflow_error_to_response(err),
            ApiError::Store { context, source } => {
                tracing::error!(error = %source, context, "storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
            }
        };
        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);

        let body = serde_json::json!({ "success": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn workflow_error_to_response(err: WorkflowError) -> (StatusCode, String) {
    match &err {
        WorkflowError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        WorkflowError::PersistenceFailure(source) => {
            tracing::error!(error = %source, "order persistence failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}
