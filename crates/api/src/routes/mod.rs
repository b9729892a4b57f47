//! HTTP handlers and the response envelope they share.

pub mod catalog;
pub mod orders;
pub mod system;

use serde::Serialize;
use store::Storage;
use workflow::OrderWorkflow;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Storage> {
    pub workflow: OrderWorkflow<S>,
}

impl<S: Storage> AppState<S> {
    /// Storage backend used for catalog reads.
    pub fn store(&self) -> &S {
        self.workflow.store()
    }
}

/// Success envelope: `{"success": true, "data": ..., "message": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
