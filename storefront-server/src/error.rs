use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use storefront_core::StoreError; // Import core errors
use thiserror::Error;
use tracing::{error, warn};

/// Server-specific error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    CoreError(#[from] StoreError), // Automatically convert from StoreError
}

impl ServerError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ServerError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            ServerError::CoreError(core_err) => match core_err {
                StoreError::NotFound(_) | StoreError::UnknownItem { .. } => {
                    (StatusCode::NOT_FOUND, core_err.to_string())
                }
                StoreError::AlreadyExists(_) => (StatusCode::CONFLICT, core_err.to_string()),
                StoreError::InvalidProduct(_)
                | StoreError::InvalidBundleSku(_)
                | StoreError::InvalidKind(_)
                | StoreError::InvalidQuantity(_)
                | StoreError::Unavailable(_)
                | StoreError::EmptyCart
                | StoreError::InvalidShippingOption(_)
                | StoreError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, core_err.to_string()),
                StoreError::Configuration(msg) => {
                    error!(error = %msg, "Configuration error surfaced in a request");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error (configuration)".to_string())
                }
                StoreError::IoError { path, source } => {
                    error!(path = ?path, error = %source, "Core I/O error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error (I/O)".to_string())
                }
                StoreError::Compose(msg) | StoreError::Serialization(msg) => {
                    error!(error = %msg, "Core serialization error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error (Serialization)".to_string())
                }
            },
        }
    }
}

// Implement IntoResponse for ServerError to automatically convert errors into HTTP responses.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        if status.is_server_error() {
            error!("Responding with status {}: {}", status, error_message);
        } else {
            warn!("Responding with status {}: {}", status, error_message);
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

// Define a Result type alias for handler functions
pub type ServerResult<T> = Result<T, ServerError>;
