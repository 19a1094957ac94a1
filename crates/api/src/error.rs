//! Error types for Argo Server calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure to complete a request against the Argo Server.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("workflow '{name}' not found in namespace '{namespace}'")]
    NotFound { namespace: String, name: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("argo server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("connection to argo server failed: {message}")]
    Connection { message: String },

    #[error("failed to decode argo server response: {message}")]
    Decode { message: String },

    #[error("invalid client configuration: {message}")]
    InvalidConfig { message: String },
}

impl BackendError {
    /// Whether retrying the same call later could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Connection { .. } => true,
            BackendError::Status { status, .. } => status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS,
            _ => false,
        }
    }

    /// Stable machine-readable code for tool error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::NotFound { .. } => "ARGO_NOT_FOUND",
            BackendError::PermissionDenied { .. } => "ARGO_PERMISSION_DENIED",
            BackendError::Unauthorized { .. } => "ARGO_UNAUTHORIZED",
            BackendError::Status { .. } => "ARGO_REQUEST_FAILED",
            BackendError::Connection { .. } => "ARGO_CONNECTION_FAILED",
            BackendError::Decode { .. } => "ARGO_DECODE_FAILED",
            BackendError::InvalidConfig { .. } => "ARGO_INVALID_CONFIG",
        }
    }

    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_decode() {
            BackendError::Decode { message: error.to_string() }
        } else {
            BackendError::Connection { message: error.to_string() }
        }
    }

    /// Map a non-success HTTP status onto the error taxonomy.
    ///
    /// `body` is the raw response text; Argo wraps gRPC statuses as
    /// `{"code": 5, "message": "..."}` and the message is extracted when present.
    pub(crate) fn from_status(status: StatusCode, body: &str, namespace: &str, name: Option<&str>) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("message").and_then(|message| message.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());

        match (status, name) {
            (StatusCode::NOT_FOUND, Some(name)) => BackendError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            (StatusCode::FORBIDDEN, _) => BackendError::PermissionDenied { message },
            (StatusCode::UNAUTHORIZED, _) => BackendError::Unauthorized { message },
            _ => BackendError::Status { status, message },
        }
    }
}

/// Failure while pulling the next frame from an open event subscription.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReceiveError {
    /// The transport or the server reported a deadline being exceeded.
    #[error("event stream deadline exceeded")]
    Timeout,

    #[error("event stream failed: {0}")]
    Transport(String),
}
