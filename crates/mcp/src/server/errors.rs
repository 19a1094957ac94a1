//! Structured tool error helpers.

use argo_mcp_api::BackendError;
use chrono::Utc;
use rmcp::model::ErrorData;
use serde_json::Value;

use crate::watch::WatchError;

fn build_error_data(error_code: &str, category: &str, message: &str, context: Value, retryable: bool, suggested_action: &str) -> Value {
    serde_json::json!({
        "error_code": error_code,
        "category": category,
        "message": message,
        "context": context,
        "retryable": retryable,
        "suggested_action": suggested_action,
        "correlation_id": format!("argo-{}", Utc::now().timestamp_millis()),
    })
}

pub fn invalid_params_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::invalid_params(
        message.clone(),
        Some(build_error_data(error_code, "validation", &message, context, false, suggested_action)),
    )
}

pub fn not_found_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::resource_not_found(
        message.clone(),
        Some(build_error_data(error_code, "not_found", &message, context, false, suggested_action)),
    )
}

pub fn execution_error(error_code: &str, message: impl Into<String>, context: Value, retryable: bool, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::internal_error(
        message.clone(),
        Some(build_error_data(error_code, "execution", &message, context, retryable, suggested_action)),
    )
}

/// Map a failed Argo Server call onto a tool error.
pub fn backend_error(error: &BackendError, context: Value) -> ErrorData {
    match error {
        BackendError::NotFound { .. } => not_found_error(
            error.code(),
            error.to_string(),
            context,
            "Check the workflow name and namespace with list_workflows.",
        ),
        BackendError::Unauthorized { .. } | BackendError::PermissionDenied { .. } => execution_error(
            error.code(),
            error.to_string(),
            context,
            false,
            "Check the configured Argo token and its RBAC permissions for this namespace.",
        ),
        BackendError::InvalidConfig { .. } => execution_error(
            error.code(),
            error.to_string(),
            context,
            false,
            "Fix the argoServer section of the argo-mcp configuration.",
        ),
        _ => execution_error(
            error.code(),
            error.to_string(),
            context,
            error.is_retryable(),
            "Check that the Argo Server is reachable and retry.",
        ),
    }
}

/// Map a failed observation onto a tool error.
pub fn watch_error(error: &WatchError, context: Value) -> ErrorData {
    match error {
        WatchError::Validation { field, .. } => invalid_params_error(
            "WATCH_INVALID_REQUEST",
            error.to_string(),
            with_field(context, field),
            "Provide a workflow name and a positive timeout such as 30s, 10m or 1h30m.",
        ),
        WatchError::Backend(backend) => backend_error(backend, context),
        WatchError::Stream(_) => execution_error(
            "WATCH_STREAM_FAILED",
            error.to_string(),
            context,
            true,
            "Retry the call; get_workflow returns the current state without streaming.",
        ),
    }
}

fn with_field(mut context: Value, field: &str) -> Value {
    if let Some(object) = context.as_object_mut() {
        object.insert("field".to_string(), Value::String(field.to_string()));
    }
    context
}
