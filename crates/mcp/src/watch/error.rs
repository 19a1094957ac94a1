//! Watch failure taxonomy.

use argo_mcp_api::BackendError;
use thiserror::Error;

/// Failure of an observe call.
///
/// Timeouts and natural stream ends are not errors; they produce an output
/// record.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The request was rejected before any network activity.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The event subscription could not be established.
    #[error("failed to subscribe to workflow events: {0}")]
    Backend(#[from] BackendError),

    /// The stream failed after it was established; accumulated state is discarded.
    #[error("workflow event stream failed: {0}")]
    Stream(String),
}

impl WatchError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        WatchError::Validation {
            field,
            message: message.into(),
        }
    }
}
