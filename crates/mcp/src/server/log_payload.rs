//! Helpers for building tool call log payloads.
//!
//! Tool handlers log their request and response through `tracing`. Payloads
//! are rendered once and capped so a large workflow listing cannot flood the
//! log sink.

use serde_json::{Map, Value};

const MAX_LOG_PAYLOAD_BYTES: usize = 16 * 1024;

/// Builds the standard tool call log payload.
///
/// The payload includes `request` and/or `response` when present. Returns
/// `None` when both values are absent.
pub(crate) fn build_log_payload(request: Option<Value>, response: Option<Value>) -> Option<Value> {
    let mut payload = Map::new();
    if let Some(request_value) = request {
        payload.insert("request".to_string(), request_value);
    }
    if let Some(response_value) = response {
        payload.insert("response".to_string(), response_value);
    }
    if payload.is_empty() { None } else { Some(Value::Object(payload)) }
}

/// Serializes a payload for logging, truncating it past the size guardrail.
pub(crate) fn render_log_payload(payload: &Value) -> String {
    let rendered = payload.to_string();
    if rendered.len() <= MAX_LOG_PAYLOAD_BYTES {
        return rendered;
    }
    let mut cut = MAX_LOG_PAYLOAD_BYTES;
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} bytes truncated)", &rendered[..cut], rendered.len() - cut)
}
