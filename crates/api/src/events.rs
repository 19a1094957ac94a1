//! Workflow event subscriptions.
//!
//! The Argo Server streams watch results as newline-delimited JSON, one
//! `{"result": {"type": ..., "object": ...}}` envelope per line, or a single
//! `{"error": {...}}` envelope when the server aborts the stream. Lines may be
//! split across HTTP chunks, so [`FrameDecoder`] buffers until a newline.

use argo_mcp_types::{RawEvent, Workflow};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{BackendError, ReceiveError};

/// gRPC status code for `DEADLINE_EXCEEDED` as relayed by the grpc-gateway.
const GRPC_DEADLINE_EXCEEDED: i64 = 4;

/// An open, exclusively owned stream of workflow events.
///
/// `next` yields `Ok(None)` once the server closes the stream cleanly.
/// Dropping the subscription releases the underlying connection.
#[async_trait]
pub trait EventSubscription: Send {
    async fn next(&mut self) -> Result<Option<RawEvent>, ReceiveError>;
}

/// Source of per-workflow event subscriptions.
#[async_trait]
pub trait WorkflowEvents: Send + Sync {
    /// Open a subscription filtered to one workflow name in one namespace.
    async fn subscribe(&self, namespace: &str, name: &str) -> Result<Box<dyn EventSubscription>, BackendError>;
}

#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    result: Option<WireEvent>,
    #[serde(default)]
    error: Option<WireStatus>,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type", default)]
    event_type: Option<String>,
    #[serde(default)]
    object: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(default, alias = "grpc_code")]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Longest line the decoder buffers before giving up on the stream.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Splits a chunked byte stream into complete lines.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_frame_bytes: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_FRAME_BYTES)
    }
}

impl FrameDecoder {
    pub fn with_limit(max_frame_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_bytes,
        }
    }

    /// Append a chunk. Fails once the unterminated tail exceeds the frame limit.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), ReceiveError> {
        self.buffer.extend_from_slice(chunk);
        let pending = match self.buffer.iter().rposition(|byte| *byte == b'\n') {
            Some(end) => self.buffer.len() - end - 1,
            None => self.buffer.len(),
        };
        if pending > self.max_frame_bytes {
            self.buffer.clear();
            return Err(ReceiveError::Transport(format!(
                "event frame exceeds {} bytes without a line break",
                self.max_frame_bytes
            )));
        }
        Ok(())
    }

    /// Pop the next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|byte| *byte == b'\n')?;
        let line = self.buffer.drain(..=end).collect::<Vec<u8>>();
        Some(String::from_utf8_lossy(&line[..end]).trim_end_matches('\r').to_string())
    }

    /// Take whatever remains after the stream closed.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.buffer.clear();
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&rest).to_string())
    }
}

/// Decode a single stream line.
///
/// Blank lines, unparseable lines and envelopes without a result are skipped
/// (`Ok(None)`). A result whose object does not decode as a workflow yields an
/// event without a snapshot. Server-side error envelopes end the stream.
pub fn decode_frame(line: &str) -> Result<Option<RawEvent>, ReceiveError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let envelope = match serde_json::from_str::<WireEnvelope>(line) {
        Ok(envelope) => envelope,
        Err(error) => {
            warn!(target: "argo_events", %error, "skipping malformed event frame");
            return Ok(None);
        }
    };

    if let Some(status) = envelope.error {
        if status.code == Some(GRPC_DEADLINE_EXCEEDED) {
            return Err(ReceiveError::Timeout);
        }
        let message = status.message.unwrap_or_else(|| "unknown stream error".to_string());
        return Err(ReceiveError::Transport(match status.code {
            Some(code) => format!("{message} (code {code})"),
            None => message,
        }));
    }

    let Some(result) = envelope.result else {
        debug!(target: "argo_events", "event frame without result");
        return Ok(None);
    };

    let object = match result.object {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<Workflow>(value) {
            Ok(workflow) => Some(workflow),
            Err(error) => {
                warn!(target: "argo_events", %error, "event object is not a workflow");
                None
            }
        },
    };

    Ok(Some(RawEvent::new(result.event_type.unwrap_or_default(), object)))
}

/// Event subscription backed by a streaming HTTP response body.
pub struct HttpEventSubscription {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: FrameDecoder,
    closed: bool,
}

impl HttpEventSubscription {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        let body = response.bytes_stream().map(|chunk| chunk.map(|bytes| bytes.to_vec())).boxed();
        Self {
            body,
            decoder: FrameDecoder::default(),
            closed: false,
        }
    }
}

#[async_trait]
impl EventSubscription for HttpEventSubscription {
    async fn next(&mut self) -> Result<Option<RawEvent>, ReceiveError> {
        loop {
            while let Some(line) = self.decoder.next_line() {
                if let Some(event) = decode_frame(&line)? {
                    return Ok(Some(event));
                }
            }

            if self.closed {
                return Ok(None);
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk)?,
                Some(Err(error)) if error.is_timeout() => return Err(ReceiveError::Timeout),
                Some(Err(error)) => return Err(ReceiveError::Transport(error.to_string())),
                None => {
                    self.closed = true;
                    if let Some(rest) = self.decoder.finish()
                        && let Some(event) = decode_frame(&rest)?
                    {
                        return Ok(Some(event));
                    }
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argo_mcp_types::WorkflowPhase;

    #[test]
    fn decoder_reassembles_lines_split_across_chunks() {
        let mut decoder = FrameDecoder::default();
        decoder.push(br#"{"result":{"type":"ADDED","#).unwrap();
        assert!(decoder.next_line().is_none());
        decoder.push(b"\"object\":null}}\r\n{\"res").unwrap();
        assert_eq!(decoder.next_line().as_deref(), Some(r#"{"result":{"type":"ADDED","object":null}}"#));
        assert!(decoder.next_line().is_none());
        assert_eq!(decoder.finish().as_deref(), Some(r#"{"res"#));
    }

    #[test]
    fn unterminated_frame_beyond_limit_fails_the_stream() {
        let mut decoder = FrameDecoder::with_limit(8);
        decoder.push(b"{\"a\":1}\n{\"b\"").unwrap();
        assert_eq!(decoder.next_line().as_deref(), Some(r#"{"a":1}"#));
        let error = decoder.push(b":12345}").unwrap_err();
        assert!(matches!(error, ReceiveError::Transport(ref message) if message.contains("8 bytes")));
    }

    #[test]
    fn decodes_result_envelope() {
        let line = r#"{"result":{"type":"MODIFIED","object":{"metadata":{"name":"hello"},"status":{"phase":"Running","progress":"1/2"}}}}"#;
        let event = decode_frame(line).unwrap().unwrap();
        assert_eq!(event.event_type, "MODIFIED");
        let workflow = event.object.unwrap();
        assert_eq!(workflow.status.phase, WorkflowPhase::Running);
        assert_eq!(workflow.status.progress, "1/2");
    }

    #[test]
    fn undecodable_object_becomes_event_without_snapshot() {
        let line = r#"{"result":{"type":"MODIFIED","object":{"status":{"startedAt":"yesterday"}}}}"#;
        let event = decode_frame(line).unwrap().unwrap();
        assert_eq!(event.event_type, "MODIFIED");
        assert!(event.object.is_none());
    }

    #[test]
    fn malformed_and_blank_lines_are_skipped() {
        assert_eq!(decode_frame("   ").unwrap(), None);
        assert_eq!(decode_frame("not json").unwrap(), None);
        assert_eq!(decode_frame("{}").unwrap(), None);
    }

    #[test]
    fn deadline_status_is_a_typed_timeout() {
        let line = r#"{"error":{"code":4,"message":"context deadline exceeded"}}"#;
        assert_eq!(decode_frame(line), Err(ReceiveError::Timeout));
    }

    #[test]
    fn other_status_is_a_transport_error() {
        let line = r#"{"error":{"code":13,"message":"watch channel closed"}}"#;
        assert_eq!(
            decode_frame(line),
            Err(ReceiveError::Transport("watch channel closed (code 13)".to_string()))
        );
    }
}
