//! Workflow watch events.

use crate::workflow::Workflow;

/// A single state-change notification from the workflow event stream.
///
/// `event_type` is the server's opaque change kind (`ADDED`, `MODIFIED`,
/// `DELETED`). `object` is `None` when the frame carried no snapshot or the
/// snapshot could not be decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvent {
    pub event_type: String,
    pub object: Option<Workflow>,
}

impl RawEvent {
    pub fn new(event_type: impl Into<String>, object: Option<Workflow>) -> Self {
        Self {
            event_type: event_type.into(),
            object,
        }
    }
}
