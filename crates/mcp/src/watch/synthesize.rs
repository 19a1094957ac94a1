//! Output records and narratives for finished observations.

use std::fmt::Write as _;

use serde::Serialize;

use crate::watch::controller::StopReason;
use crate::watch::duration::format_timeout;
use crate::watch::interpret::InterpretedState;
use crate::watch::target::WatchTarget;

pub const UNKNOWN_PHASE: &str = "Unknown";
pub const NO_EVENTS_MESSAGE: &str = "No workflow events received";

/// Final result of an observe call. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    pub timed_out: bool,
    /// Every accepted event in arrival order; only kept by the continuous watch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventSummary>>,
}

/// One accepted event as seen by the continuous watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    #[serde(rename = "type")]
    pub event_type: String,
    pub phase: String,
    /// Receive time.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
}

/// Build the output record from the last known state and the stop reason.
///
/// Never called for a fatal stream error; that outcome fails the call instead.
pub(crate) fn synthesize(
    target: &WatchTarget,
    state: Option<&InterpretedState>,
    stop_reason: &StopReason,
    events: Option<Vec<EventSummary>>,
) -> OutputRecord {
    let mut record = match state {
        Some(state) => OutputRecord {
            name: target.name().to_string(),
            namespace: target.namespace().to_string(),
            phase: state.phase.to_string(),
            message: state.message.clone(),
            started_at: state.started_at.clone(),
            finished_at: state.finished_at.clone(),
            duration: state.duration.clone(),
            progress: state.progress.clone(),
            timed_out: false,
            events: None,
        },
        None => OutputRecord {
            name: target.name().to_string(),
            namespace: target.namespace().to_string(),
            phase: UNKNOWN_PHASE.to_string(),
            message: NO_EVENTS_MESSAGE.to_string(),
            started_at: None,
            finished_at: None,
            duration: None,
            progress: None,
            timed_out: false,
            events: None,
        },
    };

    if matches!(stop_reason, StopReason::TimedOut) {
        record.timed_out = true;
        record.message = match target.timeout() {
            Some(timeout) => format!("Watch timed out after {}. Last phase: {}", format_timeout(timeout), record.phase),
            None => format!("Watch timed out. Last phase: {}", record.phase),
        };
    }
    record.events = events;
    record
}

/// Human-readable summary for interactive callers.
pub fn render_narrative(record: &OutputRecord) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Workflow: {}", record.name);
    let _ = writeln!(text, "Namespace: {}", record.namespace);
    let _ = writeln!(text, "Phase: {}", record.phase);
    if !record.message.is_empty() {
        let _ = writeln!(text, "Message: {}", record.message);
    }
    if let Some(started_at) = record.started_at.as_deref() {
        let _ = writeln!(text, "Started: {started_at}");
    }
    if let Some(finished_at) = record.finished_at.as_deref() {
        let _ = writeln!(text, "Finished: {finished_at}");
    }
    if let Some(duration) = record.duration.as_deref() {
        let _ = writeln!(text, "Duration: {duration}");
    }
    if let Some(progress) = record.progress.as_deref() {
        let _ = writeln!(text, "Progress: {progress}");
    }
    if record.timed_out {
        let _ = writeln!(text, "Timed out: yes");
    }

    if let Some(events) = record.events.as_ref() {
        let _ = writeln!(text);
        let _ = writeln!(text, "Events ({}):", events.len());
        for (index, event) in events.iter().enumerate() {
            let _ = write!(text, "  {}. [{}] {} at {}", index + 1, event.event_type, event.phase, event.timestamp);
            if let Some(progress) = event.progress.as_deref() {
                let _ = write!(text, " ({progress})");
            }
            let _ = writeln!(text);
        }
    }
    text
}
