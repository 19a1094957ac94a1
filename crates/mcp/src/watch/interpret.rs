//! Interpretation of single workflow snapshots.

use argo_mcp_types::{Workflow, WorkflowPhase};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::watch::duration::format_time_delta;

/// Display-ready view of one workflow snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretedState {
    pub phase: WorkflowPhase,
    pub message: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    /// Elapsed time; measured against `now` while the workflow is unfinished.
    pub duration: Option<String>,
    pub progress: Option<String>,
}

impl InterpretedState {
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

/// Interpret a snapshot relative to `now`.
pub fn interpret(workflow: &Workflow, now: DateTime<Utc>) -> InterpretedState {
    let status = &workflow.status;
    let duration = status
        .started_at
        .map(|started_at| format_time_delta(status.finished_at.unwrap_or(now) - started_at));
    let progress = Some(status.progress.trim()).filter(|progress| !progress.is_empty()).map(str::to_string);

    InterpretedState {
        phase: status.phase,
        message: status.message.clone(),
        started_at: status.started_at.map(format_timestamp),
        finished_at: status.finished_at.map(format_timestamp),
        duration,
        progress,
    }
}

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
