//! Display-ready workflow summaries for the lifecycle tools.

use argo_mcp_types::Workflow;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::watch::interpret;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub phase: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    pub node_count: usize,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,
}

impl WorkflowSummary {
    pub fn from_workflow(workflow: &Workflow, now: DateTime<Utc>) -> Self {
        let state = interpret(workflow, now);
        let metadata = &workflow.metadata;
        Self {
            name: metadata.name.clone(),
            namespace: metadata.namespace.clone(),
            uid: metadata.uid.clone(),
            phase: state.phase.to_string(),
            message: state.message,
            created_at: metadata
                .creation_timestamp
                .map(|timestamp| timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            started_at: state.started_at,
            finished_at: state.finished_at,
            duration: state.duration,
            progress: state.progress,
            node_count: workflow.status.nodes.len(),
            labels: metadata.labels.clone(),
        }
    }
}
