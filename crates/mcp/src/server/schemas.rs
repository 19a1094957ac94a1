use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of stored resource a workflow can be submitted from.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    WorkflowTemplate,
    ClusterWorkflowTemplate,
    CronWorkflow,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::WorkflowTemplate => "WorkflowTemplate",
            TemplateKind::ClusterWorkflowTemplate => "ClusterWorkflowTemplate",
            TemplateKind::CronWorkflow => "CronWorkflow",
        }
    }
}

/// Reference to a stored template.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateReference {
    #[schemars(description = "Resource kind: WorkflowTemplate, ClusterWorkflowTemplate or CronWorkflow.")]
    pub kind: TemplateKind,
    #[schemars(description = "Name of the stored template.")]
    pub name: String,
}

/// Parameters for workflow submission.
///
/// Exactly one of `manifest` and `template` must be provided.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SubmitWorkflowRequest {
    #[schemars(description = "Target namespace. Defaults to the manifest namespace, then the configured default namespace.")]
    pub namespace: Option<String>,
    #[schemars(description = "Inline Workflow manifest as JSON or YAML text.")]
    pub manifest: Option<String>,
    #[schemars(description = "Submit from a stored template instead of an inline manifest.")]
    pub template: Option<TemplateReference>,
    #[schemars(description = "Workflow parameters as 'name=value' strings.")]
    pub parameters: Option<Vec<String>>,
    #[schemars(description = "Override metadata.generateName for the new workflow.")]
    pub generate_name: Option<String>,
    #[schemars(description = "Extra labels as comma-separated 'key=value' pairs.")]
    pub labels: Option<String>,
    #[schemars(description = "Validate on the server without creating the workflow.")]
    pub dry_run: Option<bool>,
}

/// Parameters for single-workflow lookups and actions.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowRefRequest {
    #[schemars(description = "Workflow name, for example 'hello-world-x7k2p'.")]
    pub name: String,
    #[schemars(description = "Namespace. Defaults to the configured default namespace.")]
    pub namespace: Option<String>,
}

/// Parameters for resubmitting a finished workflow.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResubmitWorkflowRequest {
    #[schemars(description = "Name of the workflow to resubmit.")]
    pub name: String,
    #[schemars(description = "Namespace. Defaults to the configured default namespace.")]
    pub namespace: Option<String>,
    #[schemars(description = "Reuse memoized step results from the original run.")]
    pub memoized: Option<bool>,
}

/// Parameters for workflow listing.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ListWorkflowsRequest {
    #[schemars(description = "Namespace. Defaults to the configured default namespace.")]
    pub namespace: Option<String>,
    #[schemars(description = "Kubernetes label selector, for example 'app=etl,team!=qa'.")]
    pub label_selector: Option<String>,
    #[schemars(description = "Only return workflows in these phases: Pending, Running, Succeeded, Failed, Error.")]
    pub phases: Option<Vec<String>>,
    #[schemars(description = "Maximum number of workflows to return.")]
    pub limit: Option<u32>,
}

/// Parameters for the wait and watch tools.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchWorkflowRequest {
    #[schemars(description = "Workflow name to observe.")]
    pub name: String,
    #[schemars(description = "Namespace. Defaults to the configured default namespace.")]
    pub namespace: Option<String>,
    #[schemars(description = "Overall deadline such as '30s', '10m' or '1h30m'. Omit to wait until the workflow finishes.")]
    pub timeout: Option<String>,
}
