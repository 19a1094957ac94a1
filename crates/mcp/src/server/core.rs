use std::fmt;
use std::sync::Arc;

use argo_mcp_api::WorkflowBackend;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ErrorData, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{RoleServer, ServerHandler, service::RequestContext, tool, tool_handler, tool_router};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::server::log_payload::{build_log_payload, render_log_payload};
use crate::server::schemas::{ListWorkflowsRequest, ResubmitWorkflowRequest, SubmitWorkflowRequest, WatchWorkflowRequest, WorkflowRefRequest};
use crate::server::tools;
use crate::watch::{ObserveOptions, OutputRecord, render_narrative};

/// Shared services for MCP tool handlers.
pub struct ArgoToolServices {
    backend: Arc<dyn WorkflowBackend>,
    default_namespace: String,
}

impl ArgoToolServices {
    /// Create services backed by an Argo Server client (or any other backend).
    pub fn new(backend: Arc<dyn WorkflowBackend>, default_namespace: impl Into<String>) -> Self {
        Self {
            backend,
            default_namespace: default_namespace.into(),
        }
    }

    pub fn backend(&self) -> &dyn WorkflowBackend {
        self.backend.as_ref()
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Resolve a requested namespace, falling back to the configured default when blank.
    pub fn namespace(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|namespace| !namespace.is_empty())
            .unwrap_or(&self.default_namespace)
            .to_string()
    }
}

impl fmt::Debug for ArgoToolServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgoToolServices")
            .field("default_namespace", &self.default_namespace)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ArgoMcpCore {
    tool_router: ToolRouter<Self>,
    services: Arc<ArgoToolServices>,
}

#[tool_router]
impl ArgoMcpCore {
    /// Create a new MCP core handler with shared service dependencies.
    pub fn new(services: Arc<ArgoToolServices>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            services,
        }
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Submit a new Argo workflow. Input: exactly one of manifest (Workflow JSON/YAML text) or template{kind,name}; optional namespace, parameters['name=value'], generate_name, labels('k=v,k2=v2'), dry_run. Returns name, namespace, uid and phase of the created workflow. Follow with wait_for_workflow to block until it finishes."
    )]
    async fn submit_workflow(&self, param: Parameters<SubmitWorkflowRequest>) -> Result<CallToolResult, ErrorData> {
        let result = tools::submit_workflow(&self.services, &param.0).await;
        self.finish("submit_workflow", &param.0, result)
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "Get the current state of one workflow: phase, message, start/finish times, duration, progress and node count. Does not wait; use wait_for_workflow to block until completion."
    )]
    async fn get_workflow(&self, param: Parameters<WorkflowRefRequest>) -> Result<CallToolResult, ErrorData> {
        let result = tools::get_workflow(&self.services, &param.0).await;
        self.finish("get_workflow", &param.0, result)
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "List workflows in a namespace. Optional label_selector, phases[] (Pending|Running|Succeeded|Failed|Error) and limit. Returns count and workflow summaries."
    )]
    async fn list_workflows(&self, param: Parameters<ListWorkflowsRequest>) -> Result<CallToolResult, ErrorData> {
        let result = tools::list_workflows(&self.services, &param.0).await;
        self.finish("list_workflows", &param.0, result)
    }

    #[tool(
        annotations(destructive_hint = true, open_world_hint = true),
        description = "Delete a workflow and its history from the cluster. Input: name, namespace?."
    )]
    async fn delete_workflow(&self, param: Parameters<WorkflowRefRequest>) -> Result<CallToolResult, ErrorData> {
        let result = tools::delete_workflow(&self.services, &param.0).await;
        self.finish("delete_workflow", &param.0, result)
    }

    #[tool(
        annotations(open_world_hint = true),
        description = "Resubmit a workflow as a new run. Input: name, namespace?, memoized? (reuse cached step outputs). Returns the new workflow's summary."
    )]
    async fn resubmit_workflow(&self, param: Parameters<ResubmitWorkflowRequest>) -> Result<CallToolResult, ErrorData> {
        let result = tools::resubmit_workflow(&self.services, &param.0).await;
        self.finish("resubmit_workflow", &param.0, result)
    }

    #[tool(
        annotations(open_world_hint = true, idempotent_hint = true),
        description = "Suspend a running workflow. Input: name, namespace?."
    )]
    async fn suspend_workflow(&self, param: Parameters<WorkflowRefRequest>) -> Result<CallToolResult, ErrorData> {
        let result = tools::suspend_workflow(&self.services, &param.0).await;
        self.finish("suspend_workflow", &param.0, result)
    }

    #[tool(
        annotations(open_world_hint = true, idempotent_hint = true),
        description = "Resume a suspended workflow. Input: name, namespace?."
    )]
    async fn resume_workflow(&self, param: Parameters<WorkflowRefRequest>) -> Result<CallToolResult, ErrorData> {
        let result = tools::resume_workflow(&self.services, &param.0).await;
        self.finish("resume_workflow", &param.0, result)
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "Block until a workflow reaches Succeeded, Failed or Error, then return its final phase, message, timing and progress. Input: name, namespace?, timeout? ('30s', '10m', '1h30m'). On timeout returns timedOut=true with the last observed phase instead of failing."
    )]
    async fn wait_for_workflow(
        &self,
        param: Parameters<WatchWorkflowRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = tools::observe_workflow(&self.services, &param.0, ObserveOptions::wait(), &context.ct).await;
        self.finish_observation("wait_for_workflow", &param.0, result)
    }

    #[tool(
        annotations(read_only_hint = true, open_world_hint = true),
        description = "Follow a workflow's events until it finishes, recording every phase transition. Input: name, namespace?, timeout?. Returns the final state plus events[] (type, phase, timestamp, progress) in arrival order."
    )]
    async fn watch_workflow(
        &self,
        param: Parameters<WatchWorkflowRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = tools::observe_workflow(&self.services, &param.0, ObserveOptions::watch(), &context.ct).await;
        self.finish_observation("watch_workflow", &param.0, result)
    }

    fn finish(&self, tool_name: &str, request: &impl Serialize, result: Result<Value, ErrorData>) -> Result<CallToolResult, ErrorData> {
        let request = serde_json::to_value(request).unwrap_or(Value::Null);
        match result {
            Ok(structured) => {
                let response = CallToolResult::structured(structured);
                self.emit_log(tool_name, Some(request), Some(serde_json::to_value(&response).unwrap_or(Value::Null)));
                Ok(response)
            }
            Err(error) => {
                warn!(tool = tool_name, code = ?error.code, message = %error.message, "tool call failed");
                self.emit_log(tool_name, Some(request), error.data.clone());
                Err(error)
            }
        }
    }

    fn finish_observation(
        &self,
        tool_name: &str,
        request: &WatchWorkflowRequest,
        result: Result<OutputRecord, ErrorData>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = result.and_then(|record| {
            let narrative = render_narrative(&record);
            serde_json::to_value(&record)
                .map(|structured| (structured, narrative))
                .map_err(|error| ErrorData::internal_error(error.to_string(), None))
        });
        match result {
            Ok((structured, narrative)) => {
                let mut response = self.finish(tool_name, request, Ok(structured))?;
                response.content.push(Content::text(narrative));
                Ok(response)
            }
            Err(error) => self.finish(tool_name, request, Err(error)),
        }
    }

    fn emit_log(&self, tool_name: &str, request: Option<Value>, response: Option<Value>) {
        info!(tool = tool_name, "MCP tool call");
        if let Some(payload) = build_log_payload(request, response) {
            debug!(tool = tool_name, payload = %render_log_payload(&payload), "MCP tool payload");
        }
    }
}

#[tool_handler]
impl ServerHandler for ArgoMcpCore {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "argo-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Argo Workflows MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(format!(
                "Tools for Argo Workflows. Namespace defaults to '{}' when omitted.\nLIFECYCLE:\n- submit_workflow -> wait_for_workflow to block until the run settles.\n- watch_workflow when the sequence of phase transitions matters.\n- get_workflow for a non-blocking snapshot; list_workflows to discover names.\nTIMEOUTS:\n- wait_for_workflow and watch_workflow accept timeout like '30s', '10m', '1h30m'.\n- A timeout is not an error: the result has timedOut=true and the last observed phase.",
                self.services.default_namespace()
            )),
        }
    }
}
