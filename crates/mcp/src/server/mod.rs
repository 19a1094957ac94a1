mod core;
mod errors;
mod http;
mod log_payload;
mod schemas;
mod tools;

pub use core::{ArgoMcpCore, ArgoToolServices};
pub use http::{McpHttpServer, RunningMcpHttpServer, ServeError, resolve_bind_address, serve_stdio};
pub use schemas::{ListWorkflowsRequest, ResubmitWorkflowRequest, SubmitWorkflowRequest, TemplateKind, TemplateReference, WatchWorkflowRequest, WorkflowRefRequest};
pub use tools::WorkflowSummary;
