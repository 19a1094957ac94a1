//! Tool handlers behind the MCP router.

pub mod lifecycle;
pub mod observe;
pub mod summary;

pub use lifecycle::{delete_workflow, get_workflow, list_workflows, resubmit_workflow, resume_workflow, submit_workflow, suspend_workflow};
pub use observe::observe_workflow;
pub use summary::WorkflowSummary;
