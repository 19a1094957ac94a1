//! Shared resource models for the Argo MCP workspace.
//!
//! These types mirror the subset of the Argo Workflows API that the backend
//! client and the MCP tool layer exchange. Unknown fields are ignored so newer
//! server versions keep decoding.

pub mod event;
pub mod workflow;

pub use event::RawEvent;
pub use workflow::{ObjectMeta, Workflow, WorkflowPhase, WorkflowStatus};
