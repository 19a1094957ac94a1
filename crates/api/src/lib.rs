//! Argo Server API client.
//!
//! This crate provides a thin client for the Argo Workflows server REST API.
//! It focuses on:
//!
//! - Constructing an HTTP client with bearer authentication and sensible defaults
//! - Validating the configured server base URL
//! - Mapping HTTP and gRPC statuses onto a small error taxonomy
//! - Exposing the workflow event stream as a pull-based [`EventSubscription`]
//!
//! The primary entry point is [`ArgoClient`]. Callers that only need the
//! lifecycle operations should depend on the [`WorkflowBackend`] trait so tests
//! can substitute an in-memory implementation.
//!
//! # Example
//!
//! ```ignore
//! use argo_mcp_api::{ArgoClient, ArgoClientSettings, WorkflowBackend};
//!
//! async fn run() -> Result<(), argo_mcp_api::BackendError> {
//!     let client = ArgoClient::new(ArgoClientSettings::new("https://localhost:2746"))?;
//!     let workflow = client.get_workflow("argo", "hello-world-x7k2p").await?;
//!     println!("phase: {}", workflow.status.phase);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod events;

pub use client::{ArgoClient, ArgoClientSettings, ListOptions, SubmitOptions, WorkflowBackend};
pub use error::{BackendError, ReceiveError};
pub use events::{EventSubscription, FrameDecoder, HttpEventSubscription, WorkflowEvents, decode_frame};
