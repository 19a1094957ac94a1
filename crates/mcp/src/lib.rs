//! Model Context Protocol (MCP) server for Argo Workflows.
//!
//! This crate exposes workflow lifecycle tools over MCP, including a
//! streaming observer that blocks until a workflow settles. It provides:
//!
//! - [`watch`]: the subscription-driven receive loop behind `wait_for_workflow`
//!   and `watch_workflow`
//! - [`server`]: the rmcp tool router plus stdio and streamable HTTP hosts
//! - [`config`]: loading, interpolation and validation of the config file

pub mod config;
pub mod server;
pub mod watch;

#[cfg(test)]
mod testing;

pub use config::{ArgoMcpConfig, ConfigError, load_config, load_config_from_path};
pub use server::{ArgoMcpCore, ArgoToolServices, McpHttpServer, RunningMcpHttpServer, ServeError, resolve_bind_address, serve_stdio};
pub use watch::{ObserveOptions, OutputRecord, WatchError, WatchTarget, observe, render_narrative};
