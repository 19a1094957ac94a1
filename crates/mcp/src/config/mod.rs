//! Configuration management.
//! This module handles parsing, validation, and interpolation of the
//! <config_dir>/argo-mcp/config.json configuration file.

mod interpolation;
mod io;
mod model;
mod validation;

pub use interpolation::{InterpolationError, interpolate_config};
pub use io::{default_config_path, load_config, load_config_from_path};
pub use model::{ArgoMcpConfig, ArgoServerConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_BIND_ADDRESS, DEFAULT_NAMESPACE, HttpServerConfig};
pub use validation::{ValidationError, validate_config, validate_namespace};
