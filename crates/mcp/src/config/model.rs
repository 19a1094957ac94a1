//! Data models for the argo-mcp configuration file.

use std::path::PathBuf;
use std::time::Duration;

use argo_mcp_api::ArgoClientSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::interpolation::InterpolationError;
use crate::config::validation::ValidationError;

pub const DEFAULT_BASE_URL: &str = "https://localhost:2746";
pub const DEFAULT_NAMESPACE: &str = "argo";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:62890";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArgoMcpConfig {
    /// Connection to the Argo Server.
    #[serde(default)]
    pub argo_server: ArgoServerConfig,
    /// Local streamable HTTP transport settings.
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Connection settings for the Argo Server REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ArgoServerConfig {
    pub base_url: String,
    /// Bearer token; usually `${env:ARGO_TOKEN}` or `${secret:NAME}`.
    pub token: Option<String>,
    /// Namespace used when a tool call does not name one.
    pub namespace: String,
    /// Timeout for unary calls. Event streams are bounded by the caller's deadline instead.
    pub request_timeout_secs: u64,
    pub insecure_skip_tls_verify: bool,
}

impl Default for ArgoServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            insecure_skip_tls_verify: false,
        }
    }
}

impl ArgoServerConfig {
    /// Client settings for [`argo_mcp_api::ArgoClient::new`].
    pub fn client_settings(&self) -> ArgoClientSettings {
        ArgoClientSettings {
            base_url: self.base_url.clone(),
            token: self.token.clone().filter(|token| !token.trim().is_empty()),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            insecure_skip_tls_verify: self.insecure_skip_tls_verify,
        }
    }
}

/// Configuration for the local MCP HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpServerConfig {
    /// Bind address (for example, "127.0.0.1:0"). Must be loopback.
    pub bind_address: Option<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_address: Some(DEFAULT_BIND_ADDRESS.to_string()),
        }
    }
}

/// Failure to load the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ArgoMcpConfig = serde_json::from_str(r#"{ "argoServer": { "namespace": "ci" } }"#).unwrap();
        assert_eq!(config.argo_server.namespace, "ci");
        assert_eq!(config.argo_server.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.argo_server.request_timeout_secs, 30);
        assert_eq!(config.http_server.bind_address.as_deref(), Some(DEFAULT_BIND_ADDRESS));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<ArgoMcpConfig>(r#"{ "argoServer": { "server": "x" } }"#).is_err());
    }

    #[test]
    fn blank_token_is_not_sent() {
        let config = ArgoServerConfig {
            token: Some("  ".to_string()),
            ..Default::default()
        };
        let settings = config.client_settings();
        assert!(settings.token.is_none());
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }
}
