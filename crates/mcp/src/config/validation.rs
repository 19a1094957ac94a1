//! Configuration validation.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::ArgoMcpConfig;

/// Kubernetes namespaces are DNS-1123 labels.
static NAMESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").expect("namespace regex should compile"));

/// Validate the loaded configuration.
pub fn validate_config(config: &ArgoMcpConfig) -> Result<(), ValidationError> {
    let server = &config.argo_server;
    validate_namespace(&server.namespace)?;
    validate_base_url(&server.base_url)?;
    if server.request_timeout_secs == 0 {
        return Err(ValidationError::InvalidValue {
            field: "argoServer.requestTimeoutSecs".to_string(),
            reason: "request timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Validate a namespace name.
pub fn validate_namespace(namespace: &str) -> Result<(), ValidationError> {
    if namespace.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "argoServer.namespace".to_string(),
            reason: "namespace cannot be empty".to_string(),
        });
    }
    if !NAMESPACE_REGEX.is_match(namespace) {
        return Err(ValidationError::InvalidValue {
            field: "argoServer.namespace".to_string(),
            reason: format!("'{namespace}' is not a valid namespace name"),
        });
    }
    Ok(())
}

fn validate_base_url(base_url: &str) -> Result<(), ValidationError> {
    let url = Url::parse(base_url).map_err(|error| ValidationError::InvalidUrl {
        url: base_url.to_string(),
        reason: error.to_string(),
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ValidationError::InvalidUrl {
            url: base_url.to_string(),
            reason: format!("unsupported URL scheme: {scheme} (expected http/https)"),
        });
    }
    if url.host_str().is_none() {
        return Err(ValidationError::InvalidUrl {
            url: base_url.to_string(),
            reason: "URL must include a host".to_string(),
        });
    }
    Ok(())
}

/// Validation errors for configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid argoServer.baseUrl '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ArgoMcpConfig::default()).is_ok());
    }

    #[test]
    fn rejects_empty_or_malformed_namespace() {
        assert!(validate_namespace("").is_err());
        assert!(validate_namespace("Argo_Workflows").is_err());
        assert!(validate_namespace("argo-ci").is_ok());
    }

    #[test]
    fn rejects_bad_base_url_and_zero_timeout() {
        let mut config = ArgoMcpConfig::default();
        config.argo_server.base_url = "localhost:2746/".to_string();
        assert!(matches!(validate_config(&config), Err(ValidationError::InvalidUrl { .. })));

        let mut config = ArgoMcpConfig::default();
        config.argo_server.request_timeout_secs = 0;
        assert!(matches!(validate_config(&config), Err(ValidationError::InvalidValue { .. })));
    }
}
