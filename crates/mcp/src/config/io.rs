//! Configuration IO helpers.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use tracing::debug;

use crate::config::{ArgoMcpConfig, ConfigError, interpolate_config, validate_config};

/// Returns the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var("ARGO_MCP_CONFIG_PATH")
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("argo-mcp").join("config.json")
}

/// Loads configuration from the default path.
pub fn load_config() -> Result<ArgoMcpConfig, ConfigError> {
    let path = default_config_path();
    load_config_from_path(&path)
}

/// Loads configuration from a specific path.
///
/// A missing file yields the defaults. `ARGO_SERVER`, `ARGO_TOKEN` and
/// `ARGO_NAMESPACE` override file values after interpolation.
pub fn load_config_from_path(path: &Path) -> Result<ArgoMcpConfig, ConfigError> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        debug!(path = %path.display(), "config file not found; using defaults");
        ArgoMcpConfig::default()
    };
    interpolate_config(&mut config)?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut ArgoMcpConfig) {
    if let Some(server) = non_blank_var("ARGO_SERVER") {
        config.argo_server.base_url = if server.contains("://") { server } else { format!("https://{server}") };
    }
    if let Some(token) = non_blank_var("ARGO_TOKEN") {
        config.argo_server.token = Some(token);
    }
    if let Some(namespace) = non_blank_var("ARGO_NAMESPACE") {
        config.argo_server.namespace = namespace;
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs_next::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationError;

    const ARGO_VARS: [&str; 3] = ["ARGO_SERVER", "ARGO_TOKEN", "ARGO_NAMESPACE"];

    #[test]
    fn default_path_honors_environment_override() {
        temp_env::with_var("ARGO_MCP_CONFIG_PATH", Some("/etc/argo-mcp/config.json"), || {
            assert_eq!(default_config_path(), PathBuf::from("/etc/argo-mcp/config.json"));
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let directory = tempfile::tempdir().unwrap();
        temp_env::with_vars_unset(ARGO_VARS, || {
            let config = load_config_from_path(&directory.path().join("absent.json")).unwrap();
            assert_eq!(config, ArgoMcpConfig::default());
        });
    }

    #[test]
    fn reads_file_and_applies_env_overrides() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("config.json");
        fs::write(
            &path,
            r#"{ "argoServer": { "baseUrl": "https://argo.internal:2746", "token": "${env:ARGO_MCP_FILE_TOKEN}", "namespace": "ci" } }"#,
        )
        .unwrap();

        temp_env::with_vars(
            [
                ("ARGO_MCP_FILE_TOKEN", Some("from-file")),
                ("ARGO_SERVER", Some("argo.example.com:443")),
                ("ARGO_TOKEN", None),
                ("ARGO_NAMESPACE", Some("prod")),
            ],
            || {
                let config = load_config_from_path(&path).unwrap();
                assert_eq!(config.argo_server.base_url, "https://argo.example.com:443");
                assert_eq!(config.argo_server.token.as_deref(), Some("from-file"));
                assert_eq!(config.argo_server.namespace, "prod");
            },
        );
    }

    #[test]
    fn invalid_values_fail_validation() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("config.json");
        fs::write(&path, r#"{ "argoServer": { "namespace": "" } }"#).unwrap();
        temp_env::with_vars_unset(ARGO_VARS, || {
            let error = load_config_from_path(&path).unwrap_err();
            assert!(matches!(error, ConfigError::Validation(ValidationError::InvalidValue { .. })));
        });
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let error = load_config_from_path(&path).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
    }
}
