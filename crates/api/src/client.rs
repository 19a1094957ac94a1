//! HTTP client for workflow lifecycle operations.

use std::time::Duration;

use argo_mcp_types::Workflow;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::error::BackendError;
use crate::events::{EventSubscription, HttpEventSubscription, WorkflowEvents};

/// Hostnames allowed to use plain HTTP.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`ArgoClient`].
#[derive(Debug, Clone)]
pub struct ArgoClientSettings {
    pub base_url: String,
    /// Bearer token; a leading `Bearer ` prefix is accepted and stripped.
    pub token: Option<String>,
    /// Timeout for unary calls. The event stream is bounded by the caller instead.
    pub request_timeout: Duration,
    pub insecure_skip_tls_verify: bool,
}

impl ArgoClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            insecure_skip_tls_verify: false,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Options for submitting a workflow.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// `name=value` parameter overrides.
    pub parameters: Vec<String>,
    pub generate_name: Option<String>,
    /// Comma separated `key=value` labels.
    pub labels: Option<String>,
    pub server_dry_run: bool,
}

/// Filters for listing workflows.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub label_selector: Option<String>,
    pub limit: Option<u32>,
}

/// Workflow lifecycle operations offered by the Argo Server.
#[async_trait]
pub trait WorkflowBackend: WorkflowEvents {
    async fn submit_workflow(&self, namespace: &str, manifest: Value, options: &SubmitOptions) -> Result<Workflow, BackendError>;

    /// Submit a new workflow from a `WorkflowTemplate`, `ClusterWorkflowTemplate` or `CronWorkflow`.
    async fn submit_from_resource(
        &self,
        namespace: &str,
        resource_kind: &str,
        resource_name: &str,
        options: &SubmitOptions,
    ) -> Result<Workflow, BackendError>;

    async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError>;

    async fn list_workflows(&self, namespace: &str, options: &ListOptions) -> Result<Vec<Workflow>, BackendError>;

    async fn delete_workflow(&self, namespace: &str, name: &str) -> Result<(), BackendError>;

    async fn resubmit_workflow(&self, namespace: &str, name: &str, memoized: bool) -> Result<Workflow, BackendError>;

    async fn suspend_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError>;

    async fn resume_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError>;
}

#[derive(Debug, Deserialize)]
struct WorkflowList {
    #[serde(default)]
    items: Option<Vec<Workflow>>,
}

/// Thin wrapper around a configured `reqwest::Client` for Argo Server access.
#[derive(Debug, Clone)]
pub struct ArgoClient {
    base_url: Url,
    http: Client,
    user_agent: String,
    request_timeout: Duration,
}

impl ArgoClient {
    /// Build a client from settings, validating the base URL first.
    pub fn new(settings: ArgoClientSettings) -> Result<Self, BackendError> {
        let base_url = validate_base_url(&settings.base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(token) = settings.token.as_deref().map(str::trim).filter(|token| !token.is_empty()) {
            let token = token.strip_prefix("Bearer ").unwrap_or(token);
            let mut value = header::HeaderValue::from_str(&format!("Bearer {token}")).map_err(|error| BackendError::InvalidConfig {
                message: format!("token is not a valid header value: {error}"),
            })?;
            value.set_sensitive(true);
            default_headers.insert(header::AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(default_headers)
            .danger_accept_invalid_certs(settings.insecure_skip_tls_verify)
            .build()
            .map_err(|error| BackendError::InvalidConfig {
                message: format!("build http client: {error}"),
            })?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("argo-mcp/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
            request_timeout: settings.request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidConfig {
                message: "base url cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        debug!(%url, %method, "building argo request");
        Ok(self.http.request(method, url).header(header::USER_AGENT, &self.user_agent))
    }

    async fn send_unary(&self, builder: RequestBuilder, namespace: &str, name: Option<&str>) -> Result<Response, BackendError> {
        let response = builder
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(BackendError::from_transport)?;
        ensure_success(response, namespace, name).await
    }

    async fn send_for_workflow(&self, builder: RequestBuilder, namespace: &str, name: Option<&str>) -> Result<Workflow, BackendError> {
        let response = self.send_unary(builder, namespace, name).await?;
        response.json::<Workflow>().await.map_err(BackendError::from_transport)
    }

    async fn workflow_action(&self, namespace: &str, name: &str, action: &str, body: Value) -> Result<Workflow, BackendError> {
        let builder = self.request(Method::PUT, &["workflows", namespace, name, action])?.json(&body);
        self.send_for_workflow(builder, namespace, Some(name)).await
    }
}

#[async_trait]
impl WorkflowBackend for ArgoClient {
    async fn submit_workflow(&self, namespace: &str, manifest: Value, options: &SubmitOptions) -> Result<Workflow, BackendError> {
        let mut manifest = manifest;
        apply_submit_options(&mut manifest, namespace, options);
        let body = json!({
            "namespace": namespace,
            "serverDryRun": options.server_dry_run,
            "workflow": manifest,
        });
        let builder = self.request(Method::POST, &["workflows", namespace])?.json(&body);
        self.send_for_workflow(builder, namespace, None).await
    }

    async fn submit_from_resource(
        &self,
        namespace: &str,
        resource_kind: &str,
        resource_name: &str,
        options: &SubmitOptions,
    ) -> Result<Workflow, BackendError> {
        let mut submit_options = serde_json::Map::new();
        if !options.parameters.is_empty() {
            submit_options.insert("parameters".to_string(), json!(options.parameters));
        }
        if let Some(generate_name) = options.generate_name.as_ref() {
            submit_options.insert("generateName".to_string(), json!(generate_name));
        }
        if let Some(labels) = options.labels.as_ref() {
            submit_options.insert("labels".to_string(), json!(labels));
        }
        if options.server_dry_run {
            submit_options.insert("serverDryRun".to_string(), json!(true));
        }
        let body = json!({
            "namespace": namespace,
            "resourceKind": resource_kind,
            "resourceName": resource_name,
            "submitOptions": submit_options,
        });
        let builder = self.request(Method::POST, &["workflows", namespace, "submit"])?.json(&body);
        self.send_for_workflow(builder, namespace, Some(resource_name)).await
    }

    async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError> {
        let builder = self.request(Method::GET, &["workflows", namespace, name])?;
        self.send_for_workflow(builder, namespace, Some(name)).await
    }

    async fn list_workflows(&self, namespace: &str, options: &ListOptions) -> Result<Vec<Workflow>, BackendError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(selector) = options.label_selector.as_ref().filter(|selector| !selector.is_empty()) {
            query.push(("listOptions.labelSelector", selector.clone()));
        }
        if let Some(limit) = options.limit {
            query.push(("listOptions.limit", limit.to_string()));
        }
        let builder = self.request(Method::GET, &["workflows", namespace])?.query(&query);
        let response = self.send_unary(builder, namespace, None).await?;
        let list = response.json::<WorkflowList>().await.map_err(BackendError::from_transport)?;
        Ok(list.items.unwrap_or_default())
    }

    async fn delete_workflow(&self, namespace: &str, name: &str) -> Result<(), BackendError> {
        let builder = self.request(Method::DELETE, &["workflows", namespace, name])?;
        self.send_unary(builder, namespace, Some(name)).await?;
        Ok(())
    }

    async fn resubmit_workflow(&self, namespace: &str, name: &str, memoized: bool) -> Result<Workflow, BackendError> {
        let body = json!({ "namespace": namespace, "name": name, "memoized": memoized });
        let builder = self.request(Method::PUT, &["workflows", namespace, name, "resubmit"])?.json(&body);
        self.send_for_workflow(builder, namespace, Some(name)).await
    }

    async fn suspend_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError> {
        self.workflow_action(namespace, name, "suspend", json!({ "namespace": namespace, "name": name }))
            .await
    }

    async fn resume_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError> {
        self.workflow_action(namespace, name, "resume", json!({ "namespace": namespace, "name": name }))
            .await
    }
}

#[async_trait]
impl WorkflowEvents for ArgoClient {
    async fn subscribe(&self, namespace: &str, name: &str) -> Result<Box<dyn EventSubscription>, BackendError> {
        let field_selector = format!("metadata.name={name}");
        let builder = self
            .request(Method::GET, &["workflow-events", namespace])?
            .query(&[("listOptions.fieldSelector", field_selector.as_str())]);
        let response = builder.send().await.map_err(BackendError::from_transport)?;
        let response = ensure_success(response, namespace, Some(name)).await?;
        Ok(Box::new(HttpEventSubscription::new(response)))
    }
}

async fn ensure_success(response: Response, namespace: &str, name: Option<&str>) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::from_status(status, &body, namespace, name))
}

/// Merge submit options into an inline manifest before sending it.
fn apply_submit_options(manifest: &mut Value, namespace: &str, options: &SubmitOptions) {
    let Some(object) = manifest.as_object_mut() else {
        return;
    };
    let metadata = object.entry("metadata").or_insert_with(|| json!({}));
    if let Some(metadata) = metadata.as_object_mut() {
        metadata.insert("namespace".to_string(), json!(namespace));
        if let Some(generate_name) = options.generate_name.as_ref() {
            metadata.remove("name");
            metadata.insert("generateName".to_string(), json!(generate_name));
        }
        if let Some(labels) = options.labels.as_ref() {
            let label_map = metadata.entry("labels").or_insert_with(|| json!({}));
            if let Some(label_map) = label_map.as_object_mut() {
                for (key, value) in labels.split(',').filter_map(|pair| pair.split_once('=')) {
                    label_map.insert(key.trim().to_string(), json!(value.trim()));
                }
            }
        }
    }

    if options.parameters.is_empty() {
        return;
    }
    let spec = object.entry("spec").or_insert_with(|| json!({}));
    let Some(spec) = spec.as_object_mut() else {
        return;
    };
    let arguments = spec.entry("arguments").or_insert_with(|| json!({}));
    let Some(arguments) = arguments.as_object_mut() else {
        return;
    };
    let parameters = arguments.entry("parameters").or_insert_with(|| json!([]));
    let Some(parameters) = parameters.as_array_mut() else {
        return;
    };
    for (key, value) in options.parameters.iter().filter_map(|pair| pair.split_once('=')) {
        let existing = parameters
            .iter_mut()
            .find(|parameter| parameter.get("name").and_then(Value::as_str) == Some(key));
        match existing {
            Some(parameter) => parameter["value"] = json!(value),
            None => parameters.push(json!({ "name": key, "value": value })),
        }
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// `localhost` and loopback hosts may use any scheme; every other host must
/// use HTTPS so bearer tokens are never sent in clear text.
fn validate_base_url(base: &str) -> Result<Url, BackendError> {
    let parsed = Url::parse(base.trim()).map_err(|error| BackendError::InvalidConfig {
        message: format!("invalid argo server url '{base}': {error}"),
    })?;
    let host = parsed.host_str().ok_or_else(|| BackendError::InvalidConfig {
        message: "argo server url must include a host".to_string(),
    })?;

    if LOCALHOST_DOMAINS.iter().any(|allowed| host.eq_ignore_ascii_case(allowed)) {
        return Ok(parsed);
    }
    if parsed.scheme() != "https" {
        return Err(BackendError::InvalidConfig {
            message: format!("argo server url must use https for non-localhost hosts; got '{}://'", parsed.scheme()),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argo_mcp_types::WorkflowPhase;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ArgoClient {
        ArgoClient::new(ArgoClientSettings::new(server.uri()).with_token("secret-token")).unwrap()
    }

    #[test]
    fn rejects_plain_http_for_remote_hosts() {
        assert!(validate_base_url("http://argo.example.com").is_err());
        assert!(validate_base_url("https://argo.example.com").is_ok());
        assert!(validate_base_url("http://localhost:2746").is_ok());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn submit_options_merge_into_manifest() {
        let mut manifest = json!({
            "metadata": { "name": "fixed" },
            "spec": { "arguments": { "parameters": [{ "name": "message", "value": "hi" }] } }
        });
        let options = SubmitOptions {
            parameters: vec!["message=bye".to_string(), "count=3".to_string()],
            generate_name: Some("hello-".to_string()),
            labels: Some("team=data, env=dev".to_string()),
            server_dry_run: false,
        };
        apply_submit_options(&mut manifest, "argo", &options);

        assert_eq!(manifest["metadata"]["namespace"], "argo");
        assert_eq!(manifest["metadata"]["generateName"], "hello-");
        assert!(manifest["metadata"].get("name").is_none());
        assert_eq!(manifest["metadata"]["labels"]["env"], "dev");
        let parameters = manifest["spec"]["arguments"]["parameters"].as_array().unwrap();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0]["value"], "bye");
        assert_eq!(parameters[1]["name"], "count");
    }

    #[tokio::test]
    async fn get_workflow_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workflows/argo/hello"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": { "name": "hello", "namespace": "argo" },
                "status": { "phase": "Succeeded" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let workflow = client_for(&server).get_workflow("argo", "hello").await.unwrap();
        assert_eq!(workflow.status.phase, WorkflowPhase::Succeeded);
    }

    #[tokio::test]
    async fn missing_workflow_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workflows/argo/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "code": 5, "message": "not found" })))
            .mount(&server)
            .await;

        let error = client_for(&server).get_workflow("argo", "missing").await.unwrap_err();
        assert!(matches!(error, BackendError::NotFound { ref name, .. } if name == "missing"));
    }

    #[tokio::test]
    async fn list_passes_selector_and_tolerates_null_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workflows/argo"))
            .and(query_param("listOptions.labelSelector", "team=data"))
            .and(query_param("listOptions.limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "metadata": {}, "items": null })))
            .mount(&server)
            .await;

        let options = ListOptions {
            label_selector: Some("team=data".to_string()),
            limit: Some(5),
        };
        let workflows = client_for(&server).list_workflows("argo", &options).await.unwrap();
        assert!(workflows.is_empty());
    }

    #[tokio::test]
    async fn resubmit_sends_memoized_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/workflows/argo/hello/resubmit"))
            .and(body_partial_json(json!({ "memoized": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": { "name": "hello-rerun", "namespace": "argo" },
                "status": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let workflow = client_for(&server).resubmit_workflow("argo", "hello", true).await.unwrap();
        assert_eq!(workflow.metadata.name, "hello-rerun");
    }

    #[tokio::test]
    async fn subscription_streams_events_until_close() {
        let server = MockServer::start().await;
        let body = concat!(
            r#"{"result":{"type":"ADDED","object":{"metadata":{"name":"hello"},"status":{"phase":"Running"}}}}"#,
            "\n",
            "garbage\n",
            r#"{"result":{"type":"MODIFIED","object":{"metadata":{"name":"hello"},"status":{"phase":"Succeeded"}}}}"#,
        );
        Mock::given(method("GET"))
            .and(path("/api/v1/workflow-events/argo"))
            .and(query_param("listOptions.fieldSelector", "metadata.name=hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let mut subscription = client_for(&server).subscribe("argo", "hello").await.unwrap();
        let first = subscription.next().await.unwrap().unwrap();
        assert_eq!(first.event_type, "ADDED");
        let second = subscription.next().await.unwrap().unwrap();
        assert_eq!(second.object.unwrap().status.phase, WorkflowPhase::Succeeded);
        assert_eq!(subscription.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscription_setup_failure_is_a_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workflow-events/argo"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "code": 7, "message": "forbidden" })))
            .mount(&server)
            .await;

        let error = client_for(&server).subscribe("argo", "hello").await.err().unwrap();
        assert!(matches!(error, BackendError::PermissionDenied { .. }));
    }
}
