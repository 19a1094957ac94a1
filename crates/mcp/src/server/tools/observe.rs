//! Wait and watch tools backed by the streaming observer.

use rmcp::model::ErrorData;
use tokio_util::sync::CancellationToken;

use crate::server::core::ArgoToolServices;
use crate::server::errors::watch_error;
use crate::server::schemas::WatchWorkflowRequest;
use crate::watch::{ObserveOptions, OutputRecord, WatchTarget, observe};

/// Observe one workflow on behalf of a tool call.
///
/// `cancellation` is the MCP request's token, so a client-side cancel ends
/// the stream like a deadline does.
pub async fn observe_workflow(
    services: &ArgoToolServices,
    request: &WatchWorkflowRequest,
    options: ObserveOptions,
    cancellation: &CancellationToken,
) -> Result<OutputRecord, ErrorData> {
    let namespace = services.namespace(request.namespace.as_deref());
    let context = serde_json::json!({
        "name": request.name.trim(),
        "namespace": namespace,
        "timeout": request.timeout,
    });
    let target = WatchTarget::parse(&request.name, &namespace, request.timeout.as_deref())
        .map_err(|error| watch_error(&error, context.clone()))?;
    observe(services.backend(), &target, options, cancellation)
        .await
        .map_err(|error| watch_error(&error, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, ScriptedEvents, Step, workflow_event};
    use argo_mcp_api::BackendError;
    use rmcp::model::ErrorCode;
    use std::sync::Arc;

    fn request(timeout: Option<&str>) -> WatchWorkflowRequest {
        WatchWorkflowRequest {
            name: "hello".to_string(),
            namespace: None,
            timeout: timeout.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn invalid_timeout_never_subscribes() {
        let backend = Arc::new(FakeBackend::new(Vec::new(), vec![Step::Event(workflow_event("ADDED", "Running"))]));
        let services = ArgoToolServices::new(backend.clone(), "argo");
        for timeout in ["0s", "-5m", "soon"] {
            let error = observe_workflow(&services, &request(Some(timeout)), ObserveOptions::wait(), &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(error.code, ErrorCode::INVALID_PARAMS, "{timeout}");
        }
        assert!(backend.events.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn wait_uses_default_namespace() {
        let backend = Arc::new(FakeBackend::new(
            Vec::new(),
            vec![
                Step::Event(workflow_event("ADDED", "Running")),
                Step::Event(workflow_event("MODIFIED", "Succeeded")),
            ],
        ));
        let services = ArgoToolServices::new(backend.clone(), "argo");
        let record = observe_workflow(&services, &request(Some("10m")), ObserveOptions::wait(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(record.phase, "Succeeded");
        assert_eq!(record.namespace, "argo");
        assert!(record.events.is_none());
        assert_eq!(backend.events.subscriptions(), vec![("argo".to_string(), "hello".to_string())]);
    }

    #[tokio::test]
    async fn watch_retains_events() {
        let backend = Arc::new(FakeBackend::new(
            Vec::new(),
            vec![
                Step::Event(workflow_event("ADDED", "Pending")),
                Step::Event(workflow_event("MODIFIED", "Error")),
            ],
        ));
        let services = ArgoToolServices::new(backend, "argo");
        let record = observe_workflow(&services, &request(None), ObserveOptions::watch(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(record.phase, "Error");
        assert_eq!(record.events.map(|events| events.len()), Some(2));
    }

    #[tokio::test]
    async fn forbidden_subscription_is_an_execution_error() {
        let events = ScriptedEvents::failing(BackendError::PermissionDenied {
            message: "forbidden".to_string(),
        });
        let target = WatchTarget::new("hello", "argo", None).unwrap();
        let error = observe(&events, &target, ObserveOptions::wait(), &CancellationToken::new())
            .await
            .map_err(|error| watch_error(&error, serde_json::Value::Null))
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(error.data.unwrap()["error_code"], "ARGO_PERMISSION_DENIED");
    }
}
