//! Workflow lifecycle tools: submit, inspect, list, delete and control.

use argo_mcp_api::{ListOptions, SubmitOptions};
use argo_mcp_types::WorkflowPhase;
use chrono::Utc;
use rmcp::model::ErrorData;
use serde_json::Value;

use crate::server::core::ArgoToolServices;
use crate::server::errors::{backend_error, invalid_params_error};
use crate::server::schemas::{ListWorkflowsRequest, ResubmitWorkflowRequest, SubmitWorkflowRequest, WorkflowRefRequest};
use crate::server::tools::summary::WorkflowSummary;

/// Label the workflow controller keeps in sync with `status.phase`.
const PHASE_LABEL: &str = "workflows.argoproj.io/phase";

pub async fn submit_workflow(services: &ArgoToolServices, request: &SubmitWorkflowRequest) -> Result<Value, ErrorData> {
    let options = submit_options(request)?;
    let workflow = match (request.manifest.as_deref(), request.template.as_ref()) {
        (Some(manifest), None) => {
            let manifest = parse_manifest(manifest)?;
            let manifest_namespace = manifest
                .pointer("/metadata/namespace")
                .and_then(Value::as_str)
                .filter(|namespace| !namespace.trim().is_empty());
            let namespace = services.namespace(request.namespace.as_deref().or(manifest_namespace));
            services
                .backend()
                .submit_workflow(&namespace, manifest, &options)
                .await
                .map_err(|error| backend_error(&error, serde_json::json!({ "namespace": namespace })))?
        }
        (None, Some(template)) => {
            let template_name = required_name(&template.name, "template.name")?;
            let namespace = services.namespace(request.namespace.as_deref());
            services
                .backend()
                .submit_from_resource(&namespace, template.kind.as_str(), &template_name, &options)
                .await
                .map_err(|error| {
                    backend_error(
                        &error,
                        serde_json::json!({ "namespace": namespace, "kind": template.kind.as_str(), "template": template_name }),
                    )
                })?
        }
        _ => {
            return Err(invalid_params_error(
                "SUBMIT_SOURCE_AMBIGUOUS",
                "provide exactly one of manifest or template",
                serde_json::json!({
                    "has_manifest": request.manifest.is_some(),
                    "has_template": request.template.is_some(),
                }),
                "Pass either an inline Workflow manifest or a template reference.",
            ));
        }
    };

    Ok(serde_json::json!({
        "name": workflow.metadata.name,
        "namespace": workflow.metadata.namespace,
        "uid": workflow.metadata.uid,
        "phase": workflow.status.phase.as_str(),
        "dryRun": options.server_dry_run,
    }))
}

pub async fn get_workflow(services: &ArgoToolServices, request: &WorkflowRefRequest) -> Result<Value, ErrorData> {
    let (namespace, name) = resolve_ref(services, &request.name, request.namespace.as_deref())?;
    let workflow = services
        .backend()
        .get_workflow(&namespace, &name)
        .await
        .map_err(|error| backend_error(&error, ref_context(&namespace, &name)))?;
    to_value(&WorkflowSummary::from_workflow(&workflow, Utc::now()))
}

pub async fn list_workflows(services: &ArgoToolServices, request: &ListWorkflowsRequest) -> Result<Value, ErrorData> {
    let namespace = services.namespace(request.namespace.as_deref());
    if request.limit == Some(0) {
        return Err(invalid_params_error(
            "LIST_INVALID_LIMIT",
            "limit must be greater than zero",
            serde_json::json!({ "limit": 0 }),
            "Omit limit or pass a positive number.",
        ));
    }
    let options = ListOptions {
        label_selector: list_selector(request.label_selector.as_deref(), request.phases.as_deref())?,
        limit: request.limit,
    };
    let now = Utc::now();
    let workflows = services
        .backend()
        .list_workflows(&namespace, &options)
        .await
        .map_err(|error| backend_error(&error, serde_json::json!({ "namespace": namespace })))?;
    let summaries = workflows
        .iter()
        .map(|workflow| WorkflowSummary::from_workflow(workflow, now))
        .collect::<Vec<_>>();

    Ok(serde_json::json!({
        "namespace": namespace,
        "count": summaries.len(),
        "workflows": to_value(&summaries)?,
    }))
}

pub async fn delete_workflow(services: &ArgoToolServices, request: &WorkflowRefRequest) -> Result<Value, ErrorData> {
    let (namespace, name) = resolve_ref(services, &request.name, request.namespace.as_deref())?;
    services
        .backend()
        .delete_workflow(&namespace, &name)
        .await
        .map_err(|error| backend_error(&error, ref_context(&namespace, &name)))?;
    Ok(serde_json::json!({ "name": name, "namespace": namespace, "deleted": true }))
}

pub async fn resubmit_workflow(services: &ArgoToolServices, request: &ResubmitWorkflowRequest) -> Result<Value, ErrorData> {
    let (namespace, name) = resolve_ref(services, &request.name, request.namespace.as_deref())?;
    let memoized = request.memoized.unwrap_or(false);
    let workflow = services
        .backend()
        .resubmit_workflow(&namespace, &name, memoized)
        .await
        .map_err(|error| backend_error(&error, ref_context(&namespace, &name)))?;
    let mut value = to_value(&WorkflowSummary::from_workflow(&workflow, Utc::now()))?;
    value["resubmittedFrom"] = Value::String(name);
    value["memoized"] = Value::Bool(memoized);
    Ok(value)
}

pub async fn suspend_workflow(services: &ArgoToolServices, request: &WorkflowRefRequest) -> Result<Value, ErrorData> {
    let (namespace, name) = resolve_ref(services, &request.name, request.namespace.as_deref())?;
    let workflow = services
        .backend()
        .suspend_workflow(&namespace, &name)
        .await
        .map_err(|error| backend_error(&error, ref_context(&namespace, &name)))?;
    to_value(&WorkflowSummary::from_workflow(&workflow, Utc::now()))
}

pub async fn resume_workflow(services: &ArgoToolServices, request: &WorkflowRefRequest) -> Result<Value, ErrorData> {
    let (namespace, name) = resolve_ref(services, &request.name, request.namespace.as_deref())?;
    let workflow = services
        .backend()
        .resume_workflow(&namespace, &name)
        .await
        .map_err(|error| backend_error(&error, ref_context(&namespace, &name)))?;
    to_value(&WorkflowSummary::from_workflow(&workflow, Utc::now()))
}

fn resolve_ref(services: &ArgoToolServices, name: &str, namespace: Option<&str>) -> Result<(String, String), ErrorData> {
    let name = required_name(name, "name")?;
    Ok((services.namespace(namespace), name))
}

fn required_name(name: &str, field: &str) -> Result<String, ErrorData> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid_params_error(
            "WORKFLOW_NAME_REQUIRED",
            format!("{field} is required"),
            serde_json::json!({ "field": field }),
            "Provide the workflow name, for example from list_workflows.",
        ));
    }
    Ok(name.to_string())
}

fn ref_context(namespace: &str, name: &str) -> Value {
    serde_json::json!({ "namespace": namespace, "name": name })
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(value).map_err(|error| ErrorData::internal_error(error.to_string(), None))
}

/// Parse an inline manifest given as JSON or YAML text.
fn parse_manifest(raw: &str) -> Result<Value, ErrorData> {
    let trimmed = raw.trim();
    let parsed = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Ok(value),
        Err(_) => serde_yaml::from_str::<Value>(trimmed).map_err(|error| error.to_string()),
    };
    let manifest = parsed.map_err(|error| {
        invalid_params_error(
            "SUBMIT_MANIFEST_PARSE_FAILED",
            format!("manifest is neither valid JSON nor YAML: {error}"),
            Value::Null,
            "Pass a single Workflow document as JSON or YAML text.",
        )
    })?;
    if !manifest.is_object() {
        return Err(invalid_params_error(
            "SUBMIT_MANIFEST_NOT_OBJECT",
            "manifest must be a single Workflow object",
            Value::Null,
            "Pass a single Workflow document as JSON or YAML text.",
        ));
    }
    if let Some(kind) = manifest.get("kind").and_then(Value::as_str)
        && kind != "Workflow"
    {
        return Err(invalid_params_error(
            "SUBMIT_MANIFEST_WRONG_KIND",
            format!("manifest kind must be Workflow, got {kind}"),
            serde_json::json!({ "kind": kind }),
            "Submit templates by reference with the template field instead.",
        ));
    }
    Ok(manifest)
}

fn submit_options(request: &SubmitWorkflowRequest) -> Result<SubmitOptions, ErrorData> {
    let parameters = request.parameters.clone().unwrap_or_default();
    if let Some(invalid) = parameters.iter().find(|parameter| !parameter.contains('=')) {
        return Err(invalid_params_error(
            "SUBMIT_INVALID_PARAMETER",
            format!("parameter '{invalid}' must have the form name=value"),
            serde_json::json!({ "parameter": invalid }),
            "Pass parameters as 'name=value' strings.",
        ));
    }
    Ok(SubmitOptions {
        parameters,
        generate_name: request.generate_name.clone().filter(|name| !name.trim().is_empty()),
        labels: request.labels.clone().filter(|labels| !labels.trim().is_empty()),
        server_dry_run: request.dry_run.unwrap_or(false),
    })
}

/// Fold the phase filter into the label selector the server evaluates.
fn list_selector(label_selector: Option<&str>, phases: Option<&[String]>) -> Result<Option<String>, ErrorData> {
    let mut clauses = Vec::new();
    if let Some(selector) = label_selector.map(str::trim).filter(|selector| !selector.is_empty()) {
        clauses.push(selector.to_string());
    }

    let phases = phases.unwrap_or_default();
    if !phases.is_empty() {
        let mut labels = Vec::with_capacity(phases.len());
        for phase in phases {
            let parsed = WorkflowPhase::from_label(phase);
            if parsed.as_str() != phase.trim() {
                return Err(invalid_params_error(
                    "LIST_INVALID_PHASE",
                    format!("unknown workflow phase '{phase}'"),
                    serde_json::json!({ "phase": phase }),
                    "Use Pending, Running, Succeeded, Failed or Error.",
                ));
            }
            if !labels.contains(&parsed.as_str()) {
                labels.push(parsed.as_str());
            }
        }
        clauses.push(format!("{PHASE_LABEL} in ({})", labels.join(",")));
    }

    Ok(if clauses.is_empty() { None } else { Some(clauses.join(",")) })
}
