//! In-memory fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use argo_mcp_api::{BackendError, EventSubscription, ListOptions, ReceiveError, SubmitOptions, WorkflowBackend, WorkflowEvents};
use argo_mcp_types::{ObjectMeta, RawEvent, Workflow, WorkflowPhase, WorkflowStatus};
use async_trait::async_trait;
use serde_json::Value;

/// One scripted step of a fake event stream.
pub(crate) enum Step {
    Event(RawEvent),
    /// Deliver the event after sleeping on the tokio clock.
    Delayed(Duration, RawEvent),
    Timeout,
    Transport(String),
    /// Block until the receive is abandoned.
    Stall,
}

pub(crate) fn workflow(name: &str, namespace: &str, phase: &str) -> Workflow {
    Workflow {
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        },
        spec: None,
        status: WorkflowStatus {
            phase: WorkflowPhase::from_label(phase),
            ..Default::default()
        },
    }
}

pub(crate) fn workflow_event(event_type: &str, phase: &str) -> RawEvent {
    RawEvent::new(event_type, Some(workflow("hello", "argo", phase)))
}

struct ScriptedSubscription {
    steps: Arc<Mutex<VecDeque<Step>>>,
}

#[async_trait]
impl EventSubscription for ScriptedSubscription {
    async fn next(&mut self) -> Result<Option<RawEvent>, ReceiveError> {
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            None => Ok(None),
            Some(Step::Event(event)) => Ok(Some(event)),
            Some(Step::Delayed(delay, event)) => {
                tokio::time::sleep(delay).await;
                Ok(Some(event))
            }
            Some(Step::Timeout) => Err(ReceiveError::Timeout),
            Some(Step::Transport(cause)) => Err(ReceiveError::Transport(cause)),
            Some(Step::Stall) => std::future::pending().await,
        }
    }
}

/// Event source that replays one script and records every subscribe call.
pub(crate) struct ScriptedEvents {
    steps: Arc<Mutex<VecDeque<Step>>>,
    failure: Mutex<Option<BackendError>>,
    subscriptions: Mutex<Vec<(String, String)>>,
}

impl ScriptedEvents {
    pub(crate) fn new(script: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(script.into())),
            failure: Mutex::new(None),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(error: BackendError) -> Self {
        let events = Self::new(Vec::new());
        *events.failure.lock().unwrap() = Some(error);
        events
    }

    /// `(namespace, name)` of every subscribe call.
    pub(crate) fn subscriptions(&self) -> Vec<(String, String)> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub(crate) fn remaining_steps(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

#[async_trait]
impl WorkflowEvents for ScriptedEvents {
    async fn subscribe(&self, namespace: &str, name: &str) -> Result<Box<dyn EventSubscription>, BackendError> {
        self.subscriptions
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(Box::new(ScriptedSubscription {
            steps: Arc::clone(&self.steps),
        }))
    }
}

/// In-memory backend holding a fixed set of workflows.
pub(crate) struct FakeBackend {
    pub(crate) events: ScriptedEvents,
    workflows: Mutex<Vec<Workflow>>,
    calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<Value>>,
}

impl FakeBackend {
    pub(crate) fn new(workflows: Vec<Workflow>, script: Vec<Step>) -> Self {
        Self {
            events: ScriptedEvents::new(script),
            workflows: Mutex::new(workflows),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn submitted(&self) -> Vec<Value> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn find(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError> {
        self.workflows
            .lock()
            .unwrap()
            .iter()
            .find(|workflow| workflow.metadata.namespace == namespace && workflow.metadata.name == name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    fn with_phase(&self, namespace: &str, name: &str, phase: WorkflowPhase) -> Result<Workflow, BackendError> {
        let mut workflow = self.find(namespace, name)?;
        workflow.status.phase = phase;
        Ok(workflow)
    }
}

#[async_trait]
impl WorkflowEvents for FakeBackend {
    async fn subscribe(&self, namespace: &str, name: &str) -> Result<Box<dyn EventSubscription>, BackendError> {
        self.events.subscribe(namespace, name).await
    }
}

#[async_trait]
impl WorkflowBackend for FakeBackend {
    async fn submit_workflow(&self, namespace: &str, manifest: Value, options: &SubmitOptions) -> Result<Workflow, BackendError> {
        self.record(format!("submit {namespace} dry_run={}", options.server_dry_run));
        let prefix = options
            .generate_name
            .clone()
            .or_else(|| manifest.pointer("/metadata/generateName").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();
        self.submitted.lock().unwrap().push(manifest);
        Ok(workflow(&format!("{prefix}x7k2p"), namespace, "Pending"))
    }

    async fn submit_from_resource(
        &self,
        namespace: &str,
        resource_kind: &str,
        resource_name: &str,
        options: &SubmitOptions,
    ) -> Result<Workflow, BackendError> {
        self.record(format!(
            "submit_from {namespace} {resource_kind}/{resource_name} params={}",
            options.parameters.join(",")
        ));
        Ok(workflow(&format!("{resource_name}-x7k2p"), namespace, "Pending"))
    }

    async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError> {
        self.record(format!("get {namespace}/{name}"));
        self.find(namespace, name)
    }

    async fn list_workflows(&self, namespace: &str, options: &ListOptions) -> Result<Vec<Workflow>, BackendError> {
        self.record(format!(
            "list {namespace} selector={} limit={:?}",
            options.label_selector.as_deref().unwrap_or_default(),
            options.limit
        ));
        Ok(self
            .workflows
            .lock()
            .unwrap()
            .iter()
            .filter(|workflow| workflow.metadata.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn delete_workflow(&self, namespace: &str, name: &str) -> Result<(), BackendError> {
        self.record(format!("delete {namespace}/{name}"));
        self.find(namespace, name)?;
        self.workflows
            .lock()
            .unwrap()
            .retain(|workflow| !(workflow.metadata.namespace == namespace && workflow.metadata.name == name));
        Ok(())
    }

    async fn resubmit_workflow(&self, namespace: &str, name: &str, memoized: bool) -> Result<Workflow, BackendError> {
        self.record(format!("resubmit {namespace}/{name} memoized={memoized}"));
        self.find(namespace, name)?;
        Ok(workflow(&format!("{name}-r9q4z"), namespace, "Pending"))
    }

    async fn suspend_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError> {
        self.record(format!("suspend {namespace}/{name}"));
        self.with_phase(namespace, name, WorkflowPhase::Running)
    }

    async fn resume_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, BackendError> {
        self.record(format!("resume {namespace}/{name}"));
        self.with_phase(namespace, name, WorkflowPhase::Running)
    }
}
