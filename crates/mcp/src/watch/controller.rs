//! The receive loop behind the wait and watch tools.
//!
//! One subscription per call, one event in flight. The loop stops on a
//! terminal phase, a clean stream close, the scope expiring (deadline or
//! caller cancellation), or a transport failure.

use argo_mcp_api::{ReceiveError, WorkflowEvents};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::watch::error::WatchError;
use crate::watch::interpret::{InterpretedState, format_timestamp, interpret};
use crate::watch::scope::WatchScope;
use crate::watch::synthesize::{EventSummary, OutputRecord, synthesize};
use crate::watch::target::WatchTarget;

/// Why the receive loop stopped. Produced exactly once per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    TerminalPhaseReached,
    StreamEndedNaturally,
    /// The deadline passed, the caller cancelled, or the stream reported a deadline.
    TimedOut,
    FatalError(String),
}

/// Per-call behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Keep a summary of every accepted event (continuous watch).
    pub retain_event_log: bool,
}

impl ObserveOptions {
    pub fn wait() -> Self {
        Self { retain_event_log: false }
    }

    pub fn watch() -> Self {
        Self { retain_event_log: true }
    }
}

struct LoopOutcome {
    state: Option<InterpretedState>,
    events: Vec<EventSummary>,
    stop_reason: StopReason,
}

/// Observe one workflow until it settles, the scope expires, or the stream ends.
///
/// `cancellation` is the caller's token; the optional timeout on `target`
/// becomes a deadline on a scope derived from it. Subscription failures and
/// mid-stream transport failures are errors; timeouts and stream ends always
/// yield a record.
pub async fn observe<E>(
    events: &E,
    target: &WatchTarget,
    options: ObserveOptions,
    cancellation: &CancellationToken,
) -> Result<OutputRecord, WatchError>
where
    E: WorkflowEvents + ?Sized,
{
    let scope = WatchScope::new(cancellation, target.timeout());
    let outcome = receive(events, target, options, &scope).await?;
    drop(scope);

    info!(
        workflow = target.name(),
        namespace = target.namespace(),
        stop_reason = ?outcome.stop_reason,
        events = outcome.events.len(),
        "workflow watch finished"
    );

    match outcome.stop_reason {
        StopReason::FatalError(cause) => Err(WatchError::Stream(cause)),
        stop_reason => {
            let events = options.retain_event_log.then_some(outcome.events);
            Ok(synthesize(target, outcome.state.as_ref(), &stop_reason, events))
        }
    }
}

async fn receive<E>(events: &E, target: &WatchTarget, options: ObserveOptions, scope: &WatchScope) -> Result<LoopOutcome, WatchError>
where
    E: WorkflowEvents + ?Sized,
{
    debug!(workflow = target.name(), namespace = target.namespace(), timeout = ?target.timeout(), "subscribing to workflow events");
    let subscribed = tokio::select! {
        biased;
        _ = scope.expired() => None,
        subscribed = events.subscribe(target.namespace(), target.name()) => Some(subscribed),
    };
    let Some(subscribed) = subscribed else {
        return Ok(LoopOutcome {
            state: None,
            events: Vec::new(),
            stop_reason: StopReason::TimedOut,
        });
    };
    let mut subscription = subscribed?;

    let mut state: Option<InterpretedState> = None;
    let mut summaries = Vec::new();
    let stop_reason = loop {
        let received = tokio::select! {
            biased;
            _ = scope.expired() => None,
            received = subscription.next() => Some(received),
        };
        let Some(received) = received else {
            break StopReason::TimedOut;
        };

        let event = match received {
            Ok(Some(event)) => event,
            Ok(None) => break StopReason::StreamEndedNaturally,
            Err(ReceiveError::Timeout) => break StopReason::TimedOut,
            Err(ReceiveError::Transport(cause)) => {
                warn!(workflow = target.name(), %cause, "workflow event stream failed");
                break StopReason::FatalError(cause);
            }
        };

        let Some(workflow) = event.object.as_ref() else {
            debug!(workflow = target.name(), event_type = %event.event_type, "skipping event without workflow snapshot");
            continue;
        };

        let received_at = Utc::now();
        let interpreted = interpret(workflow, received_at);
        debug!(
            workflow = target.name(),
            event_type = %event.event_type,
            phase = %interpreted.phase,
            "accepted workflow event"
        );
        if options.retain_event_log {
            summaries.push(EventSummary {
                event_type: event.event_type.clone(),
                phase: interpreted.phase.to_string(),
                timestamp: format_timestamp(received_at),
                progress: interpreted.progress.clone(),
            });
        }

        let terminal = interpreted.is_terminal();
        state = Some(interpreted);
        if terminal {
            break StopReason::TerminalPhaseReached;
        }
    };

    Ok(LoopOutcome {
        state,
        events: summaries,
        stop_reason,
    })
}
