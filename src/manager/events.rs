use serde::Serialize;
use tokio::sync::broadcast;

use crate::constants::events;
use crate::lifecycle::{ControllerChangeOutcome, HandoverError};
use crate::platform::WorkerId;
use crate::state_machine::{HookError, LifecycleError, LifecycleEvent, UpdateNotice, WorkerState};

/// Everything the manager reports to observers, in processing order
#[derive(Debug, Clone)]
pub enum ManagerEvent {
    Lifecycle(LifecycleEvent),
    UpdateAvailable(UpdateNotice),
    CandidateSuperseded {
        abandoned: WorkerId,
        by: WorkerId,
    },
    ProtocolViolation(LifecycleError),
    HookFailed(HookError),
    HandoverRequested {
        candidate: WorkerId,
    },
    HandoverFailed(HandoverError),
    ControllerChanged {
        controller: Option<WorkerId>,
        outcome: ControllerChangeOutcome,
    },
    Stopped,
}

impl ManagerEvent {
    /// Event name for logging and routing
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lifecycle(event) => match event.to_state {
                WorkerState::Installing => events::WORKER_INSTALLING,
                WorkerState::Installed => events::WORKER_INSTALLED,
                WorkerState::Activating => events::WORKER_ACTIVATING,
                WorkerState::Activated => events::WORKER_ACTIVATED,
                WorkerState::Redundant => events::WORKER_REDUNDANT,
            },
            Self::UpdateAvailable(_) => events::UPDATE_AVAILABLE,
            Self::CandidateSuperseded { .. } => events::WORKER_SUPERSEDED,
            Self::ProtocolViolation(_) => events::WORKER_PROTOCOL_VIOLATION,
            Self::HookFailed(_) => events::HOOK_FAILED,
            Self::HandoverRequested { .. } => events::HANDOVER_REQUESTED,
            Self::HandoverFailed(_) => events::HANDOVER_FAILED,
            Self::ControllerChanged { .. } => events::CONTROLLER_CHANGED,
            Self::Stopped => events::MANAGER_STOPPED,
        }
    }

    /// JSON context for the event, for structured logs
    pub fn context(&self) -> serde_json::Value {
        #[derive(Serialize)]
        struct Context<'a> {
            event: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            worker: Option<&'a WorkerId>,
            #[serde(skip_serializing_if = "Option::is_none")]
            detail: Option<String>,
        }

        let (worker, detail) = match self {
            Self::Lifecycle(event) => (Some(&event.candidate), Some(event.to_state.to_string())),
            Self::UpdateAvailable(notice) => (Some(&notice.candidate), None),
            Self::CandidateSuperseded { abandoned, by } => (Some(abandoned), Some(by.to_string())),
            Self::ProtocolViolation(err) => (Some(err.worker()), Some(err.to_string())),
            Self::HookFailed(err) => (None, Some(err.to_string())),
            Self::HandoverRequested { candidate } => (Some(candidate), None),
            Self::HandoverFailed(err) => (None, Some(err.to_string())),
            Self::ControllerChanged {
                controller,
                outcome,
            } => (controller.as_ref(), Some(format!("{outcome:?}"))),
            Self::Stopped => (None, None),
        };

        serde_json::to_value(Context {
            event: self.name(),
            worker,
            detail,
        })
        .unwrap_or(serde_json::Value::Null)
    }
}

/// Fan-out of manager events to any number of observers
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<ManagerEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Having no observers is not an error.
    pub fn publish(&self, event: ManagerEvent) {
        tracing::trace!(context = %event.context(), "Publishing manager event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
