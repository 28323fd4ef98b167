use thiserror::Error;

use super::states::WorkerState;
use crate::platform::WorkerId;

/// Protocol violations observed while tracking a candidate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid state transition for worker {worker} from {from} to {to}")]
    InvalidTransition {
        worker: WorkerId,
        from: WorkerState,
        to: WorkerState,
    },

    #[error("Worker {worker} is already terminal ({state})")]
    AlreadyTerminal { worker: WorkerId, state: WorkerState },
}

impl LifecycleError {
    pub fn worker(&self) -> &WorkerId {
        match self {
            Self::InvalidTransition { worker, .. } | Self::AlreadyTerminal { worker, .. } => worker,
        }
    }
}

/// Failure raised by an owner-supplied hook
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("Hook {hook} failed: {reason}")]
    Failed { hook: &'static str, reason: String },

    #[error("Hook {hook} panicked: {message}")]
    Panicked { hook: &'static str, message: String },
}

impl HookError {
    pub fn hook(&self) -> &'static str {
        match self {
            Self::Failed { hook, .. } | Self::Panicked { hook, .. } => hook,
        }
    }
}

/// Result type alias for state machine operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type HookResult = Result<(), HookError>;

/// Helper for hooks that want to report a failure
pub fn hook_failed(hook: &'static str, reason: impl Into<String>) -> HookError {
    HookError::Failed {
        hook,
        reason: reason.into(),
    }
}
