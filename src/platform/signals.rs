use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::state_machine::WorkerState;

/// Opaque identity of one worker instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identity
    pub fn generate() -> Self {
        Self(format!("sw-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signals the platform delivers for a registration scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PlatformSignal {
    /// Registration finished for the scope
    RegistrationComplete { scope: String },
    /// A new worker instance started installing
    CandidateDiscovered { worker: WorkerId },
    /// A worker reported a new state
    StateChanged { worker: WorkerId, state: WorkerState },
    /// The controlling worker of the current client was swapped
    ControllerChanged { controller: Option<WorkerId> },
}

impl PlatformSignal {
    /// Get a string representation of the signal type for logging
    pub fn signal_type(&self) -> &'static str {
        match self {
            Self::RegistrationComplete { .. } => "registration_complete",
            Self::CandidateDiscovered { .. } => "candidate_discovered",
            Self::StateChanged { .. } => "state_changed",
            Self::ControllerChanged { .. } => "controller_changed",
        }
    }

    /// The worker this signal is about, if any
    pub fn worker(&self) -> Option<&WorkerId> {
        match self {
            Self::CandidateDiscovered { worker } | Self::StateChanged { worker, .. } => Some(worker),
            Self::ControllerChanged { controller } => controller.as_ref(),
            Self::RegistrationComplete { .. } => None,
        }
    }
}

/// Control instructions the manager can post to a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlMessage {
    /// Activate immediately instead of waiting for controlled clients to close
    SkipWaiting,
}

impl ControlMessage {
    /// Wire form understood by worker scripts
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipWaiting => "skipWaiting",
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
