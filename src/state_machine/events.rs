use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::states::WorkerState;
use crate::platform::WorkerId;

/// Record of one validated candidate transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub candidate: WorkerId,
    /// `None` for the discovery transition into `Installing`
    pub from_state: Option<WorkerState>,
    pub to_state: WorkerState,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(candidate: WorkerId, from_state: Option<WorkerState>, to_state: WorkerState) -> Self {
        Self {
            candidate,
            from_state,
            to_state,
            timestamp: Utc::now(),
        }
    }

    /// Name of the hook this event dispatches to
    pub fn hook_name(&self) -> &'static str {
        match self.to_state {
            WorkerState::Installing => "on_installing",
            WorkerState::Installed => "on_installed",
            WorkerState::Activating => "on_activating",
            WorkerState::Activated => "on_activated",
            WorkerState::Redundant => "on_redundant",
        }
    }

    /// Check if this event represents discovery of the candidate
    pub fn is_discovery(&self) -> bool {
        self.from_state.is_none()
    }
}

/// A candidate reached `Installed` while a controller was already in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNotice {
    pub candidate: WorkerId,
    pub discovered_at: DateTime<Utc>,
}

impl UpdateNotice {
    pub fn new(candidate: WorkerId) -> Self {
        Self {
            candidate,
            discovered_at: Utc::now(),
        }
    }
}
