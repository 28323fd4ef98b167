use chrono::{DateTime, Utc};

use super::{
    errors::{LifecycleError, LifecycleResult},
    events::LifecycleEvent,
    states::WorkerState,
};
use crate::platform::WorkerId;

/// State machine for one worker candidate.
///
/// The machine never reorders or batches: each call to [`transition`] is
/// validated against the current state and either yields exactly one
/// [`LifecycleEvent`] or a [`LifecycleError`] with the state left untouched.
///
/// [`transition`]: WorkerStateMachine::transition
#[derive(Debug, Clone)]
pub struct WorkerStateMachine {
    worker: WorkerId,
    state: WorkerState,
    had_controller: bool,
    discovered_at: DateTime<Utc>,
    history: Vec<WorkerState>,
}

impl WorkerStateMachine {
    /// Start tracking a newly discovered candidate.
    ///
    /// `had_controller` records whether a controller already existed when the
    /// candidate appeared; it is what separates an update from a first install.
    pub fn discover(worker: WorkerId, had_controller: bool) -> (Self, LifecycleEvent) {
        let initial = WorkerState::default();
        let event = LifecycleEvent::new(worker.clone(), None, initial);
        let machine = Self {
            worker,
            state: initial,
            had_controller,
            discovered_at: event.timestamp,
            history: vec![initial],
        };
        (machine, event)
    }

    /// Get the current state of the candidate
    pub fn current_state(&self) -> WorkerState {
        self.state
    }

    /// Attempt to move the candidate to the observed state
    pub fn transition(&mut self, to: WorkerState) -> LifecycleResult<LifecycleEvent> {
        let from = self.determine_transition(to)?;
        self.state = to;
        self.history.push(to);
        Ok(LifecycleEvent::new(self.worker.clone(), Some(from), to))
    }

    fn determine_transition(&self, to: WorkerState) -> LifecycleResult<WorkerState> {
        let from = self.state;
        if from.is_terminal() {
            return Err(LifecycleError::AlreadyTerminal {
                worker: self.worker.clone(),
                state: from,
            });
        }
        if !from.can_transition_to(to) {
            return Err(LifecycleError::InvalidTransition {
                worker: self.worker.clone(),
                from,
                to,
            });
        }
        Ok(from)
    }

    /// Force the candidate into `Redundant` after a protocol violation.
    ///
    /// Returns `None` when it is already terminal.
    pub fn retire(&mut self) -> Option<LifecycleEvent> {
        self.transition(WorkerState::Redundant).ok()
    }

    /// True once installed while a controller was already in place
    pub fn is_waiting_for_activation(&self) -> bool {
        self.state == WorkerState::Installed && self.had_controller
    }

    /// Whether this candidate is an update rather than a first install
    pub fn is_update(&self) -> bool {
        self.had_controller
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    pub fn worker(&self) -> &WorkerId {
        &self.worker
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    /// States observed so far, in order
    pub fn history(&self) -> &[WorkerState] {
        &self.history
    }
}
