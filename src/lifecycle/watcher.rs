//! # Update Watcher
//!
//! Discovers candidates on one registration and tells first installs apart
//! from updates.
//!
//! The watcher is plain bookkeeping: it consumes [`PlatformSignal`]s one at a
//! time and returns what happened as [`WatcherOutput`]s, in the order the
//! owner must act on them. It never invokes hooks or talks to the platform.
//!
//! Everything that must happen at most once (update notices, controller
//! detection) is keyed by [`WorkerId`], so duplicated or oddly ordered
//! platform signals cannot produce a second notice.

use std::collections::{HashMap, HashSet};

use crate::platform::{PlatformSignal, WorkerId};
use crate::registration::RegistrationHandle;
use crate::state_machine::{
    LifecycleError, LifecycleEvent, UpdateNotice, WorkerState, WorkerStateMachine,
};

/// What the owner has to act on after a signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherOutput {
    /// A validated transition; dispatch the matching hook
    Lifecycle(LifecycleEvent),
    /// A genuine update is installed and waiting
    Update(UpdateNotice),
    /// A pending candidate was dropped in favour of a newer one
    Superseded { abandoned: WorkerId, by: WorkerId },
    /// The platform reported an impossible transition; the candidate is retired
    Violation(LifecycleError),
}

#[derive(Debug)]
pub struct UpdateWatcher {
    scope: String,
    controller: Option<WorkerId>,
    controller_present: bool,
    candidates: HashMap<WorkerId, WorkerStateMachine>,
    pending: Option<WorkerId>,
    abandoned: HashSet<WorkerId>,
    retired: HashSet<WorkerId>,
    notified: HashSet<WorkerId>,
}

impl UpdateWatcher {
    /// Attach to a registration. `controller` is the worker controlling the
    /// current client at attach time, if any.
    pub fn attach(handle: &RegistrationHandle, controller: Option<WorkerId>) -> Self {
        crate::log_lifecycle!(debug, "WATCHER_ATTACHED",
            scope: handle.scope(),
            controller: controller
        );
        Self {
            scope: handle.scope().to_string(),
            controller_present: controller.is_some(),
            controller,
            candidates: HashMap::new(),
            pending: None,
            abandoned: HashSet::new(),
            retired: HashSet::new(),
            notified: HashSet::new(),
        }
    }

    /// Consume one platform signal
    pub fn observe(&mut self, signal: &PlatformSignal) -> Vec<WatcherOutput> {
        match signal {
            PlatformSignal::RegistrationComplete { scope } => {
                crate::log_lifecycle!(debug, "REGISTRATION_COMPLETE", scope: scope);
                Vec::new()
            }
            PlatformSignal::CandidateDiscovered { worker } => self.discover(worker),
            PlatformSignal::StateChanged { worker, state } => self.state_changed(worker, *state),
            PlatformSignal::ControllerChanged { controller } => {
                self.controller_changed(controller.clone());
                Vec::new()
            }
        }
    }

    fn discover(&mut self, worker: &WorkerId) -> Vec<WatcherOutput> {
        if self.candidates.contains_key(worker) || self.abandoned.contains(worker) {
            crate::log_lifecycle!(debug, "DUPLICATE_DISCOVERY", worker: worker, scope: self.scope);
            return Vec::new();
        }

        let mut outputs = Vec::new();

        if let Some(previous) = self.pending.take() {
            if self.candidates.remove(&previous).is_some() {
                crate::log_lifecycle!(info, "CANDIDATE_SUPERSEDED", worker: previous, by: worker);
                self.abandoned.insert(previous.clone());
                outputs.push(WatcherOutput::Superseded {
                    abandoned: previous,
                    by: worker.clone(),
                });
            }
        }

        let had_controller = self.has_controller();
        let (machine, event) = WorkerStateMachine::discover(worker.clone(), had_controller);
        crate::log_lifecycle!(info, "CANDIDATE_DISCOVERED",
            worker: worker,
            update: had_controller,
            scope: self.scope
        );

        self.candidates.insert(worker.clone(), machine);
        self.pending = Some(worker.clone());
        outputs.push(WatcherOutput::Lifecycle(event));
        outputs
    }

    fn state_changed(&mut self, worker: &WorkerId, state: WorkerState) -> Vec<WatcherOutput> {
        if self.abandoned.contains(worker) {
            crate::log_lifecycle!(debug, "ABANDONED_CANDIDATE_SIGNAL", worker: worker, state: state);
            return Vec::new();
        }

        let Some(machine) = self.candidates.get_mut(worker) else {
            crate::log_lifecycle!(debug, "UNKNOWN_CANDIDATE_SIGNAL", worker: worker, state: state);
            return Vec::new();
        };

        let mut outputs = Vec::new();

        match machine.transition(state) {
            Ok(event) => {
                outputs.push(WatcherOutput::Lifecycle(event));

                if machine.is_waiting_for_activation() && self.notified.insert(worker.clone()) {
                    crate::log_lifecycle!(info, "UPDATE_AVAILABLE", worker: worker, scope: self.scope);
                    outputs.push(WatcherOutput::Update(UpdateNotice::new(worker.clone())));
                }

                if state == WorkerState::Activated {
                    self.controller_present = true;
                    if self.pending.as_ref() == Some(worker) {
                        self.pending = None;
                    }
                }
            }
            Err(err) => {
                crate::log_lifecycle!(error, "PROTOCOL_VIOLATION",
                    worker: worker,
                    error: err.to_string()
                );
                outputs.push(WatcherOutput::Violation(err));
                if let Some(event) = machine.retire() {
                    outputs.push(WatcherOutput::Lifecycle(event));
                }
            }
        }

        if self
            .candidates
            .get(worker)
            .is_some_and(WorkerStateMachine::is_terminal)
        {
            self.candidates.remove(worker);
            self.retired.insert(worker.clone());
            if self.pending.as_ref() == Some(worker) {
                self.pending = None;
            }
        }

        outputs
    }

    fn controller_changed(&mut self, controller: Option<WorkerId>) {
        crate::log_lifecycle!(info, "CONTROLLER_CHANGED",
            previous: self.controller,
            current: controller
        );
        if controller.is_some() {
            self.controller_present = true;
        }
        self.controller = controller;
    }

    /// Whether a controller exists; decides update versus first install
    pub fn has_controller(&self) -> bool {
        self.controller_present
    }

    /// Controller as last reported by the platform, at attach time or via a
    /// controller-change signal. Activation alone sets `has_controller` but
    /// leaves this untouched until the platform reports the new controller.
    pub fn controller(&self) -> Option<&WorkerId> {
        self.controller.as_ref()
    }

    pub fn candidate(&self, worker: &WorkerId) -> Option<&WorkerStateMachine> {
        self.candidates.get(worker)
    }

    /// The candidate currently between discovery and activation
    pub fn pending(&self) -> Option<&WorkerStateMachine> {
        self.pending.as_ref().and_then(|id| self.candidates.get(id))
    }

    pub fn was_abandoned(&self, worker: &WorkerId) -> bool {
        self.abandoned.contains(worker)
    }

    /// Whether the candidate reached `Redundant` and was dropped
    pub fn was_retired(&self, worker: &WorkerId) -> bool {
        self.retired.contains(worker)
    }

    pub fn was_notified(&self, worker: &WorkerId) -> bool {
        self.notified.contains(worker)
    }

    pub fn tracked_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}
