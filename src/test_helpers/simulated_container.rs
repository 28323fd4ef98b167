use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::platform::{
    ControlMessage, PlatformError, PlatformRegistration, PlatformSignal, ServiceWorkerContainer,
    WorkerId,
};
use crate::state_machine::WorkerState;

#[derive(Debug, Default)]
struct SimulatedState {
    supported: bool,
    auto_activate: bool,
    controller: Option<WorkerId>,
    subscribers: HashMap<Uuid, (String, mpsc::UnboundedSender<PlatformSignal>)>,
    registrations: HashMap<String, PlatformRegistration>,
    worker_scopes: HashMap<WorkerId, String>,
    gone: HashSet<WorkerId>,
    posted: Vec<(WorkerId, ControlMessage)>,
    script_failures: HashMap<String, PlatformError>,
    delivery_failures: HashMap<WorkerId, PlatformError>,
    hanging: HashSet<WorkerId>,
    register_calls: usize,
    update_calls: usize,
}

impl SimulatedState {
    fn emit(&mut self, scope: &str, signal: PlatformSignal) {
        // Receivers dropped without unsubscribing are pruned here.
        self.subscribers.retain(|_, (subscribed, sender)| {
            subscribed.as_str() != scope || sender.send(signal.clone()).is_ok()
        });
    }

    fn set_state(&mut self, scope: &str, worker: &WorkerId, state: WorkerState) {
        if let Some(registration) = self.registrations.get_mut(scope) {
            match state {
                WorkerState::Installing => registration.installing = Some(worker.clone()),
                WorkerState::Installed => {
                    registration.installing = None;
                    registration.waiting = Some(worker.clone());
                }
                WorkerState::Activating | WorkerState::Activated => {
                    registration.waiting = None;
                    registration.active = Some(worker.clone());
                }
                WorkerState::Redundant => {}
            }
        }

        if state == WorkerState::Redundant {
            self.gone.insert(worker.clone());
        }

        self.emit(
            scope,
            PlatformSignal::StateChanged {
                worker: worker.clone(),
                state,
            },
        );
    }

    fn change_controller(&mut self, scope: &str, controller: Option<WorkerId>) {
        self.controller = controller.clone();
        self.emit(scope, PlatformSignal::ControllerChanged { controller });
    }
}

/// In-memory hosting environment.
///
/// Signals are only produced when a test drives them (`discover`,
/// `set_state`, `change_controller`, `emit`), except for the registration
/// completion signal and, with auto-activation on, the activation sequence
/// that follows a `skipWaiting` message.
#[derive(Debug)]
pub struct SimulatedContainer {
    state: Mutex<SimulatedState>,
}

impl Default for SimulatedContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedContainer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                supported: true,
                ..SimulatedState::default()
            }),
        }
    }

    /// Environment without background worker support
    pub fn unsupported() -> Self {
        Self {
            state: Mutex::new(SimulatedState::default()),
        }
    }

    /// Start with a worker already controlling the page
    pub fn with_controller(self, controller: WorkerId) -> Self {
        self.state.lock().controller = Some(controller);
        self
    }

    /// Answer `skipWaiting` by activating the worker and handing it control
    pub fn with_auto_activation(self) -> Self {
        self.state.lock().auto_activate = true;
        self
    }

    /// Make registration of a script fail with the given error
    pub fn fail_script(&self, script_url: &str, error: PlatformError) {
        self.state
            .lock()
            .script_failures
            .insert(script_url.to_string(), error);
    }

    /// Make every message to the worker fail with the given error
    pub fn fail_delivery(&self, worker: &WorkerId, error: PlatformError) {
        self.state
            .lock()
            .delivery_failures
            .insert(worker.clone(), error);
    }

    /// Record messages to the worker but never complete the delivery
    pub fn hang_delivery(&self, worker: &WorkerId) {
        self.state.lock().hanging.insert(worker.clone());
    }

    /// Deliver a raw signal to every subscriber of the scope
    pub fn emit(&self, scope: &str, signal: PlatformSignal) {
        self.state.lock().emit(scope, signal);
    }

    /// A new worker starts installing under the scope
    pub fn discover(&self, scope: &str) -> WorkerId {
        let worker = WorkerId::generate();
        let mut state = self.state.lock();
        state.worker_scopes.insert(worker.clone(), scope.to_string());
        if let Some(registration) = state.registrations.get_mut(scope) {
            registration.installing = Some(worker.clone());
        }
        state.emit(
            scope,
            PlatformSignal::CandidateDiscovered {
                worker: worker.clone(),
            },
        );
        worker
    }

    /// Move a worker to a new state. `Redundant` also makes it unreachable.
    pub fn set_state(&self, scope: &str, worker: &WorkerId, state: WorkerState) {
        self.state.lock().set_state(scope, worker, state);
    }

    pub fn change_controller(&self, scope: &str, controller: Option<WorkerId>) {
        self.state.lock().change_controller(scope, controller);
    }

    /// Drop a worker without telling anyone
    pub fn mark_gone(&self, worker: &WorkerId) {
        self.state.lock().gone.insert(worker.clone());
    }

    pub fn posted_messages(&self) -> Vec<(WorkerId, ControlMessage)> {
        self.state.lock().posted.clone()
    }

    pub fn subscriber_count(&self, scope: &str) -> usize {
        self.state
            .lock()
            .subscribers
            .values()
            .filter(|(subscribed, _)| subscribed.as_str() == scope)
            .count()
    }

    pub fn register_calls(&self) -> usize {
        self.state.lock().register_calls
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().update_calls
    }

    pub fn registration(&self, scope: &str) -> Option<PlatformRegistration> {
        self.state.lock().registrations.get(scope).cloned()
    }
}

#[async_trait]
impl ServiceWorkerContainer for SimulatedContainer {
    fn is_supported(&self) -> bool {
        self.state.lock().supported
    }

    fn controller(&self) -> Option<WorkerId> {
        self.state.lock().controller.clone()
    }

    async fn register(
        &self,
        script_url: &str,
        scope: &str,
    ) -> Result<PlatformRegistration, PlatformError> {
        let mut state = self.state.lock();
        if !state.supported {
            return Err(PlatformError::Unsupported);
        }
        if let Some(error) = state.script_failures.get(script_url) {
            return Err(error.clone());
        }

        state.register_calls += 1;
        let snapshot = state
            .registrations
            .entry(scope.to_string())
            .or_insert_with(|| PlatformRegistration {
                scope: scope.to_string(),
                script_url: script_url.to_string(),
                ..PlatformRegistration::default()
            })
            .clone();

        state.emit(
            scope,
            PlatformSignal::RegistrationComplete {
                scope: scope.to_string(),
            },
        );
        Ok(snapshot)
    }

    async fn update(&self, scope: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.update_calls += 1;
        if state.registrations.contains_key(scope) {
            Ok(())
        } else {
            Err(PlatformError::NotRegistered {
                scope: scope.to_string(),
            })
        }
    }

    async fn unregister(&self, scope: &str) -> Result<bool, PlatformError> {
        Ok(self.state.lock().registrations.remove(scope).is_some())
    }

    async fn post_message(
        &self,
        worker: &WorkerId,
        message: ControlMessage,
    ) -> Result<(), PlatformError> {
        let hang = {
            let mut state = self.state.lock();
            if state.gone.contains(worker) {
                return Err(PlatformError::WorkerGone {
                    worker: worker.clone(),
                });
            }
            if let Some(error) = state.delivery_failures.get(worker) {
                return Err(error.clone());
            }
            state.posted.push((worker.clone(), message));

            let hang = state.hanging.contains(worker);
            if !hang && state.auto_activate && message == ControlMessage::SkipWaiting {
                if let Some(scope) = state.worker_scopes.get(worker).cloned() {
                    state.set_state(&scope, worker, WorkerState::Activating);
                    state.set_state(&scope, worker, WorkerState::Activated);
                    state.change_controller(&scope, Some(worker.clone()));
                }
            }
            hang
        };

        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn subscribe(&self, scope: &str) -> (Uuid, mpsc::UnboundedReceiver<PlatformSignal>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.state
            .lock()
            .subscribers
            .insert(id, (scope.to_string(), sender));
        (id, receiver)
    }

    fn unsubscribe(&self, subscription_id: Uuid) {
        self.state.lock().subscribers.remove(&subscription_id);
    }
}
