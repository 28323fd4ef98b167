use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::events::{EventPublisher, ManagerEvent};
use crate::lifecycle::{
    ConsentHandle, ConsentRequest, ControllerChangeOutcome, HandoverCoordinator, HandoverError,
    UpdateWatcher, WatcherOutput,
};
use crate::platform::{PlatformSignal, Subscription, WorkerId};
use crate::state_machine::{
    dispatch_lifecycle_hook, guard_hook, HookResult, LifecycleHooks, WorkerState,
};

/// Counters reported when the loop stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleSummary {
    pub signals_processed: u64,
    pub lifecycle_events: u64,
    pub update_notices: u64,
    pub protocol_violations: u64,
    pub hook_failures: u64,
    pub handovers_requested: u64,
    pub reloaded: bool,
}

/// Single owner of all lifecycle state for one registration.
///
/// Platform signals and consent requests are handled strictly one at a time,
/// in arrival order. Dropping the loop releases the platform subscription.
pub(crate) struct LifecycleLoop {
    pub(crate) subscription: Subscription,
    pub(crate) watcher: UpdateWatcher,
    pub(crate) coordinator: HandoverCoordinator,
    pub(crate) hooks: Arc<dyn LifecycleHooks>,
    pub(crate) publisher: EventPublisher,
    pub(crate) consent_tx: mpsc::UnboundedSender<ConsentRequest>,
    pub(crate) consent_rx: mpsc::UnboundedReceiver<ConsentRequest>,
    pub(crate) shutdown_rx: oneshot::Receiver<()>,
    pub(crate) summary: LifecycleSummary,
}

impl LifecycleLoop {
    pub(crate) async fn run(mut self) -> LifecycleSummary {
        crate::log_lifecycle!(debug, "LOOP_STARTED", scope: self.watcher.scope());

        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    crate::log_lifecycle!(info, "TEARDOWN", scope: self.watcher.scope());
                    break;
                }

                signal = self.subscription.recv() => match signal {
                    Some(signal) => self.handle_signal(signal),
                    None => {
                        crate::log_lifecycle!(warn, "PLATFORM_STREAM_CLOSED", scope: self.watcher.scope());
                        break;
                    }
                },

                Some(request) = self.consent_rx.recv() => {
                    let candidate = request.candidate;
                    // a delivery that never completes must not block teardown
                    let outcome = {
                        let consent = self.coordinator.consent(&candidate, &self.watcher);
                        tokio::select! {
                            biased;
                            _ = &mut self.shutdown_rx => None,
                            result = consent => Some(result),
                        }
                    };
                    match outcome {
                        Some(result) => self.finish_consent(candidate, result),
                        None => {
                            crate::log_lifecycle!(info, "TEARDOWN",
                                scope: self.watcher.scope(),
                                pending_consent: candidate
                            );
                            break;
                        }
                    }
                }
            }
        }

        self.publisher.publish(ManagerEvent::Stopped);
        crate::log_lifecycle!(info, "LOOP_STOPPED",
            scope: self.watcher.scope(),
            summary: self.summary
        );
        self.summary
    }

    fn handle_signal(&mut self, signal: PlatformSignal) {
        self.summary.signals_processed += 1;
        tracing::debug!(signal = signal.signal_type(), worker = ?signal.worker(), "Platform signal");

        for output in self.watcher.observe(&signal) {
            self.apply(output);
        }

        if let PlatformSignal::ControllerChanged { controller } = signal {
            if !self.coordinator.has_reloaded() {
                let hooks = self.hooks.clone();
                self.record_hook(guard_hook("on_controller_change", || {
                    hooks.on_controller_change(controller.as_ref())
                }));
            }

            let outcome = self.coordinator.on_controller_changed(controller.as_ref());
            if outcome == ControllerChangeOutcome::Reloaded {
                self.summary.reloaded = true;
            }
            self.publisher
                .publish(ManagerEvent::ControllerChanged { controller, outcome });
        }
    }

    fn apply(&mut self, output: WatcherOutput) {
        match output {
            WatcherOutput::Lifecycle(event) => {
                self.summary.lifecycle_events += 1;
                if event.to_state == WorkerState::Redundant {
                    self.coordinator.candidate_retired(&event.candidate);
                }
                let result = dispatch_lifecycle_hook(self.hooks.as_ref(), &event);
                self.record_hook(result);
                self.publisher.publish(ManagerEvent::Lifecycle(event));
            }
            WatcherOutput::Update(notice) => {
                self.summary.update_notices += 1;
                let consent = ConsentHandle::new(notice.candidate.clone(), self.consent_tx.clone());
                let hooks = self.hooks.clone();
                self.record_hook(guard_hook("on_new_candidate_found", || {
                    hooks.on_new_candidate_found(&notice, consent)
                }));
                self.publisher.publish(ManagerEvent::UpdateAvailable(notice));
            }
            WatcherOutput::Superseded { abandoned, by } => {
                self.coordinator.candidate_retired(&abandoned);
                self.publisher
                    .publish(ManagerEvent::CandidateSuperseded { abandoned, by });
            }
            WatcherOutput::Violation(err) => {
                self.summary.protocol_violations += 1;
                self.publisher.publish(ManagerEvent::ProtocolViolation(err));
            }
        }
    }

    fn finish_consent(&mut self, candidate: WorkerId, result: Result<(), HandoverError>) {
        match result {
            Ok(()) => {
                self.summary.handovers_requested += 1;
                self.publisher
                    .publish(ManagerEvent::HandoverRequested { candidate });
            }
            Err(err) => self.publisher.publish(ManagerEvent::HandoverFailed(err)),
        }
    }

    fn record_hook(&mut self, result: HookResult) {
        if let Err(err) = result {
            self.summary.hook_failures += 1;
            self.publisher.publish(ManagerEvent::HookFailed(err));
        }
    }
}
