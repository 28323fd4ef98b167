//! # Handover Coordinator
//!
//! Drives the swap from the current controller to a waiting candidate:
//! post `skipWaiting` to the candidate the user agreed to, wait for the
//! platform to report the controller change, then reload the page once.
//!
//! The reload flag is never reset. However many controller-change signals
//! arrive afterwards, the page is reloaded a single time.

use std::sync::Arc;
use thiserror::Error;

use super::watcher::UpdateWatcher;
use crate::platform::{ControlMessage, PlatformError, ServiceWorkerContainer, WorkerId};
use crate::presentation::Navigator;
use crate::state_machine::WorkerState;

/// Reasons a consent could not start a handover
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandoverError {
    #[error("Candidate {candidate} is redundant")]
    CandidateRedundant { candidate: WorkerId },

    #[error("Candidate {candidate} was superseded by a newer version")]
    CandidateSuperseded { candidate: WorkerId },

    #[error("Candidate {candidate} is not tracked by this registration")]
    UnknownCandidate { candidate: WorkerId },

    #[error("Candidate {candidate} is not waiting for activation (state: {state})")]
    NotWaiting {
        candidate: WorkerId,
        state: WorkerState,
    },

    #[error("Failed to deliver skip-waiting to {candidate}: {reason}")]
    DeliveryFailed { candidate: WorkerId, reason: String },

    #[error("Page reload already performed")]
    AlreadyReloaded,
}

/// What the coordinator did with a controller-change signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerChangeOutcome {
    /// First change after a consented handover; the page was reloaded
    Reloaded,
    /// Controller changed with no handover in flight
    Unsolicited,
    /// A reload already happened; the signal was swallowed
    Suppressed,
}

pub struct HandoverCoordinator {
    container: Arc<dyn ServiceWorkerContainer>,
    navigator: Arc<dyn Navigator>,
    awaiting: Option<WorkerId>,
    reloaded: bool,
}

impl HandoverCoordinator {
    pub fn new(container: Arc<dyn ServiceWorkerContainer>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            container,
            navigator,
            awaiting: None,
            reloaded: false,
        }
    }

    /// Consent entry point: ask the waiting candidate to activate now
    pub async fn consent(
        &mut self,
        candidate: &WorkerId,
        watcher: &UpdateWatcher,
    ) -> Result<(), HandoverError> {
        if let Err(err) = self.check_candidate(candidate, watcher) {
            crate::log_handover!(warn, "CONSENT_REJECTED",
                candidate: candidate,
                error: err.to_string()
            );
            return Err(err);
        }

        self.container
            .post_message(candidate, ControlMessage::SkipWaiting)
            .await
            .map_err(|err| {
                crate::log_handover!(warn, "DELIVERY_FAILED",
                    candidate: candidate,
                    error: err.to_string()
                );
                match err {
                    PlatformError::WorkerGone { .. } => HandoverError::CandidateRedundant {
                        candidate: candidate.clone(),
                    },
                    other => HandoverError::DeliveryFailed {
                        candidate: candidate.clone(),
                        reason: other.to_string(),
                    },
                }
            })?;

        crate::log_handover!(info, "SKIP_WAITING_SENT", candidate: candidate);
        self.awaiting = Some(candidate.clone());
        Ok(())
    }

    fn check_candidate(&self, candidate: &WorkerId, watcher: &UpdateWatcher) -> Result<(), HandoverError> {
        if self.reloaded {
            return Err(HandoverError::AlreadyReloaded);
        }

        let Some(machine) = watcher.candidate(candidate) else {
            return Err(if watcher.was_abandoned(candidate) {
                HandoverError::CandidateSuperseded {
                    candidate: candidate.clone(),
                }
            } else if watcher.was_retired(candidate) {
                HandoverError::CandidateRedundant {
                    candidate: candidate.clone(),
                }
            } else {
                HandoverError::UnknownCandidate {
                    candidate: candidate.clone(),
                }
            });
        };

        if machine.is_terminal() {
            return Err(HandoverError::CandidateRedundant {
                candidate: candidate.clone(),
            });
        }

        if !machine.is_waiting_for_activation() {
            return Err(HandoverError::NotWaiting {
                candidate: candidate.clone(),
                state: machine.current_state(),
            });
        }

        Ok(())
    }

    /// React to the platform swapping the controller
    pub fn on_controller_changed(&mut self, controller: Option<&WorkerId>) -> ControllerChangeOutcome {
        if self.reloaded {
            crate::log_handover!(warn, "DUPLICATE_CONTROLLER_CHANGE", controller: controller);
            return ControllerChangeOutcome::Suppressed;
        }

        let Some(awaiting) = self.awaiting.take() else {
            crate::log_handover!(info, "UNSOLICITED_CONTROLLER_CHANGE", controller: controller);
            return ControllerChangeOutcome::Unsolicited;
        };

        if controller != Some(&awaiting) {
            crate::log_handover!(warn, "CONTROLLER_MISMATCH",
                expected: awaiting,
                actual: controller
            );
        }

        self.reloaded = true;
        crate::log_handover!(info, "RELOADING", candidate: awaiting);
        self.navigator.reload_page();
        ControllerChangeOutcome::Reloaded
    }

    /// Forget a consented candidate that went redundant or was superseded
    /// before taking control. A later controller change is then unsolicited.
    pub fn candidate_retired(&mut self, worker: &WorkerId) {
        if self.awaiting.as_ref() == Some(worker) {
            crate::log_handover!(info, "CANDIDATE_LOST", candidate: worker);
            self.awaiting = None;
        }
    }

    /// Candidate a handover is waiting on, if any
    pub fn awaiting(&self) -> Option<&WorkerId> {
        self.awaiting.as_ref()
    }

    pub fn has_reloaded(&self) -> bool {
        self.reloaded
    }
}

impl std::fmt::Debug for HandoverCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoverCoordinator")
            .field("awaiting", &self.awaiting)
            .field("reloaded", &self.reloaded)
            .finish()
    }
}
