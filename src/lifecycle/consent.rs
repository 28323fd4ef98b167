use tokio::sync::mpsc;

use crate::platform::WorkerId;
use crate::presentation::NotifyAction;

/// Consent to hand control over to a waiting candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRequest {
    pub candidate: WorkerId,
}

/// Capability handed to the presentation layer alongside an update notice.
///
/// Granting is synchronous and never blocks, so it can be called straight
/// from a click handler. The request is processed by the manager's event
/// loop in arrival order.
#[derive(Debug, Clone)]
pub struct ConsentHandle {
    candidate: WorkerId,
    sender: mpsc::UnboundedSender<ConsentRequest>,
}

impl ConsentHandle {
    pub fn new(candidate: WorkerId, sender: mpsc::UnboundedSender<ConsentRequest>) -> Self {
        Self { candidate, sender }
    }

    pub fn candidate(&self) -> &WorkerId {
        &self.candidate
    }

    /// Request the handover. Returns `false` if the manager is gone.
    pub fn grant(&self) -> bool {
        let delivered = self
            .sender
            .send(ConsentRequest {
                candidate: self.candidate.clone(),
            })
            .is_ok();
        if !delivered {
            crate::log_handover!(debug, "CONSENT_DROPPED", candidate: self.candidate);
        }
        delivered
    }

    /// Wrap the grant in a notification action
    pub fn into_action(self, label: impl Into<String>) -> NotifyAction {
        NotifyAction::new(label, move || {
            self.grant();
        })
    }
}
