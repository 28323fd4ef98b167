//! # System Constants
//!
//! Event names published by the manager and the user-facing copy used by the
//! default hooks.

/// Names of events published on the manager's observer channel
pub mod events {
    // Worker lifecycle events
    pub const WORKER_INSTALLING: &str = "worker.installing";
    pub const WORKER_INSTALLED: &str = "worker.installed";
    pub const WORKER_ACTIVATING: &str = "worker.activating";
    pub const WORKER_ACTIVATED: &str = "worker.activated";
    pub const WORKER_REDUNDANT: &str = "worker.redundant";
    pub const WORKER_SUPERSEDED: &str = "worker.superseded";
    pub const WORKER_PROTOCOL_VIOLATION: &str = "worker.protocol_violation";

    // Update and handover events
    pub const UPDATE_AVAILABLE: &str = "update.available";
    pub const HANDOVER_REQUESTED: &str = "handover.requested";
    pub const HANDOVER_FAILED: &str = "handover.failed";
    pub const CONTROLLER_CHANGED: &str = "controller.changed";

    // Manager events
    pub const HOOK_FAILED: &str = "hook.failed";
    pub const MANAGER_STOPPED: &str = "manager.stopped";
}

/// Copy shown through the notify collaborator
pub mod messages {
    pub const OFFLINE_READY: &str = "Caching complete! Future visits will work offline.";
    pub const UPDATE_AVAILABLE: &str = "A new version of this app is available.";
    pub const REFRESH_LABEL: &str = "REFRESH";
}
