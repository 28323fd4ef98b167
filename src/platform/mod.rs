//! # Platform Boundary
//!
//! The hosting environment's worker container, seen only through the
//! [`ServiceWorkerContainer`] trait. Everything the lifecycle manager learns
//! about workers arrives as a [`PlatformSignal`] on a per-scope subscription;
//! everything it asks of the platform goes through the trait's methods.

pub mod signals;
pub mod subscription;

pub use signals::{ControlMessage, PlatformSignal, WorkerId};
pub use subscription::Subscription;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Snapshot of a registration as reported by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformRegistration {
    pub scope: String,
    pub script_url: String,
    pub installing: Option<WorkerId>,
    pub waiting: Option<WorkerId>,
    pub active: Option<WorkerId>,
}

/// Failures reported by the hosting environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Background workers are not supported by this environment")]
    Unsupported,

    #[error("Failed to fetch worker script {script_url}: {reason}")]
    ScriptFetchFailed { script_url: String, reason: String },

    #[error("Failed to evaluate worker script {script_url}: {reason}")]
    ScriptEvaluationFailed { script_url: String, reason: String },

    #[error("Security error for scope {scope}: {reason}")]
    Security { scope: String, reason: String },

    #[error("No registration for scope {scope}")]
    NotRegistered { scope: String },

    #[error("Worker {worker} is no longer reachable")]
    WorkerGone { worker: WorkerId },

    #[error("Platform error: {0}")]
    Internal(String),
}

/// The hosting environment's worker container.
///
/// Implementations deliver signals for a scope to every live subscriber, in
/// the order the platform observed them.
#[async_trait]
pub trait ServiceWorkerContainer: Send + Sync {
    /// Whether background workers are available at all
    fn is_supported(&self) -> bool;

    /// The worker controlling the current client, if any
    fn controller(&self) -> Option<WorkerId>;

    /// Register (or re-register) a worker script for a scope
    async fn register(
        &self,
        script_url: &str,
        scope: &str,
    ) -> Result<PlatformRegistration, PlatformError>;

    /// Ask the platform to re-check the script for a newer version
    async fn update(&self, scope: &str) -> Result<(), PlatformError>;

    /// Remove the registration; `Ok(false)` if nothing was registered
    async fn unregister(&self, scope: &str) -> Result<bool, PlatformError>;

    /// Deliver a control message to a specific worker
    async fn post_message(
        &self,
        worker: &WorkerId,
        message: ControlMessage,
    ) -> Result<(), PlatformError>;

    /// Open a signal stream for a scope. Prefer [`Subscription::open`], which
    /// releases the stream on drop.
    fn subscribe(&self, scope: &str) -> (Uuid, mpsc::UnboundedReceiver<PlatformSignal>);

    /// Release a stream opened with [`subscribe`](Self::subscribe)
    fn unsubscribe(&self, subscription_id: Uuid);
}
