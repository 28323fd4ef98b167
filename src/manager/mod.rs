//! # Service Worker Manager
//!
//! Owner of one registration's lifecycle. [`ServiceWorkerManager::load`]
//! registers the worker script, attaches the update watcher and spawns a
//! single tokio task that owns every piece of lifecycle state. The returned
//! [`ManagerHandle`] is how the embedding page talks to that task.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serviceworker_core::manager::{ManagerEvent, ServiceWorkerManager};
//! use serviceworker_core::test_helpers::{RecordingNavigator, RecordingNotifier, SimulatedContainer};
//!
//! # async fn run() -> serviceworker_core::Result<()> {
//! let container = Arc::new(SimulatedContainer::new());
//! let manager = ServiceWorkerManager::default_manager(
//!     "/app/sw.js",
//!     container,
//!     Arc::new(RecordingNotifier::default()),
//!     Arc::new(RecordingNavigator::default()),
//! );
//!
//! let handle = manager.load().await?;
//! let mut events = handle.subscribe();
//! while let Ok(event) = events.recv().await {
//!     if matches!(event, ManagerEvent::ControllerChanged { .. }) {
//!         break;
//!     }
//! }
//! let summary = handle.teardown().await?;
//! println!("processed {} signals", summary.signals_processed);
//! # Ok(())
//! # }
//! ```

pub mod default_hooks;
pub mod event_loop;
pub mod events;

pub use default_hooks::DefaultLifecycleHooks;
pub use event_loop::LifecycleSummary;
pub use events::{EventPublisher, ManagerEvent};

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::ManagerConfig;
use crate::error::{Result, ServiceWorkerError};
use crate::lifecycle::{ConsentHandle, ConsentRequest, HandoverCoordinator, UpdateWatcher};
use crate::platform::{ServiceWorkerContainer, Subscription, WorkerId};
use crate::presentation::{Navigator, Notifier};
use crate::registration::{scope, RegistrationError, RegistrationGateway, RegistrationHandle};
use crate::state_machine::LifecycleHooks;
use event_loop::LifecycleLoop;

/// Configured but not yet started manager
pub struct ServiceWorkerManager {
    config: ManagerConfig,
    container: Arc<dyn ServiceWorkerContainer>,
    gateway: Arc<RegistrationGateway>,
    hooks: Arc<dyn LifecycleHooks>,
    navigator: Arc<dyn Navigator>,
}

impl ServiceWorkerManager {
    pub fn new(
        config: ManagerConfig,
        container: Arc<dyn ServiceWorkerContainer>,
        hooks: Arc<dyn LifecycleHooks>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let gateway = Arc::new(RegistrationGateway::new(container.clone()));
        Self {
            config,
            container,
            gateway,
            hooks,
            navigator,
        }
    }

    /// Manager wired with [`DefaultLifecycleHooks`]: logs every transition,
    /// announces offline readiness and offers a refresh on updates.
    pub fn default_manager(
        resource: impl Into<String>,
        container: Arc<dyn ServiceWorkerContainer>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(
            ManagerConfig::new(resource),
            container,
            Arc::new(DefaultLifecycleHooks::new(notifier)),
            navigator,
        )
    }

    /// Share a gateway with other managers on the same page, so repeated
    /// registration of a scope resolves to the same handle.
    pub fn with_gateway(mut self, gateway: Arc<RegistrationGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn gateway(&self) -> Arc<RegistrationGateway> {
        self.gateway.clone()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn is_supported(&self) -> bool {
        self.container.is_supported()
    }

    /// Register the worker script and start the lifecycle loop.
    ///
    /// The signal subscription is opened before the registration call so that
    /// no signal produced by the registration itself can be missed.
    pub async fn load(self) -> Result<ManagerHandle> {
        self.config.validate()?;

        if !self.container.is_supported() {
            crate::log_registration!(warn, "UNSUPPORTED", resource: self.config.resource);
            return Err(RegistrationError::Unsupported.into());
        }

        let scope = scope::resolve_scope(&self.config.resource, self.config.scope.as_deref())?;
        let subscription = Subscription::open(self.container.clone(), &scope);

        let registration = self
            .gateway
            .register_with_scope(&self.config.resource, Some(&scope))
            .await?;

        let watcher = UpdateWatcher::attach(&registration, self.container.controller());
        let coordinator = HandoverCoordinator::new(self.container.clone(), self.navigator.clone());
        let publisher = EventPublisher::new(self.config.event_channel_capacity);
        let (consent_tx, consent_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let event_loop = LifecycleLoop {
            subscription,
            watcher,
            coordinator,
            hooks: self.hooks.clone(),
            publisher: publisher.clone(),
            consent_tx: consent_tx.clone(),
            consent_rx,
            shutdown_rx,
            summary: LifecycleSummary::default(),
        };

        crate::log_lifecycle!(info, "MANAGER_STARTED",
            scope: registration.scope(),
            hooks: self.hooks.hooks_name(),
            environment: self.config.environment
        );

        let join = tokio::spawn(event_loop.run());

        Ok(ManagerHandle {
            registration,
            publisher,
            consent_tx,
            gateway: self.gateway,
            shutdown_tx: Some(shutdown_tx),
            join: Some(join),
        })
    }
}

impl std::fmt::Debug for ServiceWorkerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorkerManager")
            .field("config", &self.config)
            .field("hooks", &self.hooks.hooks_name())
            .finish()
    }
}

/// Running manager. Dropping the handle stops the loop and releases the
/// platform subscription.
pub struct ManagerHandle {
    registration: RegistrationHandle,
    publisher: EventPublisher,
    consent_tx: mpsc::UnboundedSender<ConsentRequest>,
    gateway: Arc<RegistrationGateway>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<LifecycleSummary>>,
}

impl ManagerHandle {
    pub fn registration(&self) -> &RegistrationHandle {
        &self.registration
    }

    /// Observe everything the loop does from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.publisher.subscribe()
    }

    /// Grant consent to hand control to a waiting candidate
    pub fn consent(&self, candidate: &WorkerId) -> Result<()> {
        self.consent_tx
            .send(ConsentRequest {
                candidate: candidate.clone(),
            })
            .map_err(|_| ServiceWorkerError::ManagerStopped)
    }

    /// Consent capability for a candidate, for wiring into custom UI
    pub fn consent_handle(&self, candidate: WorkerId) -> ConsentHandle {
        ConsentHandle::new(candidate, self.consent_tx.clone())
    }

    /// Ask the platform to check for a newer script
    pub async fn update(&self) -> Result<()> {
        self.gateway.update(&self.registration).await?;
        Ok(())
    }

    /// Remove the registration. The loop keeps running until teardown.
    pub async fn unregister(&self) -> Result<bool> {
        Ok(self.gateway.unregister(&self.registration).await?)
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }

    /// Stop the loop and wait for it to release its subscription
    pub async fn teardown(mut self) -> Result<LifecycleSummary> {
        if let Some(shutdown) = self.shutdown_tx.take() {
            let _ = shutdown.send(());
        }

        let Some(join) = self.join.take() else {
            return Err(ServiceWorkerError::ManagerStopped);
        };

        join.await.map_err(|err| {
            crate::log_lifecycle!(error, "LOOP_JOIN_FAILED", error: err.to_string());
            ServiceWorkerError::ManagerStopped
        })
    }
}

impl Drop for ManagerHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown_tx.take() {
            let _ = shutdown.send(());
        }
    }
}

impl std::fmt::Debug for ManagerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerHandle")
            .field("scope", &self.registration.scope())
            .field("running", &self.is_running())
            .finish()
    }
}
