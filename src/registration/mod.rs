//! # Registration Gateway
//!
//! Thin wrapper over the platform's registration primitive.
//!
//! ## Overview
//!
//! The gateway resolves the scope a worker script may control, asks the
//! platform to register it, and hands back a [`RegistrationHandle`]. Handles
//! are cached per scope so registering the same scope twice returns the
//! handle created the first time instead of a duplicate registration.
//!
//! Registering never raises lifecycle events; those come from the update
//! watcher once it attaches to the handle.

pub mod scope;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::platform::{PlatformError, PlatformRegistration, ServiceWorkerContainer};

/// Errors raised while registering a worker script
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Background workers are not supported by this environment")]
    Unsupported,

    #[error("Invalid script URL {script_url}: {reason}")]
    InvalidScriptUrl { script_url: String, reason: String },

    #[error("Invalid scope {scope}: {reason}")]
    InvalidScope { scope: String, reason: String },

    #[error("Worker script {script_url} could not be loaded: {reason}")]
    ScriptFailed { script_url: String, reason: String },

    #[error("No registration for scope {scope}")]
    NotRegistered { scope: String },

    #[error("Platform error: {0}")]
    Platform(PlatformError),
}

impl RegistrationError {
    fn from_platform(err: PlatformError) -> Self {
        match err {
            PlatformError::Unsupported => Self::Unsupported,
            PlatformError::ScriptFetchFailed { script_url, reason }
            | PlatformError::ScriptEvaluationFailed { script_url, reason } => {
                Self::ScriptFailed { script_url, reason }
            }
            PlatformError::Security { scope, reason } => Self::InvalidScope { scope, reason },
            PlatformError::NotRegistered { scope } => Self::NotRegistered { scope },
            other => Self::Platform(other),
        }
    }
}

#[derive(Debug)]
struct HandleInner {
    id: Uuid,
    scope: String,
    script_url: String,
    registered_at: DateTime<Utc>,
    snapshot: PlatformRegistration,
}

/// Shared, read-only handle to one registration scope
#[derive(Debug, Clone)]
pub struct RegistrationHandle {
    inner: Arc<HandleInner>,
}

impl RegistrationHandle {
    pub(crate) fn new(script_url: &str, snapshot: PlatformRegistration) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: Uuid::new_v4(),
                scope: snapshot.scope.clone(),
                script_url: script_url.to_string(),
                registered_at: Utc::now(),
                snapshot,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn scope(&self) -> &str {
        &self.inner.scope
    }

    pub fn script_url(&self) -> &str {
        &self.inner.script_url
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.inner.registered_at
    }

    /// Platform state at the time the registration completed
    pub fn snapshot(&self) -> &PlatformRegistration {
        &self.inner.snapshot
    }
}

impl PartialEq for RegistrationHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for RegistrationHandle {}

/// Idempotent front door to the platform's registration primitive
pub struct RegistrationGateway {
    container: Arc<dyn ServiceWorkerContainer>,
    registrations: Mutex<HashMap<String, RegistrationHandle>>,
}

impl RegistrationGateway {
    pub fn new(container: Arc<dyn ServiceWorkerContainer>) -> Self {
        Self {
            container,
            registrations: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.container.is_supported()
    }

    /// Register a script under its default scope (the script's directory)
    pub async fn register(&self, script_url: &str) -> Result<RegistrationHandle, RegistrationError> {
        self.register_with_scope(script_url, None).await
    }

    /// Register a script, optionally narrowing the scope it controls
    pub async fn register_with_scope(
        &self,
        script_url: &str,
        requested_scope: Option<&str>,
    ) -> Result<RegistrationHandle, RegistrationError> {
        if !self.container.is_supported() {
            crate::log_registration!(warn, "UNSUPPORTED", script_url: script_url);
            return Err(RegistrationError::Unsupported);
        }

        let scope = scope::resolve_scope(script_url, requested_scope)?;

        if let Some(existing) = self.handle(&scope) {
            if existing.script_url() != script_url {
                crate::log_registration!(warn, "SCRIPT_MISMATCH",
                    scope: scope,
                    registered: existing.script_url(),
                    requested: script_url
                );
            }
            crate::log_registration!(debug, "REUSED", scope: scope, handle: existing.id());
            return Ok(existing);
        }

        let snapshot = self
            .container
            .register(script_url, &scope)
            .await
            .map_err(|err| {
                crate::log_registration!(error, "FAILED",
                    scope: scope,
                    script_url: script_url,
                    error: err.to_string()
                );
                RegistrationError::from_platform(err)
            })?;

        // Another caller may have completed the same registration while we awaited.
        let mut registrations = self.registrations.lock();
        let handle = registrations
            .entry(scope.clone())
            .or_insert_with(|| RegistrationHandle::new(script_url, snapshot))
            .clone();
        drop(registrations);

        crate::log_registration!(info, "REGISTERED",
            scope: scope,
            script_url: script_url,
            handle: handle.id()
        );
        Ok(handle)
    }

    /// Ask the platform to look for a newer version of the registered script
    pub async fn update(&self, handle: &RegistrationHandle) -> Result<(), RegistrationError> {
        self.ensure_current(handle)?;
        self.container
            .update(handle.scope())
            .await
            .map_err(RegistrationError::from_platform)?;
        crate::log_registration!(debug, "UPDATE_REQUESTED", scope: handle.scope());
        Ok(())
    }

    /// Remove the registration and forget its handle
    pub async fn unregister(&self, handle: &RegistrationHandle) -> Result<bool, RegistrationError> {
        self.ensure_current(handle)?;
        let removed = self
            .container
            .unregister(handle.scope())
            .await
            .map_err(RegistrationError::from_platform)?;
        self.registrations.lock().remove(handle.scope());
        crate::log_registration!(info, "UNREGISTERED", scope: handle.scope(), removed: removed);
        Ok(removed)
    }

    /// Existing handle for a scope, if registered
    pub fn handle(&self, scope: &str) -> Option<RegistrationHandle> {
        self.registrations.lock().get(scope).cloned()
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.lock().len()
    }

    fn ensure_current(&self, handle: &RegistrationHandle) -> Result<(), RegistrationError> {
        match self.handle(handle.scope()) {
            Some(current) if current == *handle => Ok(()),
            _ => Err(RegistrationError::NotRegistered {
                scope: handle.scope().to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for RegistrationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationGateway")
            .field("container", &"<Arc<dyn ServiceWorkerContainer>>")
            .field("registrations", &self.registration_count())
            .finish()
    }
}
