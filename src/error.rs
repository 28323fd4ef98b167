use thiserror::Error;

use crate::config::ConfigurationError;
use crate::lifecycle::HandoverError;
use crate::platform::PlatformError;
use crate::registration::RegistrationError;
use crate::state_machine::errors::{HookError, LifecycleError};

/// Top-level error for the lifecycle manager.
///
/// Each subsystem keeps its own typed error; this enum exists so callers that
/// drive the whole manager can use a single `?`-friendly result type.
#[derive(Error, Debug)]
pub enum ServiceWorkerError {
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Handover error: {0}")]
    Handover(#[from] HandoverError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Manager is no longer running")]
    ManagerStopped,
}

pub type Result<T> = std::result::Result<T, ServiceWorkerError>;
