//! # Manager Configuration
//!
//! The default manager needs exactly one thing: the path of the worker script
//! it registers. The remaining fields have working defaults and exist for
//! embedding hosts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serviceworker_core::config::{ConfigLoader, ManagerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Minimal: just the script
//! let config = ManagerConfig::new("/app/sw.js");
//!
//! // Layered: defaults, then a YAML file, then SW_* environment variables
//! let config = ConfigLoader::load(Some(std::path::Path::new("config/worker.yaml")))?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Default capacity of the manager's observer broadcast channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Worker script path, e.g. `/app/sw.js`
    pub resource: String,
    /// Optional narrower scope; defaults to the script's directory
    pub scope: Option<String>,
    pub event_channel_capacity: usize,
    pub environment: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            resource: String::new(),
            scope: None,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            environment: crate::logging::get_environment(),
        }
    }
}

impl ManagerConfig {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Build from `SW_RESOURCE`, `SW_SCOPE` and `SW_EVENT_CHANNEL_CAPACITY`
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` with an injectable source
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(resource) = lookup("SW_RESOURCE") {
            config.resource = resource;
        }

        if let Some(scope) = lookup("SW_SCOPE") {
            config.scope = Some(scope);
        }

        if let Some(capacity) = lookup("SW_EVENT_CHANNEL_CAPACITY") {
            config.event_channel_capacity = capacity.parse().map_err(|e| {
                ConfigurationError::invalid_value(
                    "event_channel_capacity",
                    capacity.clone(),
                    format!("not a positive integer: {e}"),
                )
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.resource.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "resource",
                "service worker manager configuration",
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "event_channel_capacity",
                "0",
                "channel capacity must be greater than 0",
            ));
        }

        if let Some(scope) = &self.scope {
            if scope.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    "scope",
                    scope.clone(),
                    "scope must not be blank when set",
                ));
            }
        }

        Ok(())
    }
}
