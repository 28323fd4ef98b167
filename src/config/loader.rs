//! Configuration Loader
//!
//! Layered loading through the `config` crate: built-in defaults, then an
//! optional YAML file, then `SW_`-prefixed environment variables.

use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

use super::error::ConfigResult;
use super::ManagerConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, optionally reading a YAML file first
    pub fn load(path: Option<&Path>) -> ConfigResult<ManagerConfig> {
        Self::load_with_environment(path, Some(Environment::with_prefix("SW").try_parsing(true)))
    }

    /// Load from a YAML file only, ignoring the process environment
    pub fn load_file(path: &Path) -> ConfigResult<ManagerConfig> {
        Self::load_with_environment(Some(path), None)
    }

    fn load_with_environment(
        path: Option<&Path>,
        environment: Option<Environment>,
    ) -> ConfigResult<ManagerConfig> {
        let defaults = ManagerConfig::default();

        let mut builder = Config::builder()
            .set_default("resource", defaults.resource.clone())?
            .set_default("event_channel_capacity", defaults.event_channel_capacity as i64)?
            .set_default("environment", defaults.environment.clone())?;

        if let Some(path) = path {
            debug!("Loading manager configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }

        if let Some(environment) = environment {
            builder = builder.add_source(environment);
        }

        let config: ManagerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        crate::log_registration!(debug, "CONFIG_LOADED",
            resource: config.resource,
            scope: config.scope,
            environment: config.environment
        );

        Ok(config)
    }
}
