//! ConfigLoader: composes sources and deserializes to `EngineConfig`.

use super::sources;
use super::EngineConfig;
use config::ConfigError;
use std::path::Path;
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration.
    /// Precedence: defaults (lowest) -> user file -> environment (highest).
    pub fn load() -> Result<EngineConfig, ConfigError> {
        let builder = sources::builder_with_defaults()?;
        let builder = sources::add_user_file(builder)?;
        let builder = sources::add_environment(builder)?;
        let config: EngineConfig = builder.build()?.try_deserialize()?;
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from a specific file with environment overlay
    pub fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
        let builder = sources::builder_with_defaults()?;
        let builder = sources::add_file(builder, path)?;
        let builder = sources::add_environment(builder)?;
        builder.build()?.try_deserialize()
    }
}
