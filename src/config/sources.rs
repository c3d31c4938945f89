//! Configuration sources: built-in defaults, user file, environment.

use super::EngineConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment prefix; nested keys use `__`, e.g. `ARCHIVE__CACHE__BACKEND=sled`
pub const ENV_PREFIX: &str = "ARCHIVE";

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "portal-archive")
}

/// User config file location (`<config dir>/portal-archive/config.toml`)
pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Start a builder seeded with the default configuration
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&EngineConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}

/// Overlay the user config file if it exists
pub fn add_user_file(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match user_config_path() {
        Some(path) => Ok(builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )),
        None => Ok(builder),
    }
}

/// Overlay a specific file, which must exist
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(File::from(path.to_path_buf()).required(true)))
}

/// Overlay `ARCHIVE__*` environment variables
pub fn add_environment(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    ))
}
