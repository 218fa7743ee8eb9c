use config::shared::LoaderConfig;
use config::{Environment, load_config, load_config_from};
use std::path::Path;

use crate::error::{LoaderError, LoaderResult};

/// Loads and validates the loader configuration.
///
/// Reads from `directory` when given, otherwise from `configuration/` under
/// the working directory.
pub fn load_loader_config(directory: Option<&Path>) -> LoaderResult<LoaderConfig> {
    let config = match directory {
        Some(directory) => {
            let environment = Environment::load().map_err(LoaderError::config)?;
            load_config_from::<LoaderConfig>(directory, environment)
        }
        None => load_config::<LoaderConfig>(),
    }
    .map_err(LoaderError::config)?;

    config.validate().map_err(LoaderError::config)?;

    Ok(config)
}
