use std::path::{Path, PathBuf};

use rust_cli_config::builder::{ConfigBuilder, DefaultState};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::{Environment, UnknownEnvironment};

/// Directory, relative to the working directory, holding the configuration files.
const CONFIGURATION_DIR: &str = "configuration";

/// Extensions tried, in order, for every configuration file.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Stem of the file every environment starts from.
const BASE_FILE_STEM: &str = "base";

/// Prefix of environment variable overrides, e.g. `APP_INGEST__WORKER_COUNT`.
const ENV_PREFIX: &str = "APP";

/// Separator between nested keys in environment variable overrides.
const ENV_SEPARATOR: &str = "__";

/// Separator between list elements in environment variable overrides.
const LIST_SEPARATOR: &str = ",";

/// Implemented by top-level configuration types loadable with [`load_config`].
pub trait Config {
    /// Dotted keys whose environment overrides are comma-separated lists.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Errors raised while assembling a configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("could not find `{stem}` configuration in `{directory}`, tried: {attempted}")]
    ConfigurationFileMissing {
        stem: String,
        directory: PathBuf,
        attempted: String,
    },

    #[error("failed to read configuration file `{path}`: {source}")]
    ConfigurationFileLoad {
        path: PathBuf,
        #[source]
        source: rust_cli_config::ConfigError,
    },

    #[error("invalid runtime environment: {0}")]
    Environment(#[from] UnknownEnvironment),

    #[error("failed to merge configuration sources: {0}")]
    Build(#[source] rust_cli_config::ConfigError),

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] rust_cli_config::ConfigError),
}

/// Loads `T` from the `configuration` directory of the working directory.
///
/// Layers, later ones winning: `base.{yaml,yml,json}`, then the file named after the
/// environment selected by `APP_ENVIRONMENT` (`dev` or `prod`), then `APP_`-prefixed
/// environment variables with `__` between nested keys (`APP_STORE__SCYLLA__KEYSPACE`).
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let directory = std::env::current_dir()
        .map_err(LoadConfigError::CurrentDir)?
        .join(CONFIGURATION_DIR);

    load_config_from::<T>(&directory, Environment::load()?)
}

/// Loads `T` from an explicit configuration directory and environment.
///
/// Environment variable overrides still apply.
pub fn load_config_from<T>(directory: &Path, environment: Environment) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            directory.to_path_buf(),
        ));
    }

    let mut builder = rust_cli_config::Config::builder();
    for stem in [BASE_FILE_STEM, environment.as_str()] {
        let path = find_configuration_file(directory, stem)?;
        builder = builder.add_source(rust_cli_config::File::from(path.clone()));
        check_source(&builder, &path)?;
    }

    let settings = builder
        .add_source(environment_overrides::<T>())
        .build()
        .map_err(LoadConfigError::Build)?;

    settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

fn environment_overrides<T: Config>() -> rust_cli_config::Environment {
    let mut source = rust_cli_config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_SEPARATOR);

    if !T::LIST_PARSE_KEYS.is_empty() {
        source = source.try_parsing(true).list_separator(LIST_SEPARATOR);
        for key in T::LIST_PARSE_KEYS {
            source = source.with_list_parse_key(key);
        }
    }

    source
}

/// Returns the first existing `{stem}.{extension}` file in `directory`.
fn find_configuration_file(directory: &Path, stem: &str) -> Result<PathBuf, LoadConfigError> {
    let candidates = CONFIG_FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .collect::<Vec<_>>();

    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        return Ok(path.clone());
    }

    Err(LoadConfigError::ConfigurationFileMissing {
        stem: stem.to_owned(),
        directory: directory.to_path_buf(),
        attempted: candidates
            .iter()
            .map(|path| format!("`{}`", path.display()))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Builds the layers added so far so that a malformed file is reported by name.
fn check_source(builder: &ConfigBuilder<DefaultState>, path: &Path) -> Result<(), LoadConfigError> {
    builder
        .clone()
        .build()
        .map(|_| ())
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        workers: u32,
    }

    impl Config for Sample {
        const LIST_PARSE_KEYS: &'static [&'static str] = &[];
    }

    #[test]
    fn environment_file_overrides_base() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("base.yaml"), "name: base\nworkers: 4\n").unwrap();
        fs::write(dir.join("prod.json"), r#"{"workers": 250}"#).unwrap();

        let sample = load_config_from::<Sample>(dir, Environment::Prod).unwrap();
        assert_eq!(sample.name, "base");
        assert_eq!(sample.workers, 250);
    }

    #[test]
    fn missing_environment_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("base.yml"), "name: base\nworkers: 4\n").unwrap();

        let err = load_config_from::<Sample>(dir, Environment::Dev).unwrap_err();
        assert!(matches!(
            err,
            LoadConfigError::ConfigurationFileMissing { ref stem, .. } if stem == "dev"
        ));
    }

    #[test]
    fn missing_directory_is_reported() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("configuration");
        let err = load_config_from::<Sample>(&dir, Environment::Dev).unwrap_err();
        assert!(matches!(err, LoadConfigError::MissingConfigurationDirectory(_)));
    }
}
