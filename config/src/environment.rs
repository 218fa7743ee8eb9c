use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Variable selecting the environment configuration file.
const APP_ENVIRONMENT_ENV_NAME: &str = "APP_ENVIRONMENT";

const DEV_ENV_NAME: &str = "dev";

const PROD_ENV_NAME: &str = "prod";

/// Returned when `APP_ENVIRONMENT` names an environment the loader does not know.
#[derive(Debug, Error)]
#[error("`{0}` is not a supported environment, use either `{DEV_ENV_NAME}` or `{PROD_ENV_NAME}`")]
pub struct UnknownEnvironment(String);

/// Runtime environment, which selects the configuration file layered over `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development against the in-memory store.
    #[default]
    Dev,
    /// Loading into a real cluster.
    Prod,
}

impl Environment {
    /// Reads the environment from `APP_ENVIRONMENT`, defaulting to [`Environment::Dev`].
    pub fn load() -> Result<Environment, UnknownEnvironment> {
        match std::env::var(APP_ENVIRONMENT_ENV_NAME) {
            Ok(name) => name.parse(),
            Err(_) => Ok(Environment::default()),
        }
    }

    /// Returns the environment name, which is also the stem of its configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => DEV_ENV_NAME,
            Environment::Prod => PROD_ENV_NAME,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    /// Parses an environment name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            DEV_ENV_NAME => Ok(Environment::Dev),
            PROD_ENV_NAME => Ok(Environment::Prod),
            _ => Err(UnknownEnvironment(s.to_owned())),
        }
    }
}
