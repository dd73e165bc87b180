// Configuration for the ledger and the oracle coordinator.
// Layering: built-in defaults, then an optional TOML file, then FLIGHTSURETY__* environment variables.

pub mod presets;
pub mod validation;

use std::path::Path;

use log::{debug, info};
use thiserror::Error;

pub use presets::{AdminConfig, CoordinatorConfig, FeedMode, ProtocolParams, SuretyConfig};
pub use validation::{ConfigValidator, ValidationResult};

use crate::errors::SuretyError;

/// Prefix for environment overrides, e.g. `FLIGHTSURETY__PROTOCOL__QUORUM_COUNT=5`.
pub const ENV_PREFIX: &str = "FLIGHTSURETY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for SuretyError {
    fn from(err: ConfigError) -> Self {
        SuretyError::Config(err.to_string())
    }
}

impl SuretyConfig {
    /// Loads and validates configuration on top of the `local()` preset.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_base(&SuretyConfig::local(), path)
    }

    /// Loads `base`, then the optional file, then the environment. Validation warnings are logged.
    pub fn load_with_base(base: &SuretyConfig, path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(base)?);

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: SuretyConfig = builder.build()?.try_deserialize()?;
        let warnings = ConfigValidator::validate(&loaded).into_result()?;
        debug!("Configuration loaded with {} warning(s)", warnings.len());
        Ok(loaded)
    }

    /// Parses a TOML document on top of the defaults, without environment overrides.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let loaded: SuretyConfig = config::Config::builder()
            .add_source(config::Config::try_from(&SuretyConfig::local())?)
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        ConfigValidator::validate(&loaded).into_result()?;
        Ok(loaded)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
