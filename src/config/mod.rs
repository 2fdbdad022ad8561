//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

use std::path::Path;

use crate::common::error::ConfigError;

pub use parser::load_config_or_default;
pub use types::*;
pub use validate::validate_config;

/// Load the config file (if any), apply environment overrides and validate.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let config = load_config_or_default(path)?;
    let config = env::apply_env_overrides(config);
    validate_config(&config)?;
    Ok(config)
}
