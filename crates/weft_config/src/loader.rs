//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::FabricConfig;
use std::path::Path;

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILE_NAME: &str = "weft.toml";

/// Loads and validates a `weft.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<FabricConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `weft.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<FabricConfig, ConfigError> {
    let config: FabricConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &FabricConfig) -> Result<(), ConfigError> {
    if config.fabric.name.is_empty() {
        return Err(ConfigError::MissingField("fabric.name".to_string()));
    }
    if config.fabric.device.is_empty() {
        return Err(ConfigError::MissingField("fabric.device".to_string()));
    }
    if config.output.sdc_dir.is_empty() {
        return Err(ConfigError::MissingField("output.sdc_dir".to_string()));
    }
    Ok(())
}
