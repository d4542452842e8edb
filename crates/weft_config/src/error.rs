//! Error types for configuration loading and validation.

use weft_common::FabricError;

/// Errors that can occur when loading or validating a `weft.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),
}

impl From<ConfigError> for FabricError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::IoError(source) => FabricError::io(crate::CONFIG_FILE_NAME, source),
            other => FabricError::structural(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("fabric.name".to_string());
        assert_eq!(format!("{err}"), "missing required field: fabric.name");
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse configuration: expected '=' at line 3"
        );
    }

    #[test]
    fn converts_to_fabric_error() {
        let err: FabricError = ConfigError::MissingField("fabric.device".to_string()).into();
        assert!(matches!(err, FabricError::Structural(_)));

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FabricError = ConfigError::IoError(io).into();
        assert!(matches!(err, FabricError::Io { .. }));
    }
}
