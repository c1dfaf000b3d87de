//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading `cadence.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file where one was expected.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value serde accepts but Cadence does not.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for cadence_plugin::PluginError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ConfigError::NotFound(PathBuf::from("/repo/cadence.toml"));
        assert_eq!(err.to_string(), "configuration file not found: /repo/cadence.toml");
    }

    #[test]
    fn test_parse_display_names_file() {
        let source = toml::from_str::<toml::Table>("[[[").unwrap_err();
        let err = ConfigError::Parse {
            path: PathBuf::from("cadence.toml"),
            source,
        };
        assert!(err.to_string().starts_with("failed to parse cadence.toml:"));
    }

    #[test]
    fn test_into_plugin_error() {
        let err: cadence_plugin::PluginError = ConfigError::Invalid("bad".to_string()).into();
        assert_eq!(err.kind(), cadence_plugin::ErrorKind::Configuration);
        assert_eq!(err.to_string(), "plugin configuration error: invalid configuration: bad");
    }
}
