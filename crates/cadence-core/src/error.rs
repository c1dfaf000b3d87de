//! Core error types.

use cadence_config::ConfigError;
use cadence_plugin::{ErrorKind, PluginError};
use thiserror::Error;

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad rule mapping, template or pattern.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The last release tag does not carry a SemVer version.
    #[error("tag `{tag}` does not hold a valid version: {source}")]
    VersionParse {
        /// The offending tag or version text.
        tag: String,
        /// The parse failure.
        #[source]
        source: semver::Error,
    },

    /// A collaborator (commit log, parser, file system) failed.
    #[error(transparent)]
    Collaborator(#[from] PluginError),

    /// Configuration file error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Classifies the error for reporting.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::Config(_) => ErrorKind::Configuration,
            Self::VersionParse { .. } => ErrorKind::VersionParse,
            Self::Collaborator(err) => err.kind(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
