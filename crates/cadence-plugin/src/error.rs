//! Plugin error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::TemplateError;

/// Errors raised by plugin operations and by the collaborators they call.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Configuration error.
    #[error("plugin configuration error: {0}")]
    Config(String),

    /// Reading or writing a file failed.
    #[error("failed to access {}: {source}", .path.display())]
    Filesystem {
        /// The file involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A replacement did not hit the expected number of matches.
    #[error("{}: expected {expected} replacement(s), found {actual}", .file.display())]
    ReplacementMismatch {
        /// The file whose count did not match.
        file: PathBuf,
        /// The configured count.
        expected: usize,
        /// The count actually found.
        actual: usize,
    },

    /// The hosting API rejected a request or could not be reached.
    #[error("remote API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    RemoteApi {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// Version control operation failed.
    #[error("version control error: {0}")]
    Vcs(String),

    /// External command exited unsuccessfully.
    #[error("command `{command}` failed ({status}): {stderr}")]
    Command {
        /// The command line that was run.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Plugin execution failed.
    #[error("plugin execution failed: {0}")]
    ExecutionFailed(String),
}

impl PluginError {
    /// Classifies the error for reporting.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::ReplacementMismatch { .. } => ErrorKind::ReplacementMismatch,
            Self::RemoteApi { .. } => ErrorKind::RemoteApi,
            Self::Vcs(_) | Self::Command { .. } | Self::ExecutionFailed(_) => {
                ErrorKind::PluginOperation
            }
        }
    }

    /// Builds a filesystem error for the given path.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<TemplateError> for PluginError {
    fn from(err: TemplateError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad rule mapping, template or plugin option.
    Configuration,
    /// The previous release tag is not SemVer.
    VersionParse,
    /// An artifact mutation count did not match.
    ReplacementMismatch,
    /// A plugin's verify, prepare or publish step failed.
    PluginOperation,
    /// File read or write failed.
    Filesystem,
    /// Hosting API call failed.
    RemoteApi,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::VersionParse => "version-parse",
            Self::ReplacementMismatch => "replacement-mismatch",
            Self::PluginOperation => "plugin-operation",
            Self::Filesystem => "filesystem",
            Self::RemoteApi => "remote-api",
        };
        f.write_str(name)
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
