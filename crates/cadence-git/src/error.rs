//! Git error types.

use std::path::PathBuf;

use cadence_plugin::PluginError;
use thiserror::Error;

/// Git-related errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository.
    #[error("not a git repository: {0}")]
    NotARepo(PathBuf),

    /// Tag not found.
    #[error("tag not found: {0}")]
    TagNotFound(String),

    /// The repository has no working directory.
    #[error("repository has no working directory")]
    Bare,

    /// The remote refused a pushed ref.
    #[error("push of {refname} rejected: {message}")]
    PushRejected {
        /// The rejected ref.
        refname: String,
        /// The remote's reason.
        message: String,
    },

    /// Git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

impl From<GitError> for PluginError {
    fn from(err: GitError) -> Self {
        Self::Vcs(err.to_string())
    }
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_plugin::ErrorKind;

    #[test]
    fn test_not_a_repo_display() {
        let err = GitError::NotARepo(PathBuf::from("/tmp/not-git"));
        assert_eq!(err.to_string(), "not a git repository: /tmp/not-git");
    }

    #[test]
    fn test_tag_not_found_display() {
        let err = GitError::TagNotFound("v1.0.0".to_string());
        assert_eq!(err.to_string(), "tag not found: v1.0.0");
    }

    #[test]
    fn test_push_rejected_display() {
        let err = GitError::PushRejected {
            refname: "refs/heads/main".to_string(),
            message: "non-fast-forward".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "push of refs/heads/main rejected: non-fast-forward"
        );
    }

    #[test]
    fn test_into_plugin_error() {
        let err: PluginError = GitError::Bare.into();
        assert_eq!(err.kind(), ErrorKind::PluginOperation);
        assert_eq!(
            err.to_string(),
            "version control error: repository has no working directory"
        );
    }
}
