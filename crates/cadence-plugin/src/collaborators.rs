//! Narrow interfaces to the outside world.
//!
//! The engine and plugins talk to the file system and to version control only
//! through these traits, so tests can swap in in-memory fakes.

use std::fs;
use std::path::{Path, PathBuf};

use cadence_commit::RawCommit;

use crate::{PluginError, PluginResult};

/// Read access to the commit history.
pub trait CommitLog {
    /// Returns the commits reachable from HEAD but not from `since`,
    /// oldest first. `None` returns the whole history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read.
    fn commits_since(&self, since: Option<&str>) -> PluginResult<Vec<RawCommit>>;

    /// Returns the nearest tag reachable from HEAD whose name matches the
    /// glob `pattern`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the tags cannot be read.
    fn last_tag_matching(&self, pattern: &str) -> PluginResult<Option<String>>;

    /// Returns the checked-out branch, `None` when HEAD is detached.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be resolved.
    fn current_branch(&self) -> PluginResult<Option<String>>;
}

/// File access for artifact mutation.
pub trait FileSystem: Send + Sync {
    /// Reads a file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Filesystem`] if the file cannot be read.
    fn read_file(&self, path: &Path) -> PluginResult<String>;

    /// Replaces a file's contents.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Filesystem`] if the file cannot be written.
    fn write_file(&self, path: &Path, contents: &str) -> PluginResult<()>;

    /// Returns true if the file exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by the local disk. Relative paths resolve against
/// `root`.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    /// Creates a file system rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn read_file(&self, path: &Path) -> PluginResult<String> {
        fs::read_to_string(self.resolve(path)).map_err(|e| PluginError::filesystem(path, e))
    }

    fn write_file(&self, path: &Path, contents: &str) -> PluginResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| PluginError::filesystem(path, e))?;
        }
        fs::write(full, contents).map_err(|e| PluginError::filesystem(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}

/// Write access to version control.
pub trait VersionControl: Send + Sync {
    /// Returns true if a tag with this name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the tags cannot be read.
    fn tag_exists(&self, name: &str) -> PluginResult<bool>;

    /// Creates an annotated tag on HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be created.
    fn create_tag(&self, name: &str, message: &str) -> PluginResult<()>;

    /// Pushes refspecs to a remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote rejects any ref or cannot be reached.
    fn push(&self, remote: &str, refspecs: &[String]) -> PluginResult<()>;

    /// Stages `paths` and commits them on HEAD. Returns the new commit id.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or committing fails.
    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> PluginResult<String>;
}
