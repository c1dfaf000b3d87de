//! Git repository wrapper.

use std::path::{Path, PathBuf};

use cadence_commit::RawCommit;
use cadence_plugin::PluginResult;
use cadence_plugin::collaborators::{CommitLog, VersionControl};
use chrono::{TimeZone, Utc};
use git2::{
    Cred, CredentialType, DescribeFormatOptions, DescribeOptions, ErrorClass, ErrorCode,
    PushOptions,
    RemoteCallbacks, Repository as Git2Repo, Signature, Sort,
};
use tracing::{debug, info};

use crate::{GitError, GitResult};

/// A Git repository wrapper.
pub struct Repository {
    inner: Git2Repo,
}

impl Repository {
    /// Opens a repository at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid Git repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner = Git2Repo::open(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Discovers the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner =
            Git2Repo::discover(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Returns the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.path())
    }

    /// Returns all tags in the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn tags(&self) -> GitResult<Vec<String>> {
        let tags = self.inner.tag_names(None)?;
        Ok(tags.iter().flatten().map(String::from).collect())
    }

    /// Returns commits reachable from HEAD and not from `tag`, oldest first.
    ///
    /// If tag is `None`, returns all commits. An unborn HEAD has no commits.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag does not exist or commits cannot be read.
    pub fn commits_since(&self, tag: Option<&str>) -> GitResult<Vec<RawCommit>> {
        if self.head_is_unborn()? {
            return Ok(Vec::new());
        }

        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push_head()?;

        if let Some(tag_name) = tag {
            let tagged = self
                .inner
                .find_reference(&format!("refs/tags/{tag_name}"))
                .and_then(|r| r.peel_to_commit())
                .map_err(|_| GitError::TagNotFound(tag_name.to_string()))?;
            revwalk.hide(tagged.id())?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.inner.find_commit(oid)?;

            let message = commit.message().unwrap_or("").to_string();
            let author = commit.author();
            let time = commit.time();

            commits.push(RawCommit::new(
                oid.to_string(),
                message,
                author.name().unwrap_or("Unknown"),
                author.email().unwrap_or(""),
                Utc.timestamp_opt(time.seconds(), 0)
                    .single()
                    .unwrap_or_else(Utc::now),
            ));
        }

        debug!(count = commits.len(), since = ?tag, "read commits");
        Ok(commits)
    }

    /// Returns the nearest tag reachable from HEAD whose name matches the
    /// glob `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn last_tag_matching(&self, pattern: &str) -> GitResult<Option<String>> {
        if self.head_is_unborn()? {
            return Ok(None);
        }

        let mut options = DescribeOptions::new();
        options.describe_tags().pattern(pattern);

        let describe = match self.inner.describe(&options) {
            Ok(describe) => describe,
            // libgit2 reports "no matching tag" as a generic describe error.
            Err(e) if e.code() == ErrorCode::NotFound || e.class() == ErrorClass::Describe => {
                debug!(pattern, "no tag matches");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        Ok(Some(describe.format(Some(&format))?))
    }

    /// Returns the checked-out branch name, `None` when HEAD is detached.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be read.
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        match self.inner.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(String::from)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.inner.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(String::from))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the URL of a remote, `None` if it is not configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote configuration cannot be read.
    pub fn remote_url(&self, name: &str) -> GitResult<Option<String>> {
        match self.inner.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns true if the tag exists.
    ///
    /// # Errors
    ///
    /// Returns an error if references cannot be read.
    pub fn tag_exists(&self, name: &str) -> GitResult<bool> {
        match self.inner.find_reference(&format!("refs/tags/{name}")) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates an annotated tag on HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be created.
    pub fn create_tag(&self, name: &str, message: &str) -> GitResult<()> {
        let head = self.inner.head()?;
        let commit = head.peel_to_commit()?;
        let sig = self.signature()?;

        self.inner
            .tag(name, commit.as_object(), &sig, message, false)?;

        info!(tag = name, commit = %commit.id(), "created tag");
        Ok(())
    }

    /// Stages the given paths and commits them on HEAD.
    ///
    /// Paths may be absolute or relative to the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is bare or the commit fails.
    pub fn commit_paths(&self, paths: &[PathBuf], message: &str) -> GitResult<String> {
        let workdir = self.inner.workdir().ok_or(GitError::Bare)?.to_path_buf();

        let mut index = self.inner.index()?;
        for path in paths {
            let relative = path.strip_prefix(&workdir).unwrap_or(path);
            index.add_path(relative)?;
        }
        index.write()?;

        let tree = self.inner.find_tree(index.write_tree()?)?;
        let sig = self.signature()?;
        let parent = if self.head_is_unborn()? {
            None
        } else {
            Some(self.inner.head()?.peel_to_commit()?)
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        info!(commit = %oid, files = paths.len(), "committed release artifacts");
        Ok(oid.to_string())
    }

    /// Pushes refspecs to the named remote.
    ///
    /// HTTPS remotes authenticate with `GIT_TOKEN` or `GITHUB_TOKEN` when set,
    /// otherwise through the configured credential helper. SSH remotes use
    /// the agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote is unreachable or rejects any ref.
    pub fn push(&self, remote: &str, refspecs: &[String]) -> GitResult<()> {
        let mut remote = self.inner.find_remote(remote)?;
        let config = self.inner.config()?;
        let token = std::env::var("GIT_TOKEN")
            .or_else(|_| std::env::var("GITHUB_TOKEN"))
            .ok();

        let mut rejected: Option<(String, String)> = None;
        {
            let mut attempts = 0;
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(|url, username, allowed| {
                attempts += 1;
                if attempts > 3 {
                    return Err(git2::Error::from_str("authentication failed"));
                }
                credentials(&config, token.as_deref(), url, username, allowed)
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejected.get_or_insert_with(|| (refname.to_string(), message.to_string()));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote.push(refspecs, Some(&mut options))?;
        }

        if let Some((refname, message)) = rejected {
            return Err(GitError::PushRejected { refname, message });
        }

        info!(remote = remote.name().unwrap_or(""), refs = ?refspecs, "pushed");
        Ok(())
    }

    fn head_is_unborn(&self) -> GitResult<bool> {
        match self.inner.head() {
            Ok(_) => Ok(false),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn signature(&self) -> GitResult<Signature<'static>> {
        match self.inner.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(_) => Ok(Signature::now("cadence", "cadence@localhost")?),
        }
    }
}

fn credentials(
    config: &git2::Config,
    token: Option<&str>,
    url: &str,
    username: Option<&str>,
    allowed: CredentialType,
) -> Result<Cred, git2::Error> {
    if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
        if let Some(token) = token {
            return Cred::userpass_plaintext("x-access-token", token);
        }
        return Cred::credential_helper(config, url, username);
    }
    if allowed.contains(CredentialType::SSH_KEY) {
        return Cred::ssh_key_from_agent(username.unwrap_or("git"));
    }
    if allowed.contains(CredentialType::DEFAULT) {
        return Cred::default();
    }
    Err(git2::Error::from_str("no supported credential type"))
}

impl CommitLog for Repository {
    fn commits_since(&self, since: Option<&str>) -> PluginResult<Vec<RawCommit>> {
        Ok(Self::commits_since(self, since)?)
    }

    fn last_tag_matching(&self, pattern: &str) -> PluginResult<Option<String>> {
        Ok(Self::last_tag_matching(self, pattern)?)
    }

    fn current_branch(&self) -> PluginResult<Option<String>> {
        Ok(Self::current_branch(self)?)
    }
}

/// [`VersionControl`] for the repository at `path`.
///
/// `git2::Repository` is not `Sync`, so the repository is reopened for each
/// operation.
#[derive(Debug, Clone)]
pub struct GitVersionControl {
    path: PathBuf,
}

impl GitVersionControl {
    /// Creates a handle for the repository at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> GitResult<Repository> {
        Repository::open(&self.path)
    }
}

impl VersionControl for GitVersionControl {
    fn tag_exists(&self, name: &str) -> PluginResult<bool> {
        Ok(self.open()?.tag_exists(name)?)
    }

    fn create_tag(&self, name: &str, message: &str) -> PluginResult<()> {
        Ok(self.open()?.create_tag(name, message)?)
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> PluginResult<()> {
        Ok(self.open()?.push(remote, refspecs)?)
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> PluginResult<String> {
        Ok(self.open()?.commit_paths(paths, message)?)
    }
}
