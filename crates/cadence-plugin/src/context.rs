//! Execution context shared by release plugins.
//!
//! The context is built once, before VERIFY, and is read-only from then on.
//! The only thing plugins can add to during a run is the [`ReleaseLog`],
//! which is append-only and scoped per plugin and phase.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cadence_commit::ParsedCommit;
use semver::Version;
use serde::Serialize;
use serde_json::Value;

use crate::{Phase, ReleaseImpact, TemplateValues};

/// The release being made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextRelease {
    /// The version being released.
    pub version: Version,

    /// The last released version, `None` on first release.
    pub previous_version: Option<Version>,

    /// The impact that produced `version`.
    pub impact: ReleaseImpact,

    /// The tag name for `version`.
    pub tag: String,

    /// Rendered release notes.
    pub notes: String,

    /// The branch being released.
    pub branch: String,
}

impl NextRelease {
    /// Creates a release description with no previous version, notes or branch.
    #[must_use]
    pub fn new(version: Version, impact: ReleaseImpact, tag: impl Into<String>) -> Self {
        Self {
            version,
            previous_version: None,
            impact,
            tag: tag.into(),
            notes: String::new(),
            branch: String::new(),
        }
    }

    /// Sets the previous version.
    #[must_use]
    pub fn with_previous_version(mut self, previous: Option<Version>) -> Self {
        self.previous_version = previous;
        self
    }

    /// Sets the release notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Sets the branch.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

/// Frozen state of one release run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    repo_path: PathBuf,
    dry_run: bool,
    next_release: NextRelease,
    commits: Vec<ParsedCommit>,
    options: HashMap<String, Value>,
}

impl ExecutionContext {
    /// Starts building a context.
    #[must_use]
    pub fn builder(repo_path: impl Into<PathBuf>, next_release: NextRelease) -> ExecutionContextBuilder {
        ExecutionContextBuilder {
            repo_path: repo_path.into(),
            dry_run: false,
            next_release,
            commits: Vec::new(),
            options: HashMap::new(),
        }
    }

    /// Path to the repository root.
    #[must_use]
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Whether this is a dry run.
    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// The release being made.
    #[must_use]
    pub fn next_release(&self) -> &NextRelease {
        &self.next_release
    }

    /// Parsed commits since the last release, oldest first.
    #[must_use]
    pub fn commits(&self) -> &[ParsedCommit] {
        &self.commits
    }

    /// Gets a run option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Values for template rendering.
    #[must_use]
    pub fn template_values(&self) -> TemplateValues {
        TemplateValues {
            version: self.next_release.version.to_string(),
            previous_version: self
                .next_release
                .previous_version
                .as_ref()
                .map(ToString::to_string),
            tag: self.next_release.tag.clone(),
            impact: self.next_release.impact.to_string(),
            dry_run: self.dry_run,
            branch: self.next_release.branch.clone(),
        }
    }
}

/// Builder for [`ExecutionContext`].
#[derive(Debug)]
pub struct ExecutionContextBuilder {
    repo_path: PathBuf,
    dry_run: bool,
    next_release: NextRelease,
    commits: Vec<ParsedCommit>,
    options: HashMap<String, Value>,
}

impl ExecutionContextBuilder {
    /// Sets the dry run flag.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the commits.
    #[must_use]
    pub fn commits(mut self, commits: Vec<ParsedCommit>) -> Self {
        self.commits = commits;
        self
    }

    /// Sets a run option.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Freezes the context.
    #[must_use]
    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            repo_path: self.repo_path,
            dry_run: self.dry_run,
            next_release: self.next_release,
            commits: self.commits,
            options: self.options,
        }
    }
}

/// One line of the release log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// The plugin that wrote the entry.
    pub plugin: String,
    /// The phase it was written in.
    pub phase: Phase,
    /// What happened.
    pub message: String,
    /// A file the plugin produced or changed, if any.
    pub artifact: Option<PathBuf>,
}

/// Append-only record of what plugins did during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseLog {
    entries: Vec<LogEntry>,
}

impl ReleaseLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that writes entries for `plugin` in `phase`.
    pub fn step(&mut self, plugin: impl Into<String>, phase: Phase) -> StepLog<'_> {
        StepLog {
            log: self,
            plugin: plugin.into(),
            phase,
        }
    }

    /// All entries, in the order they were written.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Files recorded as artifacts, in the order they were written.
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().filter_map(|e| e.artifact.as_deref())
    }
}

/// A [`ReleaseLog`] handle scoped to one plugin and phase.
#[derive(Debug)]
pub struct StepLog<'a> {
    log: &'a mut ReleaseLog,
    plugin: String,
    phase: Phase,
}

impl StepLog<'_> {
    /// Records a message.
    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(plugin = %self.plugin, phase = %self.phase, "{message}");
        self.push(message, None);
    }

    /// Records a file the plugin produced or changed.
    pub fn artifact(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        let path = path.into();
        let message = message.into();
        tracing::debug!(plugin = %self.plugin, phase = %self.phase, path = %path.display(), "{message}");
        self.push(message, Some(path));
    }

    /// The plugin this handle writes for.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// The phase this handle writes for.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn push(&mut self, message: String, artifact: Option<PathBuf>) {
        self.log.entries.push(LogEntry {
            plugin: self.plugin.clone(),
            phase: self.phase,
            message,
            artifact,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_context() -> ExecutionContext {
        let release = NextRelease::new(Version::new(1, 1, 0), ReleaseImpact::Minor, "v1.1.0")
            .with_previous_version(Some(Version::new(1, 0, 0)))
            .with_notes("## 1.1.0")
            .with_branch("main");
        ExecutionContext::builder("/tmp/test-repo", release).build()
    }

    #[test]
    fn test_builder_defaults() {
        let ctx = create_context();
        assert_eq!(ctx.repo_path().to_string_lossy(), "/tmp/test-repo");
        assert_eq!(ctx.next_release().version, Version::new(1, 1, 0));
        assert_eq!(
            ctx.next_release().previous_version,
            Some(Version::new(1, 0, 0))
        );
        assert!(ctx.commits().is_empty());
        assert!(!ctx.dry_run());
        assert!(ctx.option("key").is_none());
    }

    #[test]
    fn test_builder_with_options() {
        let release = NextRelease::new(Version::new(0, 1, 0), ReleaseImpact::Minor, "v0.1.0");
        let ctx = ExecutionContext::builder("/repo", release)
            .dry_run(true)
            .option("skip_publish_plugins", json!(true))
            .commits(vec![ParsedCommit::builder("abc", "feat").build()])
            .build();

        assert!(ctx.dry_run());
        assert_eq!(ctx.option("skip_publish_plugins"), Some(&json!(true)));
        assert_eq!(ctx.commits().len(), 1);
    }

    #[test]
    fn test_template_values() {
        let values = create_context().template_values();
        assert_eq!(values.version, "1.1.0");
        assert_eq!(values.previous_version.as_deref(), Some("1.0.0"));
        assert_eq!(values.tag, "v1.1.0");
        assert_eq!(values.impact, "minor");
        assert_eq!(values.branch, "main");
        assert!(!values.dry_run);
    }

    #[test]
    fn test_template_values_first_release() {
        let release = NextRelease::new(Version::new(1, 0, 0), ReleaseImpact::Major, "v1.0.0");
        let ctx = ExecutionContext::builder("/repo", release).build();
        assert!(ctx.template_values().previous_version.is_none());
    }

    #[test]
    fn test_release_log_scoping() {
        let mut log = ReleaseLog::new();
        {
            let mut step = log.step("changelog", Phase::Prepare);
            assert_eq!(step.plugin(), "changelog");
            assert_eq!(step.phase(), Phase::Prepare);
            step.artifact("CHANGELOG.md", "prepended release notes");
        }
        log.step("github", Phase::Publish).note("created release");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].plugin, "changelog");
        assert_eq!(entries[0].artifact, Some(PathBuf::from("CHANGELOG.md")));
        assert_eq!(entries[1].phase, Phase::Publish);
        assert!(entries[1].artifact.is_none());

        let artifacts: Vec<_> = log.artifacts().collect();
        assert_eq!(artifacts, vec![Path::new("CHANGELOG.md")]);
    }
}
