//! Release orchestration.

use std::fmt;
use std::path::{Path, PathBuf};

use cadence_commit::ParsedCommit;
use cadence_config::Config;
use cadence_plugin::collaborators::CommitLog;
use cadence_plugin::{CommitParser, ExecutionContext, NextRelease};
use chrono::{Local, NaiveDate};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::notes::{NotesRenderer, RenderInfo};
use crate::pipeline::{Pipeline, PipelineFailure, PipelineOutcome, RunReport};
use crate::resolver::{ReleaseDecision, VersionResolver};
use crate::tag::TagFormat;
use crate::{CoreError, CoreResult};

/// Why nothing is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoReleaseReason {
    /// The current branch matches none of the configured patterns. `None`
    /// when HEAD is detached.
    BranchNotConfigured {
        /// The current branch.
        branch: Option<String>,
    },
    /// No commits since the last release.
    NoCommits,
    /// Commits exist but none has a release impact.
    NoReleasableCommits,
}

impl fmt::Display for NoReleaseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BranchNotConfigured { branch: Some(branch) } => {
                write!(f, "branch `{branch}` is not configured for releases")
            }
            Self::BranchNotConfigured { branch: None } => {
                write!(f, "HEAD is detached; releases run from a configured branch")
            }
            Self::NoCommits => write!(f, "no commits since the last release"),
            Self::NoReleasableCommits => {
                write!(f, "no commits since the last release warrant a release")
            }
        }
    }
}

/// A release that would happen.
#[derive(Debug, Clone)]
pub struct PlannedRelease {
    /// The resolver's decision.
    pub decision: ReleaseDecision,
    /// Version, tag and notes.
    pub release: NextRelease,
    /// Parsed commits since the last release, oldest first.
    pub commits: Vec<ParsedCommit>,
}

/// What the next release would be, computed without side effects.
#[derive(Debug, Clone)]
pub enum Plan {
    /// Nothing to release.
    NoRelease(NoReleaseReason),
    /// A release is due.
    Release(Box<PlannedRelease>),
}

/// Result of a release run.
#[derive(Debug)]
pub enum ReleaseOutcome {
    /// Nothing was released.
    NoRelease(NoReleaseReason),
    /// Every phase finished.
    Released {
        /// What was released.
        release: Box<NextRelease>,
        /// What the plugins did.
        report: RunReport,
    },
    /// A plugin failed.
    Failed {
        /// What was being released.
        release: Box<NextRelease>,
        /// Where and why it stopped.
        failure: Box<PipelineFailure>,
    },
}

/// Decides on and runs releases.
pub struct ReleaseManager {
    commit_log: Box<dyn CommitLog>,
    parser: Box<dyn CommitParser>,
    resolver: VersionResolver,
    renderer: NotesRenderer,
    tag_format: TagFormat,
    branches: Vec<glob::Pattern>,
    repo_path: PathBuf,
    dry_run: bool,
    date: NaiveDate,
    options: Map<String, Value>,
}

impl ReleaseManager {
    /// Creates a manager releasing from `main` with `v${version}` tags and
    /// default rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the default tag format or branch pattern does
    /// not parse.
    pub fn new(
        repo_path: impl Into<PathBuf>,
        commit_log: Box<dyn CommitLog>,
        parser: Box<dyn CommitParser>,
    ) -> CoreResult<Self> {
        Self::from_config(&Config::default(), repo_path, commit_log, parser)
    }

    /// Creates a manager from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] for an invalid tag format,
    /// branch pattern, release rule or notes type.
    pub fn from_config(
        config: &Config,
        repo_path: impl Into<PathBuf>,
        commit_log: Box<dyn CommitLog>,
        parser: Box<dyn CommitParser>,
    ) -> CoreResult<Self> {
        let branches = config
            .branches
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| {
                    CoreError::Configuration(format!("branch pattern `{pattern}`: {e}"))
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            commit_log,
            parser,
            resolver: VersionResolver::from_config(config)?,
            renderer: NotesRenderer::from_config(&config.notes)?,
            tag_format: TagFormat::parse(&config.tag_format)?,
            branches,
            repo_path: repo_path.into(),
            dry_run: config.dry_run,
            date: Local::now().date_naive(),
            options: run_options(config),
        })
    }

    /// Stops runs after prepare.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the release date written to the notes.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Sets the repository URL used for notes links, unless one is
    /// already configured.
    #[must_use]
    pub fn with_repository_url(mut self, url: Option<String>) -> Self {
        if self.renderer.repository_url().is_none() {
            self.renderer = self.renderer.with_repository_url(url);
        }
        self
    }

    /// The repository root.
    #[must_use]
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Whether runs stop after prepare.
    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// The tag format in use.
    #[must_use]
    pub fn tag_format(&self) -> &TagFormat {
        &self.tag_format
    }

    /// Computes the next release without side effects.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit log fails or the last release tag does
    /// not hold a valid version.
    pub fn plan(&self) -> CoreResult<Plan> {
        let branch = match self.commit_log.current_branch()? {
            Some(branch) if self.branch_allowed(&branch) => branch,
            other => {
                info!(branch = ?other, "branch not configured for releases");
                return Ok(Plan::NoRelease(NoReleaseReason::BranchNotConfigured {
                    branch: other,
                }));
            }
        };

        let last_tag = self.commit_log.last_tag_matching(&self.tag_format.glob())?;
        let previous = last_tag
            .as_deref()
            .map(|tag| self.tag_format.version_of(tag))
            .transpose()?;
        debug!(?last_tag, ?previous, "found last release");

        let raw = self.commit_log.commits_since(last_tag.as_deref())?;
        if raw.is_empty() {
            info!("no commits since the last release");
            return Ok(Plan::NoRelease(NoReleaseReason::NoCommits));
        }
        info!(count = raw.len(), "found commits since last release");

        let commits = self.parser.parse_all(&raw);
        debug!(
            parser = self.parser.name(),
            unparsed = commits.iter().filter(|c| !c.is_parsed()).count(),
            "parsed commits"
        );

        let decision = self.resolver.decide(&commits, previous);
        let Some(version) = decision.next_version.clone() else {
            info!(impact = %decision.impact, "no release warranted");
            return Ok(Plan::NoRelease(NoReleaseReason::NoReleasableCommits));
        };

        let tag = self.tag_format.tag_for(&version);
        let info = RenderInfo::new(version.clone(), &tag, self.date).with_previous_tag(last_tag);
        let notes = self.renderer.render(&commits, &info);
        info!(%version, %tag, impact = %decision.impact, "next release");

        let release = NextRelease::new(version, decision.impact, tag)
            .with_previous_version(decision.previous_version.clone())
            .with_notes(notes)
            .with_branch(branch);

        Ok(Plan::Release(Box::new(PlannedRelease {
            decision,
            release,
            commits,
        })))
    }

    /// Plans the release and runs the pipeline for it.
    ///
    /// # Errors
    ///
    /// Returns an error if planning fails. Plugin failures are reported as
    /// [`ReleaseOutcome::Failed`].
    pub fn run(&self, pipeline: &Pipeline) -> CoreResult<ReleaseOutcome> {
        let planned = match self.plan()? {
            Plan::NoRelease(reason) => return Ok(ReleaseOutcome::NoRelease(reason)),
            Plan::Release(planned) => *planned,
        };

        let mut builder = ExecutionContext::builder(&self.repo_path, planned.release.clone())
            .dry_run(self.dry_run)
            .commits(planned.commits);
        for (key, value) in &self.options {
            builder = builder.option(key.clone(), value.clone());
        }
        let ctx = builder
            .option("dry_run", Value::Bool(self.dry_run))
            .option("repository_url", json!(self.renderer.repository_url()))
            .build();

        info!(
            version = %planned.release.version,
            dry_run = self.dry_run,
            plugins = pipeline.plugins().len(),
            "starting release"
        );

        let release = Box::new(planned.release);
        Ok(match pipeline.run(&ctx) {
            PipelineOutcome::Done(report) => {
                info!(version = %release.version, "release completed");
                ReleaseOutcome::Released { release, report }
            }
            PipelineOutcome::Failed(failure) => ReleaseOutcome::Failed {
                release,
                failure: Box::new(failure),
            },
        })
    }

    fn branch_allowed(&self, branch: &str) -> bool {
        self.branches.iter().any(|pattern| pattern.matches(branch))
    }
}

/// Global settings exposed to plugins as run options.
fn run_options(config: &Config) -> Map<String, Value> {
    let mut options = Map::new();
    options.insert("branches".to_string(), json!(config.branches));
    options.insert("tag_format".to_string(), json!(config.tag_format));
    options.insert(
        "initial_version".to_string(),
        json!(config.initial_version.to_string()),
    );
    options
}
