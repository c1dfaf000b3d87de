//! Phased plugin execution.
//!
//! Every plugin runs verify, then every plugin runs prepare, then every
//! plugin runs publish. The first failure stops the run. Dry runs stop after
//! prepare.

use std::fmt;

use cadence_plugin::{ErrorKind, ExecutionContext, Phase, PluginError, ReleaseLog, ReleasePlugin};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

/// Where a run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// Checking preconditions.
    Verify,
    /// Mutating local state.
    Prepare,
    /// Performing external side effects.
    Publish,
    /// Finished successfully.
    Done,
    /// Stopped on a failure.
    Failed,
}

impl From<Phase> for PipelineState {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Verify => Self::Verify,
            Phase::Prepare => Self::Prepare,
            Phase::Publish => Self::Publish,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Verify => "verify",
            Self::Prepare => "prepare",
            Self::Publish => "publish",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A plugin step that finished successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedStep {
    /// Plugin name.
    pub plugin: String,
    /// Phase the step ran in.
    pub phase: Phase,
}

/// What a successful run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Steps in the order they finished.
    pub completed: Vec<CompletedStep>,
    /// Everything plugins logged.
    pub log: ReleaseLog,
    /// False for dry runs.
    pub published: bool,
}

/// How much a failure left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing was changed.
    RetrySafe,
    /// Local files may have changed; nothing left the machine.
    CleanWorkspace,
    /// Some external side effects happened.
    PartialPublish,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::RetrySafe => "no changes were made; the release can be retried",
            Self::CleanWorkspace => {
                "local files may have changed; clean the working tree before retrying"
            }
            Self::PartialPublish => {
                "the release was partially published; inspect the completed steps before retrying"
            }
        };
        f.write_str(text)
    }
}

/// A run that stopped on a plugin failure.
#[derive(Debug, Error)]
#[error("{phase} failed in plugin `{plugin}` ({kind}): {error}", kind = .error.kind())]
pub struct PipelineFailure {
    /// Phase that failed.
    pub phase: Phase,
    /// Plugin that failed.
    pub plugin: String,
    /// The plugin's error.
    #[source]
    pub error: PluginError,
    /// Steps that finished before the failure.
    pub completed: Vec<CompletedStep>,
    /// Everything plugins logged before the failure.
    pub log: ReleaseLog,
}

impl PipelineFailure {
    /// Machine-readable classification of the underlying error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// How much state the failure left behind.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self.phase {
            Phase::Verify => Severity::RetrySafe,
            Phase::Prepare => Severity::CleanWorkspace,
            Phase::Publish if self.published_any() => Severity::PartialPublish,
            Phase::Publish => Severity::CleanWorkspace,
        }
    }

    /// Publish steps that finished before the failure.
    pub fn completed_publishes(&self) -> impl Iterator<Item = &CompletedStep> {
        self.completed.iter().filter(|s| s.phase == Phase::Publish)
    }

    fn published_any(&self) -> bool {
        self.completed_publishes().next().is_some()
    }
}

/// Result of running a pipeline.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every phase finished.
    Done(RunReport),
    /// A plugin failed.
    Failed(PipelineFailure),
}

impl PipelineOutcome {
    /// Returns the final state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        match self {
            Self::Done(_) => PipelineState::Done,
            Self::Failed(_) => PipelineState::Failed,
        }
    }
}

/// Ordered release plugins.
#[derive(Default)]
pub struct Pipeline {
    plugins: Vec<Box<dyn ReleasePlugin>>,
    publish_only: Option<Vec<String>>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin.
    #[must_use]
    pub fn with_plugin(mut self, plugin: Box<dyn ReleasePlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Restricts the publish phase to the named plugins. The others still
    /// verify and prepare.
    #[must_use]
    pub fn with_publish_only(mut self, plugins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.publish_only = Some(plugins.into_iter().map(Into::into).collect());
        self
    }

    /// Plugins in execution order.
    #[must_use]
    pub fn plugins(&self) -> &[Box<dyn ReleasePlugin>] {
        &self.plugins
    }

    /// Runs every phase in order and stops at the first failure.
    pub fn run(&self, ctx: &ExecutionContext) -> PipelineOutcome {
        let mut completed = Vec::new();
        let mut log = ReleaseLog::new();

        for phase in Phase::ORDER {
            if phase == Phase::Publish && ctx.dry_run() {
                info!("dry run, skipping publish");
                break;
            }

            info!(state = %PipelineState::from(phase), "entering phase");
            for plugin in &self.plugins {
                if !self.runs(plugin.as_ref(), phase) {
                    debug!(plugin = plugin.name(), %phase, "skipped");
                    continue;
                }

                debug!(plugin = plugin.name(), %phase, "running");
                let result = {
                    let mut step = log.step(plugin.name(), phase);
                    plugin.run_phase(phase, ctx, &mut step)
                };

                if let Err(err) = result {
                    error!(plugin = plugin.name(), %phase, kind = %err.kind(), "{err}");
                    info!(state = %PipelineState::Failed, "pipeline stopped");
                    return PipelineOutcome::Failed(PipelineFailure {
                        phase,
                        plugin: plugin.name().to_string(),
                        error: err,
                        completed,
                        log,
                    });
                }

                completed.push(CompletedStep {
                    plugin: plugin.name().to_string(),
                    phase,
                });
            }
        }

        info!(state = %PipelineState::Done, "pipeline finished");
        PipelineOutcome::Done(RunReport {
            completed,
            log,
            published: !ctx.dry_run(),
        })
    }

    fn runs(&self, plugin: &dyn ReleasePlugin, phase: Phase) -> bool {
        match (&self.publish_only, phase) {
            (Some(allowed), Phase::Publish) => allowed.iter().any(|name| name == plugin.name()),
            _ => true,
        }
    }
}
