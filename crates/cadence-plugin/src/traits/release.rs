//! Release plugin trait.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Plugin;
use crate::{ExecutionContext, PluginResult, StepLog};

/// A phase of the release pipeline that invokes plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Checks preconditions. Must not mutate anything.
    Verify,
    /// Mutates local artifacts.
    Prepare,
    /// Performs remote, externally visible side effects.
    Publish,
}

impl Phase {
    /// Phases in execution order.
    pub const ORDER: [Self; 3] = [Self::Verify, Self::Prepare, Self::Publish];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verify => write!(f, "verify"),
            Self::Prepare => write!(f, "prepare"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// A plugin taking part in a release.
///
/// Every operation is optional. Operations receive the frozen execution
/// context and a log handle scoped to the current plugin and phase; they
/// never see or modify each other's state.
pub trait ReleasePlugin: Plugin {
    /// Checks that the release can proceed.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition does not hold.
    fn verify(&self, _ctx: &ExecutionContext, _log: &mut StepLog<'_>) -> PluginResult<()> {
        Ok(())
    }

    /// Mutates local artifacts for the release.
    ///
    /// # Errors
    ///
    /// Returns an error if an artifact cannot be updated.
    fn prepare(&self, _ctx: &ExecutionContext, _log: &mut StepLog<'_>) -> PluginResult<()> {
        Ok(())
    }

    /// Publishes the release. Never called on a dry run.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote side effect fails.
    fn publish(&self, _ctx: &ExecutionContext, _log: &mut StepLog<'_>) -> PluginResult<()> {
        Ok(())
    }

    /// Runs the operation for the given phase.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    fn run_phase(
        &self,
        phase: Phase,
        ctx: &ExecutionContext,
        log: &mut StepLog<'_>,
    ) -> PluginResult<()> {
        match phase {
            Phase::Verify => self.verify(ctx, log),
            Phase::Prepare => self.prepare(ctx, log),
            Phase::Publish => self.publish(ctx, log),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NextRelease, PluginError, ReleaseImpact, ReleaseLog};
    use semver::Version;

    struct NoopPlugin;

    impl Plugin for NoopPlugin {
        fn name(&self) -> &'static str {
            "noop"
        }
        fn version(&self) -> &'static str {
            "0.1.0"
        }
    }

    impl ReleasePlugin for NoopPlugin {}

    struct FailingPrepare;

    impl Plugin for FailingPrepare {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn version(&self) -> &'static str {
            "0.1.0"
        }
    }

    impl ReleasePlugin for FailingPrepare {
        fn prepare(&self, _ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
            log.note("about to fail");
            Err(PluginError::ExecutionFailed("boom".to_string()))
        }
    }

    fn context() -> ExecutionContext {
        let release = NextRelease::new(Version::new(1, 0, 0), ReleaseImpact::Major, "v1.0.0");
        ExecutionContext::builder("/tmp/repo", release).build()
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Verify.to_string(), "verify");
        assert_eq!(Phase::Prepare.to_string(), "prepare");
        assert_eq!(Phase::Publish.to_string(), "publish");
    }

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::ORDER, [Phase::Verify, Phase::Prepare, Phase::Publish]);
    }

    #[test]
    fn test_default_operations_are_noops() {
        let ctx = context();
        let mut log = ReleaseLog::new();
        for phase in Phase::ORDER {
            let mut step = log.step("noop", phase);
            assert!(NoopPlugin.run_phase(phase, &ctx, &mut step).is_ok());
        }
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_run_phase_dispatches() {
        let ctx = context();
        let mut log = ReleaseLog::new();

        let mut step = log.step("failing", Phase::Verify);
        assert!(FailingPrepare.run_phase(Phase::Verify, &ctx, &mut step).is_ok());

        let mut step = log.step("failing", Phase::Prepare);
        assert!(FailingPrepare.run_phase(Phase::Prepare, &ctx, &mut step).is_err());

        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].phase, Phase::Prepare);
    }
}
