//! Shell command plugin.
//!
//! Runs a configured command in each phase through `sh -c`, from the
//! repository root. Commands are templates rendered with the release values.
//! The release is also exported as `CADENCE_*` environment variables.

use std::process::{Command, Stdio};

use cadence_config::ExecPluginConfig;
use cadence_plugin::{
    ExecutionContext, Phase, Plugin, PluginError, PluginResult, ReleasePlugin, StepLog, Template,
};
use tracing::{debug, info};

/// Runs shell commands.
#[derive(Debug, Clone, Default)]
pub struct ExecPlugin {
    verify_cmd: Option<Template>,
    prepare_cmd: Option<Template>,
    publish_cmd: Option<Template>,
}

impl ExecPlugin {
    /// Creates a plugin with no commands.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a plugin from its configuration.
    #[must_use]
    pub fn from_config(config: &ExecPluginConfig) -> Self {
        Self {
            verify_cmd: config.verify_cmd.clone(),
            prepare_cmd: config.prepare_cmd.clone(),
            publish_cmd: config.publish_cmd.clone(),
        }
    }

    /// Sets the command for a phase.
    #[must_use]
    pub fn with_command(mut self, phase: Phase, command: Template) -> Self {
        *self.slot(phase) = Some(command);
        self
    }

    /// The command configured for a phase.
    #[must_use]
    pub fn command(&self, phase: Phase) -> Option<&Template> {
        match phase {
            Phase::Verify => self.verify_cmd.as_ref(),
            Phase::Prepare => self.prepare_cmd.as_ref(),
            Phase::Publish => self.publish_cmd.as_ref(),
        }
    }

    fn slot(&mut self, phase: Phase) -> &mut Option<Template> {
        match phase {
            Phase::Verify => &mut self.verify_cmd,
            Phase::Prepare => &mut self.prepare_cmd,
            Phase::Publish => &mut self.publish_cmd,
        }
    }

    fn run(&self, phase: Phase, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        let Some(template) = self.command(phase) else {
            return Ok(());
        };
        let values = ctx.template_values();
        let command = template.render(&values);
        info!(%phase, %command, "running command");

        let release = ctx.next_release();
        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(ctx.repo_path())
            .env("CADENCE_VERSION", &values.version)
            .env("CADENCE_TAG", &release.tag)
            .env("CADENCE_IMPACT", &values.impact)
            .env("CADENCE_DRY_RUN", values.dry_run.to_string())
            .env("CADENCE_NOTES", &release.notes)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| PluginError::ExecutionFailed(format!("failed to spawn `{command}`: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(%command, status = %output.status, "command finished");

        if !output.status.success() {
            return Err(PluginError::Command {
                command,
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let stdout = stdout.trim();
        if stdout.is_empty() {
            log.note(format!("ran `{command}`"));
        } else {
            log.note(format!("ran `{command}`: {stdout}"));
        }
        Ok(())
    }
}

impl Plugin for ExecPlugin {
    fn name(&self) -> &'static str {
        "exec"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Runs shell commands in each release phase"
    }
}

impl ReleasePlugin for ExecPlugin {
    fn verify(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        self.run(Phase::Verify, ctx, log)
    }

    fn prepare(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        self.run(Phase::Prepare, ctx, log)
    }

    fn publish(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        self.run(Phase::Publish, ctx, log)
    }
}
