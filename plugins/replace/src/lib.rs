//! Version string replacement plugin.
//!
//! Rewrites version strings in project files during prepare, using the
//! all-or-nothing mutator from `cadence-core`.

use std::sync::Arc;

use cadence_config::ReplacePluginConfig;
use cadence_core::mutator::{self, ReplacementResult, ReplacementSpec};
use cadence_plugin::collaborators::FileSystem;
use cadence_plugin::{
    ExecutionContext, Plugin, PluginError, PluginResult, ReleasePlugin, StepLog,
};
use tracing::debug;

/// Replaces version strings in files.
pub struct ReplacePlugin {
    specs: Vec<ReplacementSpec>,
    fs: Arc<dyn FileSystem>,
}

impl ReplacePlugin {
    /// Creates a plugin with no replacements.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            specs: Vec::new(),
            fs,
        }
    }

    /// Creates a plugin from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] if a pattern is not a valid regex.
    pub fn from_config(config: &ReplacePluginConfig, fs: Arc<dyn FileSystem>) -> PluginResult<Self> {
        config
            .replacements
            .iter()
            .try_fold(Self::new(fs), |plugin, replacement| {
                let spec = ReplacementSpec::from_config(replacement)
                    .map_err(|e| PluginError::Config(e.to_string()))?;
                Ok(plugin.with_replacement(spec))
            })
    }

    /// Adds a replacement.
    #[must_use]
    pub fn with_replacement(mut self, spec: ReplacementSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// The configured replacements.
    #[must_use]
    pub fn replacements(&self) -> &[ReplacementSpec] {
        &self.specs
    }

    /// Applies every replacement for the release in `ctx`.
    ///
    /// # Errors
    ///
    /// See [`mutator::apply`].
    pub fn apply(&self, ctx: &ExecutionContext) -> PluginResult<Vec<ReplacementResult>> {
        mutator::apply(&self.specs, &ctx.template_values(), self.fs.as_ref())
    }
}

impl Plugin for ReplacePlugin {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Rewrites version strings in project files"
    }
}

impl ReleasePlugin for ReplacePlugin {
    fn verify(&self, _ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        for file in self.specs.iter().flat_map(|spec| spec.files()) {
            if !self.fs.exists(file) {
                return Err(PluginError::filesystem(
                    file,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                ));
            }
        }
        log.note(format!("{} replacement(s) configured", self.specs.len()));
        Ok(())
    }

    fn prepare(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        let results = self.apply(ctx)?;
        for result in &results {
            debug!(
                file = %result.file.display(),
                matches = result.num_matches,
                replacements = result.num_replacements,
                "replacement applied"
            );
            if result.has_changed {
                log.artifact(
                    &result.file,
                    format!("replaced {} occurrence(s)", result.num_replacements),
                );
            }
        }
        Ok(())
    }
}
