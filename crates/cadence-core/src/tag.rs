//! Release tags.

use std::sync::Arc;

use cadence_plugin::collaborators::VersionControl;
use cadence_plugin::{
    ExecutionContext, Placeholder, Plugin, PluginError, PluginResult, ReleasePlugin, StepLog,
    Template, TemplateValues,
};
use semver::Version;

use crate::{CoreError, CoreResult};

/// A tag name format such as `v${version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFormat {
    template: Template,
}

impl TagFormat {
    /// Parses a tag format.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] unless the format references
    /// `${version}` exactly once and nothing else.
    pub fn parse(format: &str) -> CoreResult<Self> {
        let template = Template::parse(format)
            .map_err(|e| CoreError::Configuration(format!("tag format `{format}`: {e}")))?;
        let placeholders: Vec<_> = template.placeholders().collect();
        if placeholders != [Placeholder::Version] {
            return Err(CoreError::Configuration(format!(
                "tag format `{format}` must contain ${{version}} exactly once"
            )));
        }
        Ok(Self { template })
    }

    /// The tag name for a version.
    #[must_use]
    pub fn tag_for(&self, version: &Version) -> String {
        self.template.render(&TemplateValues {
            version: version.to_string(),
            ..TemplateValues::default()
        })
    }

    /// Glob pattern matching every tag of this format.
    #[must_use]
    pub fn glob(&self) -> String {
        let (prefix, suffix) = self.template.affixes();
        format!(
            "{}*{}",
            glob::Pattern::escape(prefix),
            glob::Pattern::escape(suffix)
        )
    }

    /// Extracts the version from a tag of this format.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::VersionParse`] if the tag does not carry a valid
    /// version.
    pub fn version_of(&self, tag: &str) -> CoreResult<Version> {
        let (prefix, suffix) = self.template.affixes();
        let text = tag
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .unwrap_or(tag);
        Version::parse(text).map_err(|source| CoreError::VersionParse {
            tag: tag.to_string(),
            source,
        })
    }
}

/// Creates and pushes the release tag.
///
/// Placed first in every plugin chain. Verify fails if the tag already
/// exists; publish tags HEAD and pushes the branch and the tag.
pub struct TagPlugin {
    vcs: Arc<dyn VersionControl>,
    remote: String,
}

impl TagPlugin {
    /// Creates the plugin pushing to `remote`.
    #[must_use]
    pub fn new(vcs: Arc<dyn VersionControl>, remote: impl Into<String>) -> Self {
        Self {
            vcs,
            remote: remote.into(),
        }
    }
}

impl Plugin for TagPlugin {
    fn name(&self) -> &'static str {
        "git-tag"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Tags the release commit and pushes it"
    }
}

impl ReleasePlugin for TagPlugin {
    fn verify(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        let tag = &ctx.next_release().tag;
        if self.vcs.tag_exists(tag)? {
            return Err(PluginError::Vcs(format!("tag {tag} already exists")));
        }
        log.note(format!("tag {tag} is free"));
        Ok(())
    }

    fn publish(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        let release = ctx.next_release();
        self.vcs
            .create_tag(&release.tag, &format!("Release {}", release.version))?;
        log.note(format!("created tag {}", release.tag));

        let mut refspecs = Vec::with_capacity(2);
        if !release.branch.is_empty() {
            refspecs.push(format!("refs/heads/{}", release.branch));
        }
        refspecs.push(format!("refs/tags/{}", release.tag));
        self.vcs.push(&self.remote, &refspecs)?;
        log.note(format!("pushed {} to {}", refspecs.join(", "), self.remote));
        Ok(())
    }
}
