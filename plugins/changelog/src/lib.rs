//! Changelog file plugin.
//!
//! Prepends the release notes to a changelog file during prepare.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cadence_config::ChangelogPluginConfig;
use cadence_plugin::collaborators::FileSystem;
use cadence_plugin::{ExecutionContext, Plugin, PluginResult, ReleasePlugin, StepLog};

/// Keeps a markdown changelog up to date.
pub struct ChangelogPlugin {
    file: PathBuf,
    title: Option<String>,
    fs: Arc<dyn FileSystem>,
}

impl ChangelogPlugin {
    /// Creates a plugin writing `CHANGELOG.md` without a title.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            file: PathBuf::from("CHANGELOG.md"),
            title: None,
            fs,
        }
    }

    /// Creates a plugin from its configuration.
    #[must_use]
    pub fn from_config(config: &ChangelogPluginConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self::new(fs)
            .with_file(config.file.clone())
            .with_title(config.title.clone())
    }

    /// Sets the changelog path, relative to the repository root.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = file.into();
        self
    }

    /// Sets the title kept at the top of the file.
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    /// The changelog path.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The changelog title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Puts `notes` above the existing entries, keeping the title first.
    #[must_use]
    pub fn merge(&self, current: &str, notes: &str) -> String {
        let mut current = current.trim();
        if let Some(title) = &self.title
            && let Some(rest) = current.strip_prefix(title.as_str())
        {
            current = rest.trim_start();
        }

        let mut content = String::new();
        if let Some(title) = &self.title {
            content.push_str(title);
            content.push_str("\n\n");
        }
        content.push_str(notes.trim());
        content.push('\n');
        if !current.is_empty() {
            content.push('\n');
            content.push_str(current);
            content.push('\n');
        }
        content
    }
}

impl Plugin for ChangelogPlugin {
    fn name(&self) -> &'static str {
        "changelog"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Prepends release notes to a changelog file"
    }
}

impl ReleasePlugin for ChangelogPlugin {
    fn prepare(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        let current = if self.fs.exists(&self.file) {
            self.fs.read_file(&self.file)?
        } else {
            log.note(format!("creating {}", self.file.display()));
            String::new()
        };

        let content = self.merge(&current, &ctx.next_release().notes);
        self.fs.write_file(&self.file, &content)?;
        log.artifact(
            &self.file,
            format!("added {} to the changelog", ctx.next_release().version),
        );
        Ok(())
    }
}
