//! Release commit plugin.
//!
//! Commits the files changed by earlier plugins (changelog, version files)
//! during prepare, so the release tag points at them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cadence_config::GitAssetsPluginConfig;
use cadence_plugin::collaborators::{FileSystem, VersionControl};
use cadence_plugin::{ExecutionContext, Plugin, PluginResult, ReleasePlugin, StepLog, Template};

/// Commits release assets.
pub struct GitAssetsPlugin {
    assets: Vec<PathBuf>,
    message: Option<Template>,
    vcs: Arc<dyn VersionControl>,
    fs: Arc<dyn FileSystem>,
}

impl GitAssetsPlugin {
    /// Creates a plugin with no assets and the default message.
    #[must_use]
    pub fn new(vcs: Arc<dyn VersionControl>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            assets: Vec::new(),
            message: None,
            vcs,
            fs,
        }
    }

    /// Creates a plugin from its configuration.
    #[must_use]
    pub fn from_config(
        config: &GitAssetsPluginConfig,
        vcs: Arc<dyn VersionControl>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            assets: config.assets.clone(),
            message: config.message.clone(),
            vcs,
            fs,
        }
    }

    /// Adds a file to commit.
    #[must_use]
    pub fn with_asset(mut self, path: impl Into<PathBuf>) -> Self {
        self.assets.push(path.into());
        self
    }

    /// Sets the commit message template.
    #[must_use]
    pub fn with_message(mut self, message: Template) -> Self {
        self.message = Some(message);
        self
    }

    /// Files to commit.
    #[must_use]
    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    /// The commit message for the release in `ctx`.
    #[must_use]
    pub fn message(&self, ctx: &ExecutionContext) -> String {
        match &self.message {
            Some(template) => template.render(&ctx.template_values()),
            None => format!("chore(release): {} [skip ci]", ctx.next_release().version),
        }
    }
}

impl Plugin for GitAssetsPlugin {
    fn name(&self) -> &'static str {
        "git-assets"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Commits release assets before tagging"
    }
}

impl ReleasePlugin for GitAssetsPlugin {
    fn prepare(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        let (present, missing): (Vec<&Path>, Vec<&Path>) = self
            .assets
            .iter()
            .map(PathBuf::as_path)
            .partition(|path| self.fs.exists(path));

        for path in &missing {
            log.note(format!("skipping missing asset {}", path.display()));
        }
        if present.is_empty() {
            log.note("no assets to commit");
            return Ok(());
        }

        let paths: Vec<PathBuf> = present.iter().map(|p| p.to_path_buf()).collect();
        let message = self.message(ctx);
        let oid = self.vcs.commit_paths(&paths, &message)?;
        log.note(format!("committed {} file(s) as {oid}: {message}", paths.len()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_plugin::collaborators::LocalFileSystem;
    use cadence_plugin::{NextRelease, Phase, PluginError, ReleaseImpact, ReleaseLog};
    use semver::Version;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingVcs {
        commits: Mutex<Vec<(Vec<PathBuf>, String)>>,
        fail: bool,
    }

    impl VersionControl for RecordingVcs {
        fn tag_exists(&self, _name: &str) -> PluginResult<bool> {
            Ok(false)
        }

        fn create_tag(&self, _name: &str, _message: &str) -> PluginResult<()> {
            Ok(())
        }

        fn push(&self, _remote: &str, _refspecs: &[String]) -> PluginResult<()> {
            Ok(())
        }

        fn commit_paths(&self, paths: &[PathBuf], message: &str) -> PluginResult<String> {
            if self.fail {
                return Err(PluginError::Vcs("index locked".to_string()));
            }
            self.commits
                .lock()
                .unwrap()
                .push((paths.to_vec(), message.to_string()));
            Ok("abc1234".to_string())
        }
    }

    fn context() -> ExecutionContext {
        let release = NextRelease::new(Version::new(0, 5, 0), ReleaseImpact::Minor, "v0.5.0");
        ExecutionContext::builder("/repo", release).build()
    }

    fn setup(files: &[&str]) -> (tempfile::TempDir, Arc<dyn FileSystem>) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), "x").unwrap();
        }
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new(dir.path()));
        (dir, fs)
    }

    #[test]
    fn test_default_message() {
        let (_dir, fs) = setup(&[]);
        let plugin = GitAssetsPlugin::new(Arc::new(RecordingVcs::default()), fs);
        assert_eq!(plugin.message(&context()), "chore(release): 0.5.0 [skip ci]");
    }

    #[test]
    fn test_from_config() {
        let (_dir, fs) = setup(&[]);
        let config = GitAssetsPluginConfig {
            assets: vec![PathBuf::from("CHANGELOG.md")],
            message: Some(Template::parse("release ${tag}").unwrap()),
        };
        let plugin = GitAssetsPlugin::from_config(&config, Arc::new(RecordingVcs::default()), fs);
        assert_eq!(plugin.assets(), [PathBuf::from("CHANGELOG.md")]);
        assert_eq!(plugin.message(&context()), "release v0.5.0");
    }

    #[test]
    fn test_prepare_commits_present_assets() {
        let (_dir, fs) = setup(&["CHANGELOG.md"]);
        let vcs = Arc::new(RecordingVcs::default());
        let plugin = GitAssetsPlugin::new(vcs.clone(), fs)
            .with_asset("CHANGELOG.md")
            .with_asset("missing.txt");
        let mut log = ReleaseLog::new();

        plugin
            .prepare(&context(), &mut log.step("git-assets", Phase::Prepare))
            .unwrap();

        let commits = vcs.commits.lock().unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].0, vec![PathBuf::from("CHANGELOG.md")]);
        assert_eq!(commits[0].1, "chore(release): 0.5.0 [skip ci]");
        assert_eq!(log.entries()[0].message, "skipping missing asset missing.txt");
    }

    #[test]
    fn test_prepare_without_assets_skips_commit() {
        let (_dir, fs) = setup(&[]);
        let vcs = Arc::new(RecordingVcs::default());
        let plugin = GitAssetsPlugin::new(vcs.clone(), fs).with_asset("CHANGELOG.md");
        let mut log = ReleaseLog::new();

        plugin
            .prepare(&context(), &mut log.step("git-assets", Phase::Prepare))
            .unwrap();
        assert!(vcs.commits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_prepare_propagates_vcs_error() {
        let (_dir, fs) = setup(&["CHANGELOG.md"]);
        let vcs = Arc::new(RecordingVcs {
            fail: true,
            ..RecordingVcs::default()
        });
        let plugin = GitAssetsPlugin::new(vcs, fs).with_asset("CHANGELOG.md");
        let mut log = ReleaseLog::new();

        let err = plugin
            .prepare(&context(), &mut log.step("git-assets", Phase::Prepare))
            .unwrap_err();
        assert!(matches!(err, PluginError::Vcs(_)));
    }
}
