//! Repository, configuration and plugin chain shared by the commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cadence_changelog::ChangelogPlugin;
use cadence_config::{Config, PluginConfig, find_config_from, load_config};
use cadence_core::{Pipeline, ReleaseManager, TagPlugin};
use cadence_exec::ExecPlugin;
use cadence_git::{GitVersionControl, Repository, web_url};
use cadence_git_assets::GitAssetsPlugin;
use cadence_github::{GithubPlugin, repository_from_url};
use cadence_parser_conventional::ConventionalParser;
use cadence_plugin::collaborators::{FileSystem, LocalFileSystem, VersionControl};
use cadence_plugin::{CommitParser, Plugin, ReleasePlugin};
use cadence_replace::ReplacePlugin;
use tracing::{debug, warn};

/// The repository a command runs against.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: Config,
    repository_url: Option<String>,
}

impl Workspace {
    /// Finds the repository and configuration around the current directory.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read the current directory")?;
        Self::discover_from(&cwd)
    }

    /// Finds the repository containing `start` and the nearest
    /// `cadence.toml`. Defaults apply when there is no configuration file.
    pub fn discover_from(start: &Path) -> Result<Self> {
        let repo = Repository::discover(start).context("failed to open git repository")?;
        let root = repo.path().to_path_buf();

        let config = match find_config_from(start) {
            Some(path) => load_config(&path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => {
                debug!("no configuration file found, using defaults");
                Config::default()
            }
        };

        let repository_url = match &config.notes.repository_url {
            Some(url) => Some(url.clone()),
            None => repo
                .remote_url(&config.git.remote)
                .context("failed to read remote URL")?
                .as_deref()
                .and_then(web_url),
        };
        debug!(root = %root.display(), ?repository_url, "opened workspace");

        Ok(Self {
            root,
            config,
            repository_url,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds a release manager over this repository.
    pub fn manager(&self, dry_run: bool) -> Result<ReleaseManager> {
        let repo = Repository::open(&self.root).context("failed to open git repository")?;
        let parser = parser_for(&self.config.parser.name)?;
        let manager = ReleaseManager::from_config(&self.config, &self.root, Box::new(repo), parser)
            .context("invalid configuration")?
            .with_dry_run(dry_run)
            .with_repository_url(self.repository_url.clone());
        Ok(manager)
    }

    /// Builds the plugin chain: the tag plugin, then the configured plugins
    /// in order. Without `publish_plugins` only the tag plugin publishes.
    pub fn pipeline(&self, publish_plugins: bool) -> Result<Pipeline> {
        let vcs: Arc<dyn VersionControl> = Arc::new(GitVersionControl::new(&self.root));
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new(&self.root));

        let tag = TagPlugin::new(Arc::clone(&vcs), self.config.git.remote.clone());
        let tag_name = tag.name();
        let mut pipeline = Pipeline::new().with_plugin(Box::new(tag));

        for plugin in &self.config.plugins {
            debug!(plugin = plugin.name(), "adding plugin");
            pipeline = pipeline.with_plugin(self.plugin(plugin, &vcs, &fs)?);
        }

        if !publish_plugins {
            pipeline = pipeline.with_publish_only([tag_name]);
        }
        Ok(pipeline)
    }

    fn plugin(
        &self,
        config: &PluginConfig,
        vcs: &Arc<dyn VersionControl>,
        fs: &Arc<dyn FileSystem>,
    ) -> Result<Box<dyn ReleasePlugin>> {
        Ok(match config {
            PluginConfig::Changelog(c) => Box::new(ChangelogPlugin::from_config(c, Arc::clone(fs))),
            PluginConfig::Replace(c) => Box::new(
                ReplacePlugin::from_config(c, Arc::clone(fs))
                    .context("invalid replace plugin configuration")?,
            ),
            PluginConfig::Exec(c) => Box::new(ExecPlugin::from_config(c)),
            PluginConfig::GitAssets(c) => Box::new(GitAssetsPlugin::from_config(
                c,
                Arc::clone(vcs),
                Arc::clone(fs),
            )),
            PluginConfig::Github(c) => {
                let repository = c
                    .repository
                    .clone()
                    .or_else(|| self.repository_url.as_deref().and_then(repository_from_url))
                    .unwrap_or_else(|| {
                        // Verify reports the missing repository.
                        warn!("no GitHub repository configured or derivable from the remote");
                        String::new()
                    });
                Box::new(
                    GithubPlugin::from_config(c, repository, &self.root)
                        .context("invalid github plugin configuration")?,
                )
            }
        })
    }
}

/// Returns the commit parser registered under `name`.
pub fn parser_for(name: &str) -> Result<Box<dyn CommitParser>> {
    match name {
        "conventional" => Ok(Box::new(ConventionalParser::new())),
        other => bail!("unknown commit parser `{other}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for() {
        assert_eq!(parser_for("conventional").unwrap().name(), "conventional");
        let err = parser_for("gitmoji").err().unwrap();
        assert_eq!(err.to_string(), "unknown commit parser `gitmoji`");
    }

    #[test]
    fn test_discover_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Workspace::discover_from(dir.path()).is_err());
    }

    #[test]
    fn test_discover_defaults_and_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();

        let workspace = Workspace::discover_from(dir.path()).unwrap();
        assert_eq!(workspace.config(), &Config::default());

        let pipeline = workspace.pipeline(true).unwrap();
        let names: Vec<_> = pipeline.plugins().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["git-tag"]);
    }

    #[test]
    fn test_pipeline_follows_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        std::fs::write(
            dir.path().join("cadence.toml"),
            r#"
[[plugins]]
name = "exec"
verify_cmd = "true"

[[plugins]]
name = "changelog"

[[plugins]]
name = "git-assets"
assets = ["CHANGELOG.md"]
"#,
        )
        .unwrap();

        let workspace = Workspace::discover_from(dir.path()).unwrap();
        let pipeline = workspace.pipeline(false).unwrap();
        let names: Vec<_> = pipeline.plugins().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["git-tag", "exec", "changelog", "git-assets"]);
    }

    #[test]
    fn test_invalid_configuration_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("cadence.toml"), "tag_format = \"release\"\n").unwrap();

        let err = Workspace::discover_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }
}
