//! GitHub release plugin.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cadence_config::GithubPluginConfig;
use cadence_plugin::{ExecutionContext, Plugin, PluginError, PluginResult, ReleasePlugin, StepLog};
use tracing::{debug, warn};

use crate::api::{HostingApi, ReleaseRequest};
use crate::client::GithubClient;

/// Publishes a GitHub release with the release notes and uploads assets.
pub struct GithubPlugin {
    repository: String,
    root: PathBuf,
    assets: Vec<String>,
    draft: bool,
    prerelease: bool,
    token_env: String,
    api: Option<Box<dyn HostingApi>>,
}

impl GithubPlugin {
    /// Creates a plugin for `owner/name`, resolving assets under `root`.
    #[must_use]
    pub fn new(repository: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            root: root.into(),
            assets: Vec::new(),
            draft: false,
            prerelease: false,
            token_env: "GITHUB_TOKEN".to_string(),
            api: None,
        }
    }

    /// Creates a plugin from its configuration. The API client is built
    /// only when the token variable is set; verify fails otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(
        config: &GithubPluginConfig,
        repository: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> PluginResult<Self> {
        let mut plugin = Self::new(repository, root)
            .with_assets(config.assets.clone())
            .with_draft(config.draft)
            .with_prerelease(config.prerelease);
        plugin.token_env.clone_from(&config.token_env);

        match std::env::var(&config.token_env) {
            Ok(token) if !token.trim().is_empty() => {
                let client = GithubClient::new(
                    &config.api_url,
                    token.trim(),
                    Duration::from_secs(config.timeout_secs),
                )?;
                Ok(plugin.with_api(Box::new(client)))
            }
            _ => Ok(plugin),
        }
    }

    /// Uses the given hosting API.
    #[must_use]
    pub fn with_api(mut self, api: Box<dyn HostingApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Sets asset glob patterns, relative to the repository root.
    #[must_use]
    pub fn with_assets(mut self, assets: Vec<String>) -> Self {
        self.assets = assets;
        self
    }

    /// Creates the release as a draft.
    #[must_use]
    pub fn with_draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }

    /// Marks the release as a prerelease.
    #[must_use]
    pub fn with_prerelease(mut self, prerelease: bool) -> Self {
        self.prerelease = prerelease;
        self
    }

    /// The target repository.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns whether this is a draft release.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.draft
    }

    /// Returns whether this is a prerelease.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.prerelease
    }

    /// Files matching the asset patterns, in pattern order, without
    /// duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] for an invalid pattern.
    pub fn resolve_assets(&self) -> PluginResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for pattern in &self.assets {
            let full = self.root.join(pattern);
            let matches = glob::glob(&full.to_string_lossy())
                .map_err(|e| PluginError::Config(format!("asset pattern `{pattern}`: {e}")))?;

            let mut found = false;
            for entry in matches {
                let path = entry.map_err(|e| {
                    PluginError::filesystem(e.path().to_path_buf(), e.into_error())
                })?;
                if path.is_file() && !files.contains(&path) {
                    found = true;
                    files.push(path);
                }
            }
            if !found {
                warn!(%pattern, "asset pattern matched no files");
            }
        }
        Ok(files)
    }

    fn api(&self) -> PluginResult<&dyn HostingApi> {
        self.api.as_deref().ok_or_else(|| {
            PluginError::Config(format!(
                "no GitHub token: set the {} environment variable",
                self.token_env
            ))
        })
    }
}

impl Plugin for GithubPlugin {
    fn name(&self) -> &'static str {
        "github"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Creates GitHub releases and uploads assets"
    }
}

impl ReleasePlugin for GithubPlugin {
    fn verify(&self, _ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        self.api()?;
        match self.repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {}
            _ => {
                return Err(PluginError::Config(format!(
                    "repository `{}` is not in owner/name form",
                    self.repository
                )));
            }
        }
        log.note(format!("releasing to {}", self.repository));
        Ok(())
    }

    fn publish(&self, ctx: &ExecutionContext, log: &mut StepLog<'_>) -> PluginResult<()> {
        let api = self.api()?;
        let assets = self.resolve_assets()?;
        let release = ctx.next_release();

        let request = ReleaseRequest {
            repository: self.repository.clone(),
            tag_name: release.tag.clone(),
            target_commitish: release.branch.clone(),
            name: release.tag.clone(),
            body: release.notes.clone(),
            draft: self.draft,
            prerelease: self.prerelease,
        };
        let created = api.create_release(&request)?;
        log.note(format!("published release {}", created.html_url));

        for path in &assets {
            debug!(path = %path.display(), "uploading");
            let url = api.upload_asset(&created, path)?;
            log.artifact(relative(path, &self.root), format!("uploaded {url}"));
        }
        Ok(())
    }
}

fn relative(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Extracts `owner/name` from a browsable repository URL.
#[must_use]
pub fn repository_from_url(url: &str) -> Option<String> {
    let path = url.split_once("://").map_or(url, |(_, rest)| rest);
    let mut segments = path.trim_end_matches('/').rsplit('/');
    let name = segments.next()?;
    let owner = segments.next()?;
    // The first segment is the host.
    segments.next()?;
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some(format!("{owner}/{name}"))
}
