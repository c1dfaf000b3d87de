//! Configuration schema.

use std::path::PathBuf;

use cadence_plugin::{Placeholder, Template};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Glob patterns of branches releases may be made from.
    pub branches: Vec<String>,

    /// Tag name format. Must reference `${version}` exactly once.
    pub tag_format: String,

    /// Run without publishing.
    pub dry_run: bool,

    /// Version of the first release.
    pub initial_version: Version,

    /// Commit-message parser configuration.
    pub parser: ParserConfig,

    /// Release rules overlaid on the defaults.
    pub release_rules: Vec<ReleaseRuleConfig>,

    /// Release notes configuration.
    pub notes: NotesConfig,

    /// Ordered plugin chain.
    pub plugins: Vec<PluginConfig>,

    /// Git configuration.
    pub git: GitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            branches: vec!["main".to_string()],
            tag_format: "v${version}".to_string(),
            dry_run: false,
            initial_version: Version::new(1, 0, 0),
            parser: ParserConfig::default(),
            release_rules: Vec::new(),
            notes: NotesConfig::default(),
            plugins: Vec::new(),
            git: GitConfig::default(),
        }
    }
}

impl Config {
    /// Checks the values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        let tag_format = Template::parse(&self.tag_format)
            .map_err(|e| ConfigError::Invalid(format!("tag_format: {e}")))?;
        let placeholders: Vec<_> = tag_format.placeholders().collect();
        if placeholders != [Placeholder::Version] {
            return Err(ConfigError::Invalid(format!(
                "tag_format `{}` must contain ${{version}} exactly once and no other placeholder",
                self.tag_format
            )));
        }

        if self.branches.is_empty() {
            return Err(ConfigError::Invalid(
                "branches must list at least one pattern".to_string(),
            ));
        }
        for branch in &self.branches {
            glob::Pattern::new(branch).map_err(|e| {
                ConfigError::Invalid(format!("branch pattern `{branch}`: {e}"))
            })?;
        }

        if self.parser.name.is_empty() {
            return Err(ConfigError::Invalid("parser.name is empty".to_string()));
        }

        if let Some(rule) = self.notes.types.iter().find(|t| t.r#type.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "notes type for section {:?} has an empty type",
                rule.section
            )));
        }

        for plugin in &self.plugins {
            plugin.validate()?;
        }

        Ok(())
    }
}

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Parser plugin name.
    pub name: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            name: "conventional".to_string(),
        }
    }
}

/// Maps a commit type to a release impact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseRuleConfig {
    /// Commit type token.
    pub r#type: String,

    /// Impact token: `none`, `patch`, `minor` or `major`.
    pub release: String,
}

/// Release notes configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotesConfig {
    /// List the newest commit first within a section.
    pub newest_first: bool,

    /// Browsable repository URL for commit and compare links.
    pub repository_url: Option<String>,

    /// Section mapping. Replaces the defaults when non-empty.
    pub types: Vec<NoteTypeConfig>,
}

/// Maps a commit type to a notes section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteTypeConfig {
    /// Commit type token.
    pub r#type: String,

    /// Section title.
    #[serde(default)]
    pub section: Option<String>,

    /// Leave the type out of the notes.
    #[serde(default)]
    pub hidden: bool,
}

/// Git configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Remote that tags and release commits are pushed to.
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
        }
    }
}

/// One entry of the plugin chain, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum PluginConfig {
    /// Prepend release notes to a changelog file.
    Changelog(ChangelogPluginConfig),
    /// Rewrite version strings in files.
    Replace(ReplacePluginConfig),
    /// Run shell commands.
    Exec(ExecPluginConfig),
    /// Commit release artifacts.
    GitAssets(GitAssetsPluginConfig),
    /// Create a GitHub release.
    Github(GithubPluginConfig),
}

impl PluginConfig {
    /// The plugin name as written in the configuration.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Changelog(_) => "changelog",
            Self::Replace(_) => "replace",
            Self::Exec(_) => "exec",
            Self::GitAssets(_) => "git-assets",
            Self::Github(_) => "github",
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        let invalid = |message: String| ConfigError::Invalid(format!("{}: {message}", self.name()));

        match self {
            Self::Replace(replace) => {
                if replace.replacements.is_empty() {
                    return Err(invalid("no replacements configured".to_string()));
                }
                for replacement in &replace.replacements {
                    if replacement.files.is_empty() {
                        return Err(invalid(format!(
                            "replacement `{}` lists no files",
                            replacement.from
                        )));
                    }
                    if replacement.from.is_empty() {
                        return Err(invalid("replacement has an empty `from`".to_string()));
                    }
                }
            }
            Self::GitAssets(assets) if assets.assets.is_empty() => {
                return Err(invalid("no assets configured".to_string()));
            }
            Self::Github(github) => {
                for pattern in &github.assets {
                    glob::Pattern::new(pattern)
                        .map_err(|e| invalid(format!("asset pattern `{pattern}`: {e}")))?;
                }
                if let Some(repo) = &github.repository
                    && repo.split('/').filter(|part| !part.is_empty()).count() != 2
                {
                    return Err(invalid(format!(
                        "repository `{repo}` is not of the form owner/name"
                    )));
                }
            }
            _ => {}
        }

        Ok(())
    }
}

/// Changelog plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogPluginConfig {
    /// Changelog path, relative to the repository root.
    pub file: PathBuf,

    /// Title kept at the top of the file.
    pub title: Option<String>,
}

impl Default for ChangelogPluginConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("CHANGELOG.md"),
            title: None,
        }
    }
}

/// Replace plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplacePluginConfig {
    /// Replacements applied together.
    pub replacements: Vec<ReplacementConfig>,
}

/// A single regex replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplacementConfig {
    /// Files to rewrite, relative to the repository root.
    pub files: Vec<PathBuf>,

    /// Regex to search for.
    pub from: String,

    /// Replacement template.
    pub to: Template,

    /// Replacements expected in each file.
    #[serde(default = "default_count")]
    pub count: usize,

    /// Fail on a count mismatch instead of warning.
    #[serde(default = "default_true")]
    pub strict: bool,
}

fn default_count() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Exec plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecPluginConfig {
    /// Command run during verify.
    pub verify_cmd: Option<Template>,

    /// Command run during prepare.
    pub prepare_cmd: Option<Template>,

    /// Command run during publish.
    pub publish_cmd: Option<Template>,
}

/// Git assets plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitAssetsPluginConfig {
    /// Files to commit, relative to the repository root.
    pub assets: Vec<PathBuf>,

    /// Commit message. Defaults to `chore(release): ${version} [skip ci]`.
    pub message: Option<Template>,
}

/// GitHub plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubPluginConfig {
    /// `owner/name`. Derived from the git remote when omitted.
    pub repository: Option<String>,

    /// Glob patterns of files to upload.
    pub assets: Vec<String>,

    /// Create the release as a draft.
    pub draft: bool,

    /// Mark the release as a prerelease.
    pub prerelease: bool,

    /// Environment variable holding the API token.
    pub token_env: String,

    /// API base URL.
    pub api_url: String,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GithubPluginConfig {
    fn default() -> Self {
        Self {
            repository: None,
            assets: Vec::new(),
            draft: false,
            prerelease: false,
            token_env: "GITHUB_TOKEN".to_string(),
            api_url: "https://api.github.com".to_string(),
            timeout_secs: 30,
        }
    }
}
