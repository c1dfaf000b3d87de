//! Configuration management for Cadence.
//!
//! This crate handles loading and validating the `cadence.toml` configuration file.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_FILE_NAME, find_and_load_config, find_and_load_config_from, find_config_from,
    load_config,
};
pub use schema::{
    ChangelogPluginConfig, Config, ExecPluginConfig, GitAssetsPluginConfig, GitConfig,
    GithubPluginConfig, NoteTypeConfig, NotesConfig, ParserConfig, PluginConfig,
    ReleaseRuleConfig, ReplacePluginConfig, ReplacementConfig,
};
