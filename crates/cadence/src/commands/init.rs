//! Initialize command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cadence_config::CONFIG_FILE_NAME;
use clap::Args;

/// Written by `cadence init`. Every value shown is the default.
const STARTER_CONFIG: &str = r#"# Cadence release configuration.

# Branches releases may be made from (glob patterns).
branches = ["main"]

# Tag name for a version. Must contain ${version} exactly once.
tag_format = "v${version}"

# Version used when no release tag exists yet.
initial_version = "1.0.0"

[parser]
name = "conventional"

# Extra release rules, applied on top of feat=minor, fix=patch, perf=patch.
# [[release_rules]]
# type = "refactor"
# release = "patch"

[notes]
newest_first = false

[git]
remote = "origin"

# Plugins run in order after the built-in tag plugin.
[[plugins]]
name = "changelog"
file = "CHANGELOG.md"

# [[plugins]]
# name = "replace"
# [[plugins.replacements]]
# files = ["Cargo.toml"]
# from = '^version = ".*"'
# to = 'version = "${version}"'

# [[plugins]]
# name = "git-assets"
# assets = ["CHANGELOG.md"]

# [[plugins]]
# name = "github"
"#;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Runs the init command.
pub fn run(args: &InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    let path = write_starter(&cwd, args.force)?;
    println!("Created {}", path.display());
    Ok(())
}

fn write_starter(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        bail!(
            "{} already exists; use --force to overwrite it",
            path.display()
        );
    }
    fs::write(&path, STARTER_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
