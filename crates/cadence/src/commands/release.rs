//! Release command.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use cadence_core::{PipelineFailure, ReleaseOutcome, RunReport};
use cadence_plugin::NextRelease;
use clap::Args;
use tracing::info;

use crate::workspace::Workspace;

/// Arguments for the release command.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Run verify and prepare only; publish nothing
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip the publish step of every plugin except the git tag
    #[arg(long)]
    pub no_publish_plugins: bool,
}

/// Runs the release command.
pub fn run(args: &ReleaseArgs) -> Result<()> {
    let workspace = Workspace::discover()?;
    let dry_run = args.dry_run || workspace.config().dry_run;
    let manager = workspace.manager(dry_run)?;
    let pipeline = workspace.pipeline(!args.no_publish_plugins)?;

    match manager.run(&pipeline).context("failed to plan the release")? {
        ReleaseOutcome::NoRelease(reason) => {
            println!("No release: {reason}");
            Ok(())
        }
        ReleaseOutcome::Released { release, report } => {
            info!(version = %release.version, published = report.published, "done");
            print!("{}", released(&release, &report));
            Ok(())
        }
        ReleaseOutcome::Failed { release, failure } => {
            eprint!("{}", failed(&release, &failure));
            Err(anyhow::Error::new(*failure))
        }
    }
}

fn released(release: &NextRelease, report: &RunReport) -> String {
    let mut out = String::new();
    if report.published {
        _ = writeln!(out, "Released {} ({})", release.version, release.tag);
    } else {
        _ = writeln!(
            out,
            "Dry run: would release {} ({})",
            release.version, release.tag
        );
    }
    for entry in report.log.entries() {
        _ = writeln!(out, "  [{} {}] {}", entry.phase, entry.plugin, entry.message);
    }
    _ = write!(out, "\n{}", release.notes);
    out
}

fn failed(release: &NextRelease, failure: &PipelineFailure) -> String {
    let mut out = String::new();
    _ = writeln!(out, "Release {} failed", release.version);
    _ = writeln!(out, "  phase:  {}", failure.phase);
    _ = writeln!(out, "  plugin: {}", failure.plugin);
    _ = writeln!(out, "  kind:   {}", failure.kind());
    _ = writeln!(out, "  cause:  {}", failure.error);

    let published: Vec<&str> = failure
        .completed_publishes()
        .map(|step| step.plugin.as_str())
        .collect();
    if published.is_empty() {
        _ = writeln!(out, "  published: nothing");
    } else {
        _ = writeln!(out, "  published: {}", published.join(", "));
    }
    _ = writeln!(out, "{}", failure.severity());
    out
}
