//! Notes command.

use anyhow::{Context, Result};
use cadence_core::Plan;
use clap::Args;

use crate::workspace::Workspace;

/// Arguments for the notes command.
#[derive(Debug, Args)]
pub struct NotesArgs {}

/// Runs the notes command.
pub fn run(_args: &NotesArgs) -> Result<()> {
    let workspace = Workspace::discover()?;
    let plan = workspace
        .manager(false)?
        .plan()
        .context("failed to plan the release")?;

    match plan {
        Plan::NoRelease(reason) => println!("No release: {reason}"),
        Plan::Release(planned) => print!("{}", planned.release.notes),
    }
    Ok(())
}
