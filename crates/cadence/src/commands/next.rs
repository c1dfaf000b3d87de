//! Next command.

use anyhow::{Context, Result};
use cadence_core::Plan;
use clap::Args;
use serde_json::{Value, json};

use crate::workspace::Workspace;

/// Arguments for the next command.
#[derive(Debug, Args)]
pub struct NextArgs {
    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runs the next command.
pub fn run(args: &NextArgs) -> Result<()> {
    let workspace = Workspace::discover()?;
    let plan = workspace
        .manager(false)?
        .plan()
        .context("failed to plan the release")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&plan))?);
    } else {
        print!("{}", describe(&plan));
    }
    Ok(())
}

fn to_json(plan: &Plan) -> Value {
    match plan {
        Plan::NoRelease(reason) => json!({
            "release": false,
            "reason": reason.to_string(),
        }),
        Plan::Release(planned) => {
            let release = &planned.release;
            json!({
                "release": true,
                "version": release.version.to_string(),
                "previous_version": release.previous_version.as_ref().map(ToString::to_string),
                "impact": release.impact.to_string(),
                "tag": release.tag,
                "branch": release.branch,
                "commits": planned.commits.len(),
            })
        }
    }
}

fn describe(plan: &Plan) -> String {
    match plan {
        Plan::NoRelease(reason) => format!("No release: {reason}\n"),
        Plan::Release(planned) => {
            let release = &planned.release;
            let previous = release
                .previous_version
                .as_ref()
                .map_or_else(|| "none".to_string(), ToString::to_string);
            format!(
                "Next release: {} ({})\nPrevious: {previous}\nTag: {}\nCommits: {}\n",
                release.version,
                release.impact,
                release.tag,
                planned.commits.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{NoReleaseReason, PlannedRelease, ReleaseDecision};
    use cadence_plugin::{NextRelease, ReleaseImpact};

    fn planned() -> Plan {
        let decision = ReleaseDecision {
            should_release: true,
            next_version: Some("1.1.0".parse().unwrap()),
            impact: ReleaseImpact::Minor,
            previous_version: Some("1.0.0".parse().unwrap()),
        };
        let release = NextRelease::new("1.1.0".parse().unwrap(), ReleaseImpact::Minor, "v1.1.0")
            .with_previous_version(Some("1.0.0".parse().unwrap()))
            .with_branch("main");
        Plan::Release(Box::new(PlannedRelease {
            decision,
            release,
            commits: Vec::new(),
        }))
    }

    #[test]
    fn test_describe_release() {
        assert_eq!(
            describe(&planned()),
            "Next release: 1.1.0 (minor)\nPrevious: 1.0.0\nTag: v1.1.0\nCommits: 0\n"
        );
    }

    #[test]
    fn test_describe_no_release() {
        let plan = Plan::NoRelease(NoReleaseReason::NoCommits);
        assert_eq!(describe(&plan), "No release: no commits since the last release\n");
    }

    #[test]
    fn test_json() {
        let value = to_json(&planned());
        assert_eq!(value["release"], true);
        assert_eq!(value["version"], "1.1.0");
        assert_eq!(value["previous_version"], "1.0.0");
        assert_eq!(value["impact"], "minor");
        assert_eq!(value["tag"], "v1.1.0");

        let value = to_json(&Plan::NoRelease(NoReleaseReason::NoReleasableCommits));
        assert_eq!(value["release"], false);
        assert_eq!(
            value["reason"],
            "no commits since the last release warrant a release"
        );
    }
}
