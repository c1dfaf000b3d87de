//! Release decision.

use cadence_commit::ParsedCommit;
use cadence_config::{Config, ReleaseRuleConfig};
use cadence_plugin::ReleaseImpact;
use semver::{BuildMetadata, Prerelease, Version};
use serde::Serialize;
use tracing::debug;

use crate::classifier::{RuleSet, TypeRule, classify};
use crate::{CoreError, CoreResult};

/// Whether to release, and which version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDecision {
    /// True when at least one commit has an impact.
    pub should_release: bool,

    /// The next version, set only when releasing.
    pub next_version: Option<Version>,

    /// The highest impact among the commits.
    pub impact: ReleaseImpact,

    /// The last released version, if any.
    pub previous_version: Option<Version>,
}

/// The conventional-commits release rules: `feat` is minor, `fix` and
/// `perf` are patch.
#[must_use]
pub fn default_release_rules() -> RuleSet {
    RuleSet::new([
        TypeRule::new("feat", ReleaseImpact::Minor),
        TypeRule::new("fix", ReleaseImpact::Patch),
        TypeRule::new("perf", ReleaseImpact::Patch),
    ])
}

/// Overlays configured release rules on the defaults.
///
/// # Errors
///
/// Returns [`CoreError::Configuration`] for an empty type or an unknown
/// impact token.
pub fn release_rules_from_config(rules: &[ReleaseRuleConfig]) -> CoreResult<RuleSet> {
    let overlay = rules
        .iter()
        .map(|rule| {
            if rule.r#type.trim().is_empty() {
                return Err(CoreError::Configuration(
                    "release rule with an empty type".to_string(),
                ));
            }
            let impact = rule
                .release
                .parse::<ReleaseImpact>()
                .map_err(|e| CoreError::Configuration(format!("release rule `{}`: {e}", rule.r#type)))?;
            Ok(TypeRule::new(&rule.r#type, impact))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(default_release_rules().overlay(overlay))
}

/// Bumps a version by an impact. Lower components reset; prerelease and
/// build metadata are cleared. `None` returns the version unchanged.
///
/// A prerelease whose lower components already satisfy the impact
/// graduates to its own release version: `2.0.0-rc.1` bumps to `2.0.0`
/// for any impact, `1.3.0-rc.1` to `1.3.0` for a minor or patch.
#[must_use]
pub fn bump(version: &Version, impact: ReleaseImpact) -> Version {
    let mut next = version.clone();
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;

    let graduates = !version.pre.is_empty()
        && match impact {
            ReleaseImpact::Major => version.minor == 0 && version.patch == 0,
            ReleaseImpact::Minor => version.patch == 0,
            ReleaseImpact::Patch => true,
            ReleaseImpact::None => false,
        };
    if graduates {
        return next;
    }

    match impact {
        ReleaseImpact::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
        ReleaseImpact::Minor => {
            next.minor += 1;
            next.patch = 0;
        }
        ReleaseImpact::Patch => {
            next.patch += 1;
        }
        ReleaseImpact::None => return version.clone(),
    }
    next
}

/// Computes release decisions.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    rules: RuleSet,
    initial_version: Version,
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new(default_release_rules())
    }
}

impl VersionResolver {
    /// Creates a resolver with the given release rules and an initial
    /// version of `1.0.0`.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            initial_version: Version::new(1, 0, 0),
        }
    }

    /// Builds a resolver from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if a release rule is invalid.
    pub fn from_config(config: &Config) -> CoreResult<Self> {
        Ok(Self::new(release_rules_from_config(&config.release_rules)?)
            .with_initial_version(config.initial_version.clone()))
    }

    /// Sets the version of the first release.
    #[must_use]
    pub fn with_initial_version(mut self, version: Version) -> Self {
        self.initial_version = version;
        self
    }

    /// The release rules in use.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the highest impact among the commits. A breaking commit is
    /// always major.
    #[must_use]
    pub fn impact(&self, commits: &[ParsedCommit]) -> ReleaseImpact {
        commits
            .iter()
            .map(|commit| {
                if commit.breaking {
                    ReleaseImpact::Major
                } else {
                    classify(commit, &self.rules).impact()
                }
            })
            .max()
            .unwrap_or_default()
    }

    /// Decides on a release given the last released version text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::VersionParse`] if `previous` is not SemVer.
    pub fn resolve(
        &self,
        commits: &[ParsedCommit],
        previous: Option<&str>,
    ) -> CoreResult<ReleaseDecision> {
        let previous = previous
            .map(|text| {
                Version::parse(text).map_err(|source| CoreError::VersionParse {
                    tag: text.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(self.decide(commits, previous))
    }

    /// Decides on a release given the last released version.
    #[must_use]
    pub fn decide(&self, commits: &[ParsedCommit], previous: Option<Version>) -> ReleaseDecision {
        let impact = self.impact(commits);
        debug!(%impact, commits = commits.len(), "computed release impact");

        if !impact.is_release() {
            return ReleaseDecision {
                should_release: false,
                next_version: None,
                impact,
                previous_version: previous,
            };
        }

        let next = previous
            .as_ref()
            .map_or_else(|| self.initial_version.clone(), |v| bump(v, impact));

        ReleaseDecision {
            should_release: true,
            next_version: Some(next),
            impact,
            previous_version: previous,
        }
    }
}
