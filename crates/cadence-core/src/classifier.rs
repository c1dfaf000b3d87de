//! Commit classification.
//!
//! Maps a commit's type token to a [`TypeRule`]. Two rule sets exist: release
//! rules drive the version resolver and notes rules drive the renderer. They
//! may disagree about the same type.

use cadence_commit::ParsedCommit;
use cadence_plugin::ReleaseImpact;

/// What a commit type means for a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    /// Commit type token, matched exactly.
    pub r#type: String,

    /// Release impact of the type.
    pub impact: ReleaseImpact,

    /// Notes section title.
    pub section: Option<String>,

    /// Leave commits of this type out of the notes.
    pub hidden: bool,
}

impl TypeRule {
    /// Creates a visible rule without a section.
    #[must_use]
    pub fn new(r#type: impl Into<String>, impact: ReleaseImpact) -> Self {
        Self {
            r#type: r#type.into(),
            impact,
            section: None,
            hidden: false,
        }
    }

    /// Sets the notes section.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Hides the type from the notes.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Ordered set of rules with at most one rule per type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<TypeRule>,
}

impl RuleSet {
    /// Builds a set from rules. A later rule for the same type replaces an
    /// earlier one in place.
    #[must_use]
    pub fn new(rules: impl IntoIterator<Item = TypeRule>) -> Self {
        let mut set = Self::default();
        for rule in rules {
            set.insert(rule);
        }
        set
    }

    /// Adds a rule, replacing any rule for the same type in place.
    pub fn insert(&mut self, rule: TypeRule) {
        match self.rules.iter_mut().find(|r| r.r#type == rule.r#type) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Overlays `other` on this set.
    #[must_use]
    pub fn overlay(mut self, other: impl IntoIterator<Item = TypeRule>) -> Self {
        for rule in other {
            self.insert(rule);
        }
        self
    }

    /// Returns the rule for a type.
    #[must_use]
    pub fn get(&self, r#type: &str) -> Option<&TypeRule> {
        self.rules.iter().find(|r| r.r#type == r#type)
    }

    /// Rules in order.
    #[must_use]
    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }
}

/// Result of classifying a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'r> {
    /// The commit's type has a rule.
    Rule(&'r TypeRule),
    /// No rule matched: no impact, hidden.
    Unmapped,
}

impl Classification<'_> {
    /// Release impact of the classification.
    #[must_use]
    pub fn impact(&self) -> ReleaseImpact {
        match self {
            Self::Rule(rule) => rule.impact,
            Self::Unmapped => ReleaseImpact::None,
        }
    }

    /// Whether the commit is left out of the notes.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        match self {
            Self::Rule(rule) => rule.hidden,
            Self::Unmapped => true,
        }
    }

    /// Notes section title. A visible rule without a section uses its type.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::Rule(rule) if !rule.hidden => {
                Some(rule.section.as_deref().unwrap_or(&rule.r#type))
            }
            _ => None,
        }
    }
}

/// Classifies a commit by exact match on its type token.
///
/// Unparsed commits (empty type) are always unmapped.
#[must_use]
pub fn classify<'r>(commit: &ParsedCommit, rules: &'r RuleSet) -> Classification<'r> {
    if !commit.is_parsed() {
        return Classification::Unmapped;
    }
    rules
        .get(&commit.r#type)
        .map_or(Classification::Unmapped, Classification::Rule)
}
