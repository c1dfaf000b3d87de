//! Release notes rendering.

use std::fmt::Write;

use cadence_commit::ParsedCommit;
use cadence_config::NotesConfig;
use cadence_plugin::ReleaseImpact;
use chrono::NaiveDate;
use semver::Version;

use crate::classifier::{RuleSet, TypeRule, classify};
use crate::{CoreError, CoreResult};

/// Header of the section listing every breaking commit.
pub const BREAKING_SECTION: &str = "BREAKING CHANGES";

/// The conventional-commits notes sections.
#[must_use]
pub fn default_note_rules() -> RuleSet {
    let visible = |r#type: &str, section: &str| {
        TypeRule::new(r#type, ReleaseImpact::None).with_section(section)
    };
    let hidden = |r#type: &str| TypeRule::new(r#type, ReleaseImpact::None).hidden();

    RuleSet::new([
        visible("feat", "Features"),
        visible("feature", "Features"),
        visible("fix", "Bug Fixes"),
        visible("perf", "Performance Improvements"),
        visible("revert", "Reverts"),
        hidden("docs"),
        hidden("style"),
        hidden("chore"),
        hidden("refactor"),
        hidden("test"),
        hidden("build"),
        hidden("ci"),
    ])
}

/// What the notes are for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInfo {
    /// The version being released.
    pub version: Version,
    /// Its tag.
    pub tag: String,
    /// The previous release tag, if any.
    pub previous_tag: Option<String>,
    /// Release date.
    pub date: NaiveDate,
}

impl RenderInfo {
    /// Creates render info for a first release.
    #[must_use]
    pub fn new(version: Version, tag: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            version,
            tag: tag.into(),
            previous_tag: None,
            date,
        }
    }

    /// Sets the previous release tag.
    #[must_use]
    pub fn with_previous_tag(mut self, tag: Option<String>) -> Self {
        self.previous_tag = tag;
        self
    }
}

/// Renders markdown release notes.
#[derive(Debug, Clone)]
pub struct NotesRenderer {
    rules: RuleSet,
    newest_first: bool,
    repository_url: Option<String>,
}

impl Default for NotesRenderer {
    fn default() -> Self {
        Self::new(default_note_rules())
    }
}

impl NotesRenderer {
    /// Creates a renderer with the given notes rules.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            newest_first: false,
            repository_url: None,
        }
    }

    /// Builds a renderer from configuration. A non-empty `types` list
    /// replaces the default sections.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if a type is empty.
    pub fn from_config(config: &NotesConfig) -> CoreResult<Self> {
        let rules = if config.types.is_empty() {
            default_note_rules()
        } else {
            let mut rules = RuleSet::default();
            for entry in &config.types {
                if entry.r#type.trim().is_empty() {
                    return Err(CoreError::Configuration(
                        "notes type with an empty type".to_string(),
                    ));
                }
                let mut rule = TypeRule::new(&entry.r#type, ReleaseImpact::None);
                rule.section.clone_from(&entry.section);
                rule.hidden = entry.hidden;
                rules.insert(rule);
            }
            rules
        };

        Ok(Self::new(rules)
            .with_newest_first(config.newest_first)
            .with_repository_url(config.repository_url.clone()))
    }

    /// Lists the newest commit first within each section.
    #[must_use]
    pub fn with_newest_first(mut self, newest_first: bool) -> Self {
        self.newest_first = newest_first;
        self
    }

    /// Sets the browsable repository URL used for links.
    #[must_use]
    pub fn with_repository_url(mut self, url: Option<String>) -> Self {
        self.repository_url = url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    /// The repository URL, if known.
    #[must_use]
    pub fn repository_url(&self) -> Option<&str> {
        self.repository_url.as_deref()
    }

    /// Renders notes for commits given oldest first.
    ///
    /// Breaking commits are also listed in a trailing
    /// [`BREAKING_SECTION`], whether or not their type is visible.
    #[must_use]
    pub fn render(&self, commits: &[ParsedCommit], info: &RenderInfo) -> String {
        let mut output = String::new();
        self.write_title(&mut output, info);

        for section in self.section_order() {
            let mut entries: Vec<&ParsedCommit> = commits
                .iter()
                .filter(|c| classify(c, &self.rules).section() == Some(section))
                .collect();
            if entries.is_empty() {
                continue;
            }
            if self.newest_first {
                entries.reverse();
            }

            _ = write!(output, "\n### {section}\n\n");
            for commit in entries {
                self.write_entry(&mut output, commit, true);
            }
        }

        let mut breaking: Vec<&ParsedCommit> = commits.iter().filter(|c| c.breaking).collect();
        if !breaking.is_empty() {
            if self.newest_first {
                breaking.reverse();
            }
            _ = write!(output, "\n### {BREAKING_SECTION}\n\n");
            for commit in breaking {
                self.write_entry(&mut output, commit, false);
            }
        }

        output
    }

    fn section_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = Vec::new();
        for rule in self.rules.rules() {
            if rule.hidden {
                continue;
            }
            let section = rule.section.as_deref().unwrap_or(&rule.r#type);
            if !order.contains(&section) {
                order.push(section);
            }
        }
        order
    }

    fn write_title(&self, output: &mut String, info: &RenderInfo) {
        let date = info.date.format("%Y-%m-%d");
        match (&self.repository_url, &info.previous_tag) {
            (Some(url), Some(previous)) => {
                _ = writeln!(
                    output,
                    "## [{}]({url}/compare/{previous}...{}) ({date})",
                    info.version, info.tag
                );
            }
            _ => {
                _ = writeln!(output, "## {} ({date})", info.version);
            }
        }
    }

    fn write_entry(&self, output: &mut String, commit: &ParsedCommit, mark_breaking: bool) {
        output.push_str("* ");
        if let Some(scope) = &commit.scope {
            _ = write!(output, "**{scope}:** ");
        }
        if mark_breaking && commit.breaking {
            output.push_str("**BREAKING** ");
        }
        output.push_str(&commit.description);

        let short = commit.short_hash();
        if let Some(url) = &self.repository_url {
            _ = writeln!(output, " ([{short}]({url}/commit/{}))", commit.hash);
        } else {
            _ = writeln!(output, " ({short})");
        }
    }
}

/// Returns the `### ` section headers of rendered notes, in order.
#[must_use]
pub fn section_headers(notes: &str) -> Vec<String> {
    notes
        .lines()
        .filter_map(|line| line.strip_prefix("### "))
        .map(|header| header.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_config::NoteTypeConfig;

    fn commit(hash: &str, r#type: &str, description: &str) -> ParsedCommit {
        ParsedCommit::builder(hash, r#type)
            .description(description)
            .build()
    }

    fn info() -> RenderInfo {
        RenderInfo::new(
            Version::new(1, 3, 0),
            "v1.3.0",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
    }

    fn history() -> Vec<ParsedCommit> {
        vec![
            commit("1111111aaaa", "fix", "handle empty input"),
            ParsedCommit::builder("2222222bbbb", "feat")
                .scope("api")
                .description("add endpoint")
                .build(),
            commit("3333333cccc", "chore", "bump deps"),
            commit("4444444dddd", "fix", "close file handles"),
            ParsedCommit::builder("5555555eeee", "")
                .description("Merge branch 'x'")
                .build(),
        ]
    }

    #[test]
    fn test_render_default_sections() {
        let notes = NotesRenderer::default().render(&history(), &info());
        insta::assert_snapshot!(notes, @r"
        ## 1.3.0 (2024-05-01)

        ### Features

        * **api:** add endpoint (2222222)

        ### Bug Fixes

        * handle empty input (1111111)
        * close file handles (4444444)
        ");
    }

    #[test]
    fn test_render_newest_first() {
        let notes = NotesRenderer::default()
            .with_newest_first(true)
            .render(&history(), &info());
        let fixes: Vec<_> = notes
            .lines()
            .filter(|l| l.contains("(1111111)") || l.contains("(4444444)"))
            .collect();
        assert_eq!(
            fixes,
            vec!["* close file handles (4444444)", "* handle empty input (1111111)"]
        );
    }

    #[test]
    fn test_render_with_links() {
        let renderer = NotesRenderer::default()
            .with_repository_url(Some("https://github.com/owner/repo/".to_string()));
        let info = info().with_previous_tag(Some("v1.2.3".to_string()));
        let commits = vec![
            ParsedCommit::builder("abcdef1234567890", "feat")
                .scope("cli")
                .description("drop legacy flags")
                .breaking(true)
                .build(),
        ];

        let notes = renderer.render(&commits, &info);
        insta::assert_snapshot!(notes, @r"
        ## [1.3.0](https://github.com/owner/repo/compare/v1.2.3...v1.3.0) (2024-05-01)

        ### Features

        * **cli:** **BREAKING** drop legacy flags ([abcdef1](https://github.com/owner/repo/commit/abcdef1234567890))

        ### BREAKING CHANGES

        * **cli:** drop legacy flags ([abcdef1](https://github.com/owner/repo/commit/abcdef1234567890))
        ");
    }

    #[test]
    fn test_first_release_title_has_no_compare_link() {
        let renderer = NotesRenderer::default()
            .with_repository_url(Some("https://github.com/owner/repo".to_string()));
        let notes = renderer.render(&[], &info());
        assert_eq!(notes, "## 1.3.0 (2024-05-01)\n");
    }

    #[test]
    fn test_all_hidden_renders_title_only() {
        let commits = vec![
            commit("1111111", "chore", "tidy"),
            commit("2222222", "docs", "typo"),
            commit("3333333", "unknown", "something"),
        ];
        let notes = NotesRenderer::default().render(&commits, &info());
        assert_eq!(notes, "## 1.3.0 (2024-05-01)\n");
        assert!(section_headers(&notes).is_empty());
    }

    #[test]
    fn test_breaking_without_scope() {
        let commits = vec![
            ParsedCommit::builder("9999999", "fix")
                .description("change defaults")
                .breaking(true)
                .build(),
        ];
        let notes = NotesRenderer::default().render(&commits, &info());
        assert!(notes.contains("* **BREAKING** change defaults (9999999)\n"));
        assert_eq!(section_headers(&notes), vec!["Bug Fixes", BREAKING_SECTION]);
    }

    #[test]
    fn test_hidden_breaking_commit_is_listed() {
        let info = RenderInfo::new(
            Version::new(2, 0, 0),
            "v2.0.0",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        let commits = vec![
            ParsedCommit::builder("7777777", "chore")
                .description("drop python 3.7")
                .breaking(true)
                .build(),
            ParsedCommit::builder("8888888", "wip")
                .scope("io")
                .description("remove sync reader")
                .breaking(true)
                .build(),
            commit("9999999", "chore", "tidy"),
        ];

        let notes = NotesRenderer::default().render(&commits, &info);
        insta::assert_snapshot!(notes, @r"
        ## 2.0.0 (2024-05-01)

        ### BREAKING CHANGES

        * drop python 3.7 (7777777)
        * **io:** remove sync reader (8888888)
        ");
    }

    #[test]
    fn test_feature_alias_shares_section() {
        let commits = vec![
            commit("1111111", "feature", "one"),
            commit("2222222", "feat", "two"),
        ];
        let notes = NotesRenderer::default().render(&commits, &info());
        assert_eq!(section_headers(&notes), vec!["Features"]);
    }

    #[test]
    fn test_section_headers_round_trip() {
        let commits = vec![
            commit("1111111", "perf", "faster"),
            commit("2222222", "revert", "undo"),
            commit("3333333", "fix", "bug"),
            commit("4444444", "style", "fmt"),
        ];
        let notes = NotesRenderer::default().render(&commits, &info());
        assert_eq!(
            section_headers(&notes),
            vec!["Bug Fixes", "Performance Improvements", "Reverts"]
        );
    }

    #[test]
    fn test_from_config_replaces_defaults() {
        let config = NotesConfig {
            newest_first: false,
            repository_url: None,
            types: vec![
                NoteTypeConfig {
                    r#type: "fix".to_string(),
                    section: Some("Fixes".to_string()),
                    hidden: false,
                },
                NoteTypeConfig {
                    r#type: "feat".to_string(),
                    section: Some("New".to_string()),
                    hidden: false,
                },
                NoteTypeConfig {
                    r#type: "depr".to_string(),
                    section: Some("Fixes".to_string()),
                    hidden: false,
                },
            ],
        };
        let renderer = NotesRenderer::from_config(&config).unwrap();
        let commits = vec![
            commit("1111111", "feat", "a"),
            commit("2222222", "depr", "b"),
            commit("3333333", "perf", "c"),
        ];

        let notes = renderer.render(&commits, &info());
        assert_eq!(section_headers(&notes), vec!["Fixes", "New"]);
        assert!(!notes.contains("(3333333)"));
    }

    #[test]
    fn test_from_config_empty_type() {
        let config = NotesConfig {
            types: vec![NoteTypeConfig {
                r#type: " ".to_string(),
                section: None,
                hidden: false,
            }],
            ..NotesConfig::default()
        };
        assert!(NotesRenderer::from_config(&config).is_err());
    }
}
