//! Conventional Commits parser plugin.

use cadence_commit::{ParsedCommit, RawCommit};
use cadence_plugin::{CommitParser, Plugin};
use regex::Regex;
use std::sync::LazyLock;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>\w+)(?:\((?P<scope>[^)]*)\))?(?P<breaking>!)?: (?P<description>.+)$")
        .expect("invalid regex")
});

static BREAKING_FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^BREAKING[ -]CHANGES?:\s").expect("invalid regex")
});

/// Conventional Commits parser.
///
/// Reads `type(scope)!: description` from the subject. A `!` before the
/// colon or a `BREAKING CHANGE:` footer in the body marks the commit as
/// breaking.
pub struct ConventionalParser;

impl ConventionalParser {
    /// Creates a new conventional parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConventionalParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ConventionalParser {
    fn name(&self) -> &'static str {
        "conventional"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &'static str {
        "Parses Conventional Commits format"
    }
}

impl CommitParser for ConventionalParser {
    fn parse(&self, raw: &RawCommit) -> Option<ParsedCommit> {
        let captures = HEADER_RE.captures(raw.subject().trim_end())?;

        let commit_type = captures.name("type")?.as_str();
        let scope = captures.name("scope").map_or("", |m| m.as_str().trim());
        let description = captures.name("description")?.as_str().trim();
        let breaking = captures.name("breaking").is_some()
            || raw.body().is_some_and(|body| BREAKING_FOOTER_RE.is_match(body));

        Some(
            ParsedCommit::builder(&raw.hash, commit_type)
                .scope(scope)
                .description(description)
                .breaking(breaking)
                .raw_message(&raw.message)
                .author(&raw.author)
                .date(raw.date)
                .build(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_raw(message: &str) -> RawCommit {
        RawCommit::new("abc1234", message, "Test", "test@test.com", Utc::now())
    }

    #[test]
    fn test_simple_commit() {
        let parser = ConventionalParser::new();
        let parsed = parser.parse(&make_raw("feat: add new feature")).unwrap();

        assert_eq!(parsed.r#type, "feat");
        assert_eq!(parsed.scope, None);
        assert_eq!(parsed.description, "add new feature");
        assert!(!parsed.breaking);
        assert!(parsed.is_parsed());
    }

    #[test]
    fn test_with_scope() {
        let parser = ConventionalParser::new();
        let parsed = parser
            .parse(&make_raw("fix(parser): handle edge case"))
            .unwrap();

        assert_eq!(parsed.r#type, "fix");
        assert_eq!(parsed.scope.as_deref(), Some("parser"));
        assert_eq!(parsed.description, "handle edge case");
    }

    #[test]
    fn test_empty_scope_is_none() {
        let parser = ConventionalParser::new();
        let parsed = parser.parse(&make_raw("fix(): tidy")).unwrap();
        assert_eq!(parsed.scope, None);
    }

    #[test]
    fn test_breaking_bang() {
        let parser = ConventionalParser::new();
        let parsed = parser
            .parse(&make_raw("feat(api)!: redesign endpoints"))
            .unwrap();

        assert_eq!(parsed.r#type, "feat");
        assert!(parsed.breaking);
    }

    #[test]
    fn test_breaking_without_scope() {
        let parser = ConventionalParser::new();
        let parsed = parser.parse(&make_raw("feat!: breaking feature")).unwrap();

        assert_eq!(parsed.r#type, "feat");
        assert!(parsed.breaking);
        assert_eq!(parsed.description, "breaking feature");
    }

    #[test]
    fn test_breaking_footer() {
        let parser = ConventionalParser::new();
        let raw = make_raw(
            "fix(config): read defaults from env\n\nDetails here.\n\nBREAKING CHANGE: `path` is now required",
        );
        let parsed = parser.parse(&raw).unwrap();
        assert!(parsed.breaking);
        assert_eq!(parsed.description, "read defaults from env");
        assert_eq!(parsed.raw_message, raw.message);
    }

    #[test]
    fn test_breaking_footer_hyphenated() {
        let parser = ConventionalParser::new();
        let raw = make_raw("refactor: drop v1\n\nBREAKING-CHANGE: v1 removed");
        assert!(parser.parse(&raw).unwrap().breaking);
    }

    #[test]
    fn test_breaking_mention_in_prose_is_ignored() {
        let parser = ConventionalParser::new();
        let raw = make_raw("docs: explain policy\n\nWe avoid any BREAKING CHANGE: in patches.");
        assert!(!parser.parse(&raw).unwrap().breaking);
    }

    #[test]
    fn test_invalid_commit() {
        let parser = ConventionalParser::new();
        assert!(parser.parse(&make_raw("random commit message")).is_none());
        assert!(parser.parse(&make_raw("Merge branch 'main'")).is_none());
    }

    #[test]
    fn test_plugin_identity() {
        let parser = ConventionalParser::default();
        assert_eq!(parser.name(), "conventional");
        assert_eq!(parser.version(), env!("CARGO_PKG_VERSION"));
        assert!(!parser.description().is_empty());
    }

    #[test]
    fn test_can_parse() {
        let parser = ConventionalParser::new();
        assert!(parser.can_parse(&make_raw("feat: something")));
        assert!(!parser.can_parse(&make_raw("invalid")));
    }

    #[test]
    fn test_preserves_metadata() {
        let parser = ConventionalParser::new();
        let raw = RawCommit::new(
            "abc123def",
            "feat: test",
            "John Doe",
            "john@test.com",
            Utc::now(),
        );
        let parsed = parser.parse(&raw).unwrap();
        assert_eq!(parsed.author, "John Doe");
        assert_eq!(parsed.hash, "abc123def");
        assert_eq!(parsed.date, raw.date);
    }

    #[test]
    fn test_various_commit_types() {
        let parser = ConventionalParser::new();

        for commit_type in [
            "docs", "style", "refactor", "perf", "test", "ci", "chore", "revert",
        ] {
            let raw = make_raw(&format!("{commit_type}: test message"));
            let parsed = parser.parse(&raw).unwrap();
            assert_eq!(parsed.r#type, commit_type);
        }
    }

    #[test]
    fn test_malformed_headers() {
        let parser = ConventionalParser::new();
        assert!(parser.parse(&make_raw("feat add feature")).is_none());
        assert!(parser.parse(&make_raw("feat:add feature")).is_none());
        assert!(parser.parse(&make_raw("")).is_none());
    }

    #[test]
    fn test_parse_all_keeps_unparsed() {
        let parser = ConventionalParser::new();
        let commits = parser.parse_all(&[make_raw("fix: a"), make_raw("wip")]);
        assert_eq!(commits.len(), 2);
        assert!(commits[0].is_parsed());
        assert!(!commits[1].is_parsed());
    }
}
