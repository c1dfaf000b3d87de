//! Parsed commit type after processing by the commit-message parser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RawCommit;

/// A commit after message parsing.
///
/// Records are immutable once built. A commit whose message could not be
/// parsed keeps an empty `type`, which no rule ever matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommit {
    /// The commit hash (SHA).
    pub hash: String,

    /// The commit type token (feat, fix, docs, etc.).
    pub r#type: String,

    /// The optional scope.
    pub scope: Option<String>,

    /// The description (subject without type and scope prefix).
    pub description: String,

    /// Whether this is a breaking change.
    pub breaking: bool,

    /// The full, unparsed commit message.
    pub raw_message: String,

    /// The commit author name.
    pub author: String,

    /// The commit date.
    pub date: DateTime<Utc>,
}

impl ParsedCommit {
    /// Creates a new parsed commit builder.
    #[must_use]
    pub fn builder(hash: impl Into<String>, r#type: impl Into<String>) -> ParsedCommitBuilder {
        ParsedCommitBuilder::new(hash, r#type)
    }

    /// Builds the record for a commit the parser could not understand.
    #[must_use]
    pub fn unparsed(raw: &RawCommit) -> Self {
        Self::builder(&raw.hash, "")
            .description(raw.subject())
            .raw_message(&raw.message)
            .author(&raw.author)
            .date(raw.date)
            .build()
    }

    /// Returns true if the parser produced a type for this commit.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        !self.r#type.is_empty()
    }

    /// Returns the short hash (first 7 characters).
    #[must_use]
    pub fn short_hash(&self) -> &str {
        &self.hash[..7.min(self.hash.len())]
    }
}

/// Builder for [`ParsedCommit`].
#[derive(Debug)]
pub struct ParsedCommitBuilder {
    hash: String,
    r#type: String,
    scope: Option<String>,
    description: String,
    breaking: bool,
    raw_message: String,
    author: String,
    date: DateTime<Utc>,
}

impl ParsedCommitBuilder {
    fn new(hash: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            r#type: r#type.into(),
            scope: None,
            description: String::new(),
            breaking: false,
            raw_message: String::new(),
            author: String::new(),
            date: Utc::now(),
        }
    }

    /// Sets the scope. An empty scope is treated as no scope.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.scope = if scope.is_empty() { None } else { Some(scope) };
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the breaking flag.
    #[must_use]
    pub fn breaking(mut self, breaking: bool) -> Self {
        self.breaking = breaking;
        self
    }

    /// Sets the raw message.
    #[must_use]
    pub fn raw_message(mut self, message: impl Into<String>) -> Self {
        self.raw_message = message.into();
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the date.
    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Builds the [`ParsedCommit`].
    #[must_use]
    pub fn build(self) -> ParsedCommit {
        ParsedCommit {
            hash: self.hash,
            r#type: self.r#type,
            scope: self.scope,
            description: self.description,
            breaking: self.breaking,
            raw_message: self.raw_message,
            author: self.author,
            date: self.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let commit = ParsedCommit::builder("abc123", "feat")
            .scope("api")
            .description("add new endpoint")
            .breaking(false)
            .author("Test")
            .build();

        assert_eq!(commit.r#type, "feat");
        assert_eq!(commit.scope, Some("api".to_string()));
        assert_eq!(commit.description, "add new endpoint");
        assert!(!commit.breaking);
        assert!(commit.is_parsed());
    }

    #[test]
    fn test_empty_scope_is_none() {
        let commit = ParsedCommit::builder("abc123", "fix").scope("").build();
        assert!(commit.scope.is_none());
    }

    #[test]
    fn test_unparsed() {
        let raw = RawCommit::new(
            "abcdef123456",
            "Merge branch 'main'\n\ndetails",
            "Author",
            "a@b.c",
            Utc::now(),
        );
        let commit = ParsedCommit::unparsed(&raw);

        assert!(!commit.is_parsed());
        assert_eq!(commit.description, "Merge branch 'main'");
        assert_eq!(commit.raw_message, raw.message);
        assert!(!commit.breaking);
        assert_eq!(commit.short_hash(), "abcdef1");
    }
}
